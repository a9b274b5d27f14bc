//! OpenAI chat completions provider

pub mod chat;
pub mod client;
pub mod types;

pub use chat::OpenAiChatModel;
pub use client::OpenAiClient;
