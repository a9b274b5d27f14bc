//! Google Gemini provider

pub mod chat;
pub mod client;
pub mod types;

pub use chat::GeminiChatModel;
pub use client::GeminiClient;
