//! Runtime configuration.
//!
//! Settings are read once at startup into an explicit [`RadarConfig`] and
//! handed to components by constructor. Environment variable names follow the
//! deployment `.env` convention (`API_PORT`, `GOOGLE_API_KEY`, ...).

use crate::error::{ConfigError, RadarResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ============================================================================
// SECTIONS
// ============================================================================

/// Application identity and runtime mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub app_name: String,
    pub app_version: String,
    pub environment: String,
    pub debug: bool,
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "mairie-radar".to_string(),
            app_version: "0.1.0".to_string(),
            environment: "development".to_string(),
            debug: true,
            log_level: "INFO".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

/// Hosted LLM credentials and generation defaults.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub google_api_key: Option<String>,
    pub google_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_model: "gemini-2.0-flash-exp".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4-turbo-preview".to_string(),
            anthropic_api_key: None,
            anthropic_model: "claude-3-sonnet-20240229".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            requests_per_minute: 60,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_model", &self.google_model)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_model", &self.anthropic_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("requests_per_minute", &self.requests_per_minute)
            .finish()
    }
}

/// Vector store (Weaviate) connection settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub class_name: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            class_name: "BudgetDocument".to_string(),
        }
    }
}

impl fmt::Debug for VectorStoreSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorStoreSettings")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// Agent runtime timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Bounded wait on the mailbox before running periodic tasks
    pub receive_timeout_ms: u64,
    /// Pause after a failed loop iteration
    pub error_backoff_ms: u64,
    /// Upper bound on one dispatched workflow task
    pub task_timeout_ms: u64,
    pub mailbox_capacity: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 1000,
            error_backoff_ms: 1000,
            task_timeout_ms: 30_000,
            mailbox_capacity: 100,
        }
    }
}

impl AgentSettings {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

/// Feature toggles surfaced by the `/config` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub anomaly_detection: bool,
    pub real_time_collection: bool,
    pub batch_processing: bool,
    pub web_scraping: bool,
    pub pdf_processing: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            anomaly_detection: true,
            real_time_collection: false,
            batch_processing: true,
            web_scraping: true,
            pdf_processing: true,
        }
    }
}

/// Local storage directories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    pub data_dir: String,
    pub documents_dir: String,
    pub cache_dir: String,
    pub logs_dir: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            documents_dir: "./data/documents".to_string(),
            cache_dir: "./data/cache".to_string(),
            logs_dir: "./data/logs".to_string(),
        }
    }
}

// ============================================================================
// RESOLVED PROVIDER CONFIGS
// ============================================================================

/// Hosted LLM vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Google,
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Google => "google",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The provider selected from the configured API keys.
#[derive(Clone, PartialEq)]
pub struct LlmProviderConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
}

impl fmt::Debug for LlmProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Resolved vector store connection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorStoreConfig {
    pub url: String,
    pub class_name: String,
    pub api_key: Option<String>,
}

// ============================================================================
// ROOT CONFIG
// ============================================================================

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarConfig {
    pub app: AppSettings,
    pub api: ApiSettings,
    pub llm: LlmSettings,
    pub vector_store: VectorStoreSettings,
    pub agents: AgentSettings,
    pub features: FeatureFlags,
    pub paths: PathSettings,
}

impl RadarConfig {
    /// Load configuration from the process environment.
    ///
    /// Unset or unparseable variables fall back to their defaults; call
    /// [`RadarConfig::validate`] afterwards to reject out-of-range values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str, default: bool| {
            lookup(key).and_then(|v| parse_bool(&v)).unwrap_or(default)
        };

        Self {
            app: AppSettings {
                app_name: text("APP_NAME", d.app.app_name),
                app_version: text("APP_VERSION", d.app.app_version),
                environment: text("ENVIRONMENT", d.app.environment),
                debug: flag("DEBUG", d.app.debug),
                log_level: text("LOG_LEVEL", d.app.log_level),
            },
            api: ApiSettings {
                host: text("API_HOST", d.api.host),
                port: parse_or(lookup("API_PORT"), d.api.port),
                cors_origins: lookup("CORS_ORIGINS")
                    .map(|v| split_list(&v))
                    .filter(|v| !v.is_empty())
                    .unwrap_or(d.api.cors_origins),
            },
            llm: LlmSettings {
                google_api_key: optional("GOOGLE_API_KEY"),
                google_model: text("GOOGLE_MODEL", d.llm.google_model),
                openai_api_key: optional("OPENAI_API_KEY"),
                openai_model: text("OPENAI_MODEL", d.llm.openai_model),
                anthropic_api_key: optional("ANTHROPIC_API_KEY"),
                anthropic_model: text("ANTHROPIC_MODEL", d.llm.anthropic_model),
                temperature: parse_or(lookup("LLM_TEMPERATURE"), d.llm.temperature),
                max_tokens: parse_or(lookup("LLM_MAX_TOKENS"), d.llm.max_tokens),
                requests_per_minute: parse_or(
                    lookup("LLM_REQUESTS_PER_MINUTE"),
                    d.llm.requests_per_minute,
                ),
            },
            vector_store: VectorStoreSettings {
                url: optional("WEAVIATE_URL"),
                api_key: optional("WEAVIATE_API_KEY"),
                class_name: text("WEAVIATE_CLASS_NAME", d.vector_store.class_name),
            },
            agents: AgentSettings {
                receive_timeout_ms: parse_or(
                    lookup("AGENT_RECEIVE_TIMEOUT_MS"),
                    d.agents.receive_timeout_ms,
                ),
                error_backoff_ms: parse_or(
                    lookup("AGENT_ERROR_BACKOFF_MS"),
                    d.agents.error_backoff_ms,
                ),
                task_timeout_ms: parse_or(
                    lookup("AGENT_TASK_TIMEOUT_MS"),
                    d.agents.task_timeout_ms,
                ),
                mailbox_capacity: parse_or(
                    lookup("AGENT_MAILBOX_CAPACITY"),
                    d.agents.mailbox_capacity,
                ),
            },
            features: FeatureFlags {
                anomaly_detection: flag("ENABLE_ANOMALY_DETECTION", d.features.anomaly_detection),
                real_time_collection: flag(
                    "ENABLE_REAL_TIME_COLLECTION",
                    d.features.real_time_collection,
                ),
                batch_processing: flag("ENABLE_BATCH_PROCESSING", d.features.batch_processing),
                web_scraping: flag("ENABLE_WEB_SCRAPING", d.features.web_scraping),
                pdf_processing: flag("ENABLE_PDF_PROCESSING", d.features.pdf_processing),
            },
            paths: PathSettings {
                data_dir: text("DATA_DIR", d.paths.data_dir),
                documents_dir: text("DOCUMENTS_DIR", d.paths.documents_dir),
                cache_dir: text("CACHE_DIR", d.paths.cache_dir),
                logs_dir: text("LOGS_DIR", d.paths.logs_dir),
            },
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RadarResult<()> {
        if self.api.port == 0 {
            return Err(invalid("api_port", "0", "must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm_temperature",
                &self.llm.temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(invalid("llm_max_tokens", "0", "must be greater than 0"));
        }
        if self.llm.requests_per_minute == 0 {
            return Err(invalid(
                "llm_requests_per_minute",
                "0",
                "must be greater than 0",
            ));
        }
        for (field, model) in [
            ("google_model", &self.llm.google_model),
            ("openai_model", &self.llm.openai_model),
            ("anthropic_model", &self.llm.anthropic_model),
        ] {
            if model.trim().is_empty() {
                return Err(invalid(field, model, "must not be empty"));
            }
        }
        if self.agents.receive_timeout_ms == 0 {
            return Err(invalid(
                "agent_receive_timeout_ms",
                "0",
                "must be greater than 0",
            ));
        }
        if self.agents.task_timeout_ms == 0 {
            return Err(invalid("agent_task_timeout_ms", "0", "must be greater than 0"));
        }
        if self.agents.mailbox_capacity == 0 {
            return Err(invalid(
                "agent_mailbox_capacity",
                "0",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Resolve the LLM provider from the configured keys.
    ///
    /// Google takes priority over OpenAI, which takes priority over Anthropic.
    pub fn llm_provider(&self) -> RadarResult<LlmProviderConfig> {
        let llm = &self.llm;
        let (provider, api_key, model) = if let Some(key) = &llm.google_api_key {
            (LlmProvider::Google, key, &llm.google_model)
        } else if let Some(key) = &llm.openai_api_key {
            (LlmProvider::OpenAi, key, &llm.openai_model)
        } else if let Some(key) = &llm.anthropic_api_key {
            (LlmProvider::Anthropic, key, &llm.anthropic_model)
        } else {
            return Err(ConfigError::MissingRequired {
                field: "GOOGLE_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY".to_string(),
            }
            .into());
        };

        Ok(LlmProviderConfig {
            provider,
            api_key: api_key.clone(),
            model: model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            requests_per_minute: llm.requests_per_minute,
        })
    }

    /// Resolve the vector store connection; requires `WEAVIATE_URL`.
    pub fn vector_store(&self) -> RadarResult<VectorStoreConfig> {
        let url = self
            .vector_store
            .url
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired {
                field: "WEAVIATE_URL".to_string(),
            })?;
        Ok(VectorStoreConfig {
            url,
            class_name: self.vector_store.class_name.clone(),
            api_key: self.vector_store.api_key.clone(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.eq_ignore_ascii_case("production")
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> crate::RadarError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "[REDACTED]"
    } else {
        "None"
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RadarError;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> RadarConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RadarConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config, RadarConfig::default());
        assert_eq!(config.app.app_name, "mairie-radar");
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.vector_store.class_name, "BudgetDocument");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("API_PORT", "9001"),
            ("DEBUG", "False"),
            ("ENVIRONMENT", "production"),
            ("ENABLE_REAL_TIME_COLLECTION", "true"),
            ("CORS_ORIGINS", "https://radar.example, https://admin.example"),
        ]);
        assert_eq!(config.api.port, 9001);
        assert!(!config.app.debug);
        assert!(config.is_production());
        assert!(config.features.real_time_collection);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://radar.example", "https://admin.example"]
        );
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = config_from(&[("API_PORT", "not-a-port"), ("DEBUG", "maybe")]);
        assert_eq!(config.api.port, 8000);
        assert!(config.app.debug);
    }

    #[test]
    fn test_llm_provider_priority() {
        let all = config_from(&[
            ("GOOGLE_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
            ("ANTHROPIC_API_KEY", "a"),
        ]);
        let resolved = all.llm_provider().unwrap();
        assert_eq!(resolved.provider, LlmProvider::Google);
        assert_eq!(resolved.model, "gemini-2.0-flash-exp");

        let openai = config_from(&[("OPENAI_API_KEY", "o"), ("ANTHROPIC_API_KEY", "a")]);
        assert_eq!(openai.llm_provider().unwrap().provider, LlmProvider::OpenAi);

        let anthropic = config_from(&[("ANTHROPIC_API_KEY", "a")]);
        assert_eq!(
            anthropic.llm_provider().unwrap().provider,
            LlmProvider::Anthropic
        );
    }

    #[test]
    fn test_llm_provider_missing_keys() {
        let config = config_from(&[("GOOGLE_API_KEY", "  ")]);
        let err = config.llm_provider().unwrap_err();
        assert!(matches!(
            err,
            RadarError::Config(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn test_vector_store_requires_url() {
        assert!(config_from(&[]).vector_store().is_err());
        let config = config_from(&[
            ("WEAVIATE_URL", "http://localhost:8080"),
            ("WEAVIATE_API_KEY", "secret"),
        ]);
        let store = config.vector_store().unwrap();
        assert_eq!(store.url, "http://localhost:8080");
        assert_eq!(store.class_name, "BudgetDocument");
        assert_eq!(store.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RadarConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());

        let mut config = RadarConfig::default();
        config.llm.temperature = 2.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("llm_temperature"));

        let mut config = RadarConfig::default();
        config.llm.openai_model = String::new();
        assert!(config.validate().is_err());

        let mut config = RadarConfig::default();
        config.agents.task_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = config_from(&[("GOOGLE_API_KEY", "super-secret")]);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
        let provider = format!("{:?}", config.llm_provider().unwrap());
        assert!(!provider.contains("super-secret"));
    }
}
