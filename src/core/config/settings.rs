use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::service::env_name_for;
use super::validation::validate_config;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_REFERENCE_MAX_RESULTS: usize = 1;
pub const DEFAULT_REFERENCE_MAX_CHARS: usize = 2500;
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Settings that must be present before the service may start.
const REQUIRED_PATHS: &[&[&str]] = &[
    &["llm", "api_key"],
    &["llm", "endpoint"],
    &["llm", "api_version"],
    &["llm", "deployment"],
    &["retrieval", "service_name"],
    &["retrieval", "api_key"],
    &["retrieval", "index_name"],
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid setting '{key}': {reason}")]
    Invalid { key: String, reason: String },
    #[error("failed to read config file {path}: {reason}")]
    File { path: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub service_name: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    pub content_key: String,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct ReferenceSettings {
    pub language: String,
    pub max_results: usize,
    pub max_chars: usize,
}

#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub history_limit: usize,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub dir: PathBuf,
    pub level: String,
}

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub reference: ReferenceSettings,
    pub conversation: ConversationSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Builds settings from a resolved config tree (YAML overlaid with env).
    ///
    /// Every required value is checked before anything else so that a
    /// misconfigured deployment reports all missing names at once.
    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        let missing: Vec<String> = REQUIRED_PATHS
            .iter()
            .filter(|path| non_empty_str(config, path).is_none())
            .map(|path| {
                env_name_for(path)
                    .map(str::to_string)
                    .unwrap_or_else(|| path.join("."))
            })
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        validate_config(config)?;

        let required = |path: &[&str]| -> String {
            non_empty_str(config, path).unwrap_or_default().to_string()
        };

        let port = get_u64(config, &["server", "port"]).unwrap_or(DEFAULT_PORT as u64);

        Ok(Self {
            app: AppSettings {
                name: string_or(config, &["app", "name"], "Azure AI Chatbot"),
                environment: string_or(config, &["app", "environment"], "development"),
            },
            server: ServerSettings {
                host: string_or(config, &["server", "host"], "0.0.0.0"),
                port: u16::try_from(port).unwrap_or(DEFAULT_PORT),
                cors_allowed_origins: string_list(config, &["server", "cors_allowed_origins"])
                    .unwrap_or_else(default_cors_origins),
            },
            llm: LlmSettings {
                api_key: required(&["llm", "api_key"]),
                endpoint: required(&["llm", "endpoint"]),
                api_version: required(&["llm", "api_version"]),
                deployment: required(&["llm", "deployment"]),
                temperature: get_f64(config, &["llm", "temperature"]).unwrap_or(0.7),
                max_tokens: get_u64(config, &["llm", "max_tokens"]).unwrap_or(1000) as u32,
                request_timeout: Duration::from_secs(
                    get_u64(config, &["llm", "request_timeout_secs"]).unwrap_or(60),
                ),
            },
            retrieval: RetrievalSettings {
                service_name: required(&["retrieval", "service_name"]),
                api_key: required(&["retrieval", "api_key"]),
                index_name: required(&["retrieval", "index_name"]),
                api_version: string_or(config, &["retrieval", "api_version"], "2023-11-01"),
                content_key: string_or(config, &["retrieval", "content_key"], "content"),
                top_k: get_u64(config, &["retrieval", "top_k"])
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_TOP_K),
            },
            reference: ReferenceSettings {
                language: string_or(config, &["reference", "language"], "en"),
                max_results: get_u64(config, &["reference", "max_results"])
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_REFERENCE_MAX_RESULTS),
                max_chars: get_u64(config, &["reference", "max_chars"])
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_REFERENCE_MAX_CHARS),
            },
            conversation: ConversationSettings {
                history_limit: get_u64(config, &["conversation", "history_limit"])
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_HISTORY_LIMIT),
            },
            logging: LoggingSettings {
                dir: PathBuf::from(string_or(config, &["logging", "dir"], "logs")),
                level: string_or(config, &["logging", "level"], "info"),
            },
        })
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

fn lookup<'a>(config: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(config, |node, key| node.get(*key))
}

fn non_empty_str<'a>(config: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(config, path)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn string_or(config: &Value, path: &[&str], default: &str) -> String {
    non_empty_str(config, path).unwrap_or(default).to_string()
}

fn get_u64(config: &Value, path: &[&str]) -> Option<u64> {
    lookup(config, path).and_then(|v| v.as_u64())
}

fn get_f64(config: &Value, path: &[&str]) -> Option<f64> {
    lookup(config, path).and_then(|v| v.as_f64())
}

fn string_list(config: &Value, path: &[&str]) -> Option<Vec<String>> {
    let items: Vec<String> = lookup(config, path)?
        .as_array()?
        .iter()
        .filter_map(|item| item.as_str())
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
