use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::settings::ConfigError;

const CONFIG_PATH_ENV: &str = "INGENIERIN_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "config.yml";
const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "connection_string",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvKind {
    Text,
    Integer,
    List,
}

/// Maps an environment variable onto its location in the YAML tree.
struct EnvBinding {
    name: &'static str,
    path: &'static [&'static str],
    kind: EnvKind,
}

const ENV_BINDINGS: &[EnvBinding] = &[
    EnvBinding { name: "APP_NAME", path: &["app", "name"], kind: EnvKind::Text },
    EnvBinding { name: "ENVIRONMENT", path: &["app", "environment"], kind: EnvKind::Text },
    EnvBinding { name: "HOST", path: &["server", "host"], kind: EnvKind::Text },
    EnvBinding { name: "PORT", path: &["server", "port"], kind: EnvKind::Integer },
    EnvBinding {
        name: "CORS_ORIGINS",
        path: &["server", "cors_allowed_origins"],
        kind: EnvKind::List,
    },
    EnvBinding { name: "AZURE_API_KEY", path: &["llm", "api_key"], kind: EnvKind::Text },
    EnvBinding { name: "AZURE_ENDPOINT", path: &["llm", "endpoint"], kind: EnvKind::Text },
    EnvBinding { name: "AZURE_API_VERSION", path: &["llm", "api_version"], kind: EnvKind::Text },
    EnvBinding {
        name: "AZURE_LLM_DEPLOYMENT",
        path: &["llm", "deployment"],
        kind: EnvKind::Text,
    },
    EnvBinding {
        name: "REQUEST_TIMEOUT_SECS",
        path: &["llm", "request_timeout_secs"],
        kind: EnvKind::Integer,
    },
    EnvBinding {
        name: "AZURE_COGNITIVE_SEARCH_NAME",
        path: &["retrieval", "service_name"],
        kind: EnvKind::Text,
    },
    EnvBinding {
        name: "AZURE_COGNITIVE_SEARCH_API_KEY",
        path: &["retrieval", "api_key"],
        kind: EnvKind::Text,
    },
    EnvBinding {
        name: "AZURE_COGNITIVE_SEARCH_INDEX_NAME",
        path: &["retrieval", "index_name"],
        kind: EnvKind::Text,
    },
    EnvBinding {
        name: "AZURE_COGNITIVE_SEARCH_API_VERSION",
        path: &["retrieval", "api_version"],
        kind: EnvKind::Text,
    },
    EnvBinding {
        name: "WIKIPEDIA_LANGUAGE",
        path: &["reference", "language"],
        kind: EnvKind::Text,
    },
    EnvBinding { name: "LOG_DIR", path: &["logging", "dir"], kind: EnvKind::Text },
    EnvBinding { name: "LOG_LEVEL", path: &["logging", "level"], kind: EnvKind::Text },
];

/// Name of the environment variable bound to a YAML path, used when
/// reporting missing settings.
pub fn env_name_for(path: &[&str]) -> Option<&'static str> {
    ENV_BINDINGS
        .iter()
        .find(|binding| binding.path == path)
        .map(|binding| binding.name)
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        let config_path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self { config_path }
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Reads the YAML file. A missing file is an empty config; an unreadable
    /// or malformed one is an error.
    pub fn load_config(&self) -> Result<Value, ConfigError> {
        load_yaml_file(&self.config_path)
    }

    /// YAML file overlaid with the process environment.
    pub fn resolve_from_env(&self) -> Result<Value, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        self.resolve(&vars)
    }

    pub fn resolve(&self, vars: &HashMap<String, String>) -> Result<Value, ConfigError> {
        let mut config = self.load_config()?;
        apply_env_overrides(&mut config, vars)?;
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let file_error = |reason: String| ConfigError::File {
        path: path.display().to_string(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match serde_yaml::from_str::<Value>(&contents).map_err(|e| file_error(e.to_string()))? {
        value @ Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(file_error("top level must be a mapping".to_string())),
    }
}

fn apply_env_overrides(
    config: &mut Value,
    vars: &HashMap<String, String>,
) -> Result<(), ConfigError> {
    for binding in ENV_BINDINGS {
        let Some(raw) = vars.get(binding.name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let value = match binding.kind {
            EnvKind::Text => Value::String(raw.to_string()),
            EnvKind::Integer => {
                let number = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: binding.name.to_string(),
                    reason: format!("expected a non-negative integer, got '{}'", raw),
                })?;
                Value::from(number)
            }
            EnvKind::List => Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| Value::String(item.to_string()))
                    .collect(),
            ),
        };

        ensure_object_path(config, binding.path, value);
    }
    Ok(())
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
