use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DB_SYSTEM_KEY_ENV: &str = "REDIS_TRACING_DB_SYSTEM_KEY";
const DB_SYSTEM_ENV: &str = "REDIS_TRACING_DB_SYSTEM";
const PIPELINE_ERRORS_ENV: &str = "REDIS_TRACING_PIPELINE_ERRORS";

/// Which commands of a pipeline are inspected for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrors {
    /// Only the first command; its error is tagged as `db.error`
    #[default]
    FirstCommand,
    /// Every command; the error at index `i` is tagged as `db.error{i}`
    EachCommand,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown pipeline error policy {0:?}, expected \"first\" or \"each\"")]
pub struct ParsePipelineErrorsError(String);

impl FromStr for PipelineErrors {
    type Err = ParsePipelineErrorsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first_command" => Ok(Self::FirstCommand),
            "each" | "each_command" => Ok(Self::EachCommand),
            other => Err(ParsePipelineErrorsError(other.to_string())),
        }
    }
}

/// Settings of the tracing hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Tag key naming the store kind. Older conventions use `db.type`.
    pub db_system_key: String,
    pub db_system: String,
    pub pipeline_errors: PipelineErrors,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            db_system_key: "db.system".to_string(),
            db_system: "redis".to_string(),
            pipeline_errors: PipelineErrors::default(),
        }
    }
}

impl HookConfig {
    /// Read overrides from `REDIS_TRACING_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = lookup(DB_SYSTEM_KEY_ENV).filter(|v| !v.is_empty()) {
            config.db_system_key = key;
        }
        if let Some(system) = lookup(DB_SYSTEM_ENV).filter(|v| !v.is_empty()) {
            config.db_system = system;
        }
        if let Some(policy) = lookup(PIPELINE_ERRORS_ENV) {
            match policy.parse::<PipelineErrors>() {
                Ok(policy) => config.pipeline_errors = policy,
                Err(e) => tracing::warn!("ignoring {PIPELINE_ERRORS_ENV}: {e}"),
            }
        }

        config
    }
}
