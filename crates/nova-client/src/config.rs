//! SenseNova configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use nova_core::{Error, Result};

/// Official SenseNova LLM endpoint
pub const DEFAULT_API_BASE: &str = "https://api.sensenova.cn/v1/llm";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the SenseNova client
///
/// The secret access key is never serialized or printed.
#[derive(Clone, Serialize, Deserialize)]
pub struct SenseNovaConfig {
    pub access_key_id: String,
    #[serde(skip_serializing, default)]
    pub secret_access_key: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl SenseNovaConfig {
    /// Create configuration with explicit credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }

    /// Use explicit credentials where given, falling back to the environment
    pub fn resolve(access_key_id: Option<String>, secret_access_key: Option<String>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let access_key_id = access_key_id
            .or_else(|| env::var("SENSENOVA_ACCESS_KEY_ID").ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "SENSENOVA_ACCESS_KEY_ID environment variable not found".to_string(),
                )
            })?;

        let secret_access_key = secret_access_key
            .or_else(|| env::var("SENSENOVA_SECRET_ACCESS_KEY").ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "SENSENOVA_SECRET_ACCESS_KEY environment variable not found".to_string(),
                )
            })?;

        let mut config = Self::new(access_key_id, secret_access_key);
        if let Some(api_base) = env::var("SENSENOVA_API_BASE").ok().filter(|v| !v.is_empty()) {
            config.api_base = api_base;
        }

        Ok(config)
    }

    /// Point the client at a different endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

impl fmt::Debug for SenseNovaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SenseNovaConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
