//! Client configuration parsed from environment variables.

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ADMIN_PASSPHRASE: &str = "admin123";
pub const DEFAULT_DOC_TYPE: &str = "Insurance";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL `{0}` (expected http:// or https://)")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Compared by the admin console's unlock gate. Not an access control.
    pub admin_passphrase: String,
    pub chat_context: String,
    pub doc_type: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            admin_passphrase: DEFAULT_ADMIN_PASSPHRASE.to_owned(),
            chat_context: String::new(),
            doc_type: DEFAULT_DOC_TYPE.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `PARAKH_API_BASE_URL`: default `http://localhost:8000`
    /// - `PARAKH_ADMIN_PASSPHRASE`: default `admin123`
    /// - `PARAKH_CHAT_CONTEXT`: default empty
    /// - `PARAKH_DOC_TYPE`: default `Insurance`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a non-HTTP base URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Self {
            base_url: env_or("PARAKH_API_BASE_URL", defaults.base_url),
            admin_passphrase: env_or("PARAKH_ADMIN_PASSPHRASE", defaults.admin_passphrase),
            chat_context: env_or("PARAKH_CHAT_CONTEXT", defaults.chat_context),
            doc_type: env_or("PARAKH_DOC_TYPE", defaults.doc_type),
        }
        .validated()
    }

    /// Normalize the base URL and check its scheme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a non-HTTP base URL.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(&self.base_url)?;
        Ok(self)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(trimmed.to_owned()),
        _ => Err(ConfigError::InvalidBaseUrl(raw.to_owned())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
