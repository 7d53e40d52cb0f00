use crate::engine::Dialect;
use log::info;
use serde::{Deserialize, Serialize};
use std::env;

pub const API_BASE_URL_VAR: &str = "ASKDB_API_BASE_URL";
pub const AUTH_HEADER_PREFIX_VAR: &str = "ASKDB_AUTH_HEADER_PREFIX";

/// Everything the client needs to know about where and how to talk to the API.
///
/// This is passed explicitly to whatever needs it, there is no global configuration.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Goes in front of the token in the Authorization header. Empty means the bare token.
    pub auth_header_prefix: String,
    pub request_timeout_secs: u64,
    /// How many executed queries a playground remembers.
    pub history_limit: usize,
    /// Used when rendering queries for connections of an unknown type.
    pub dialect: Dialect,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            api_base_url: "http://localhost:3000/api".to_owned(),
            auth_header_prefix: "Bearer".to_owned(),
            request_timeout_secs: 30,
            history_limit: 100,
            dialect: Dialect::Generic,
        }
    }
}

impl Config {
    /// Environment variables win over whatever was stored.
    pub fn with_env_overrides(mut self) -> Config {
        if let Ok(url) = env::var(API_BASE_URL_VAR) {
            info!("Using API base url from {API_BASE_URL_VAR}");
            self.api_base_url = url;
        }

        if let Ok(prefix) = env::var(AUTH_HEADER_PREFIX_VAR) {
            self.auth_header_prefix = prefix;
        }

        self
    }

    /// Joins a path onto the base url, regardless of how many slashes either of them has.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn authorization_header(&self, token: &str) -> String {
        let prefix = self.auth_header_prefix.trim();

        if prefix.is_empty() {
            token.to_string()
        } else {
            format!("{prefix} {token}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let config = Config {
            api_base_url: "https://example.com/api/".to_string(),
            ..Default::default()
        };

        assert_eq!(
            config.endpoint("/gui-builder/execute"),
            "https://example.com/api/gui-builder/execute"
        );
        assert_eq!(config.endpoint("playgrounds"), "https://example.com/api/playgrounds");
    }

    #[test]
    fn authorization_header() {
        let mut config = Config::default();
        assert_eq!(config.authorization_header("abc"), "Bearer abc");

        config.auth_header_prefix = String::new();
        assert_eq!(config.authorization_header("abc"), "abc");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url": "http://api", "dialect": "postgres"}"#)
                .unwrap();

        assert_eq!(config.api_base_url, "http://api");
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.history_limit, 100);
    }
}
