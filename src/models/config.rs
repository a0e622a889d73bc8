use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::vocabulary::TagVocabulary;

/// Configuration options specific to the investor forms service.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface the HTTP server binds to.
    pub address: String,
    pub port: u16,
    /// Base URL of the investor API; `/api/...` paths are appended to it.
    pub api_base_url: String,
    /// Full URL of the file upload endpoint.
    pub upload_url: String,
    /// Page the browser is sent to after a successful submit. The investor
    /// listing lives outside this service; the default opens a new form.
    pub listing_url: String,
    /// Glob of Tera templates.
    pub templates_dir: String,
    /// Key used to sign flash message cookies. A random key is generated when
    /// it is missing or shorter than 64 bytes.
    pub secret_key: Option<String>,
    pub draft_ttl_minutes: i64,
    pub request_timeout_secs: u64,
    pub vocabulary: TagVocabulary,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            api_base_url: "http://localhost:5000".to_string(),
            upload_url: "http://localhost:5000/api/fileUpload".to_string(),
            listing_url: "/".to_string(),
            templates_dir: "templates/**/*".to_string(),
            secret_key: None,
            draft_ttl_minutes: 120,
            request_timeout_secs: 30,
            vocabulary: TagVocabulary::default(),
        }
    }
}

impl ServerConfig {
    /// Loads `config/default.yaml`, then `config/{APP_ENV}.yaml`, then
    /// `APP_*` environment variables (`APP_VOCABULARY__SECTORS` for nested keys).
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        Self::load_from(Path::new("config"), &environment)
    }

    pub fn load_from(dir: &Path, environment: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(environment)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("vocabulary.business_models")
                    .with_list_parse_key("vocabulary.sectors")
                    .with_list_parse_key("vocabulary.investor_types")
                    .with_list_parse_key("vocabulary.geographies")
                    .with_list_parse_key("vocabulary.investment_stages")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.address.clone(), self.port)
    }

    pub fn draft_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.draft_ttl_minutes.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let config = ServerConfig::load_from(dir.path(), "test").unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.vocabulary, TagVocabulary::default());
    }

    #[test]
    fn environment_file_overrides_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.yaml"),
            "port: 9000\napi_base_url: https://api.example.com\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.yaml"),
            "port: 9100\nvocabulary:\n  sectors: [Fintech, Climate]\n",
        )
        .unwrap();

        let config = ServerConfig::load_from(dir.path(), "staging").unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.vocabulary.sectors, vec!["Fintech", "Climate"]);
        assert_eq!(
            config.vocabulary.business_models,
            TagVocabulary::default().business_models
        );
    }

    #[test]
    fn ttl_is_at_least_one_minute() {
        let config = ServerConfig {
            draft_ttl_minutes: 0,
            ..ServerConfig::default()
        };

        assert_eq!(config.draft_ttl(), chrono::Duration::minutes(1));
    }
}
