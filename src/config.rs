//! Configuration module for the upload service API.
//!
//! Loads configuration from environment variables, following the pattern
//! `UPLOAD_<SECTION>_<KEY>`, with sensible defaults for local development.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub upload_policy: UploadPolicyConfig,
    pub scratch: ScratchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Owner-id and service-credential header names are fixed by the
    /// protocol (spec §4.1), but the expected service credential value is
    /// configuration.
    pub service_credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_base_url: String,
    pub uploads_base_url: String,
    pub owner: String,
    pub token: String,
    pub default_repository: String,
    pub retry_base_delay_ms: u64,
    pub retry_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadPolicyConfig {
    pub default_chunk_size: u64,
    pub min_chunk_size: u64,
    pub max_chunk_size: u64,
    pub max_upload_size: u64,
    pub release_assets_enabled: bool,
    pub release_max_bytes: u64,
    pub git_lfs_enabled: bool,
    pub lfs_threshold_bytes: u64,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchConfig {
    pub base_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            remote: RemoteConfig::default(),
            upload_policy: UploadPolicyConfig::default(),
            scratch: ScratchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 60,
            service_credential: "dev-secret".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "uploads".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            uploads_base_url: "https://uploads.github.com".to_string(),
            owner: "example-org".to_string(),
            token: String::new(),
            default_repository: "artifact-store".to_string(),
            retry_base_delay_ms: 1000,
            retry_max_attempts: 5,
        }
    }
}

impl Default for UploadPolicyConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: 5 * 1024 * 1024,
            min_chunk_size: upload_core::domain::session::MIN_CHUNK_SIZE,
            max_chunk_size: upload_core::domain::session::MAX_CHUNK_SIZE,
            max_upload_size: 5 * 1024 * 1024 * 1024,
            release_assets_enabled: false,
            release_max_bytes: 2 * 1024 * 1024 * 1024,
            git_lfs_enabled: false,
            lfs_threshold_bytes: 100 * 1024 * 1024,
            session_ttl_hours: 24,
        }
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            base_dir: "/tmp/upload-service/scratch".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables over the defaults.
    ///
    /// # Examples
    /// - `UPLOAD_SERVER_PORT=9090`
    /// - `UPLOAD_DATABASE_URI=mongodb://mongo:27017`
    /// - `UPLOAD_REMOTE_TOKEN=ghp_...`
    /// - `UPLOAD_POLICY_RELEASE_ASSETS_ENABLED=true`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("UPLOAD_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("UPLOAD_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(timeout) = env::var("UPLOAD_SERVER_REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                config.server.request_timeout_secs = timeout;
            }
        }
        if let Ok(cred) = env::var("UPLOAD_SERVER_SERVICE_CREDENTIAL") {
            config.server.service_credential = cred;
        }

        if let Ok(uri) = env::var("UPLOAD_DATABASE_URI") {
            config.database.uri = uri;
        }
        if let Ok(db) = env::var("UPLOAD_DATABASE_NAME") {
            config.database.database = db;
        }

        if let Ok(v) = env::var("UPLOAD_REMOTE_API_BASE_URL") {
            config.remote.api_base_url = v;
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_UPLOADS_BASE_URL") {
            config.remote.uploads_base_url = v;
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_OWNER") {
            config.remote.owner = v;
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_TOKEN") {
            config.remote.token = v;
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_DEFAULT_REPOSITORY") {
            config.remote.default_repository = v;
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_RETRY_BASE_DELAY_MS") {
            if let Ok(v) = v.parse() {
                config.remote.retry_base_delay_ms = v;
            }
        }
        if let Ok(v) = env::var("UPLOAD_REMOTE_RETRY_MAX_ATTEMPTS") {
            if let Ok(v) = v.parse() {
                config.remote.retry_max_attempts = v;
            }
        }

        if let Ok(v) = env::var("UPLOAD_POLICY_DEFAULT_CHUNK_SIZE") {
            if let Ok(v) = v.parse() {
                config.upload_policy.default_chunk_size = v;
            }
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_MAX_UPLOAD_SIZE") {
            if let Ok(v) = v.parse() {
                config.upload_policy.max_upload_size = v;
            }
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_RELEASE_ASSETS_ENABLED") {
            config.upload_policy.release_assets_enabled = v.to_lowercase() == "true" || v == "1";
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_RELEASE_MAX_BYTES") {
            if let Ok(v) = v.parse() {
                config.upload_policy.release_max_bytes = v;
            }
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_GIT_LFS_ENABLED") {
            config.upload_policy.git_lfs_enabled = v.to_lowercase() == "true" || v == "1";
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_LFS_THRESHOLD_BYTES") {
            if let Ok(v) = v.parse() {
                config.upload_policy.lfs_threshold_bytes = v;
            }
        }
        if let Ok(v) = env::var("UPLOAD_POLICY_SESSION_TTL_HOURS") {
            if let Ok(v) = v.parse() {
                config.upload_policy.session_ttl_hours = v;
            }
        }

        if let Ok(v) = env::var("UPLOAD_SCRATCH_BASE_DIR") {
            config.scratch.base_dir = v;
        }

        if let Ok(v) = env::var("UPLOAD_LOGGING_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = env::var("UPLOAD_LOGGING_FORMAT") {
            config.logging.format = v;
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server port cannot be 0".to_string());
        }
        if self.server.request_timeout_secs == 0 {
            return Err("request timeout cannot be 0".to_string());
        }
        if self.server.service_credential.is_empty() {
            return Err("service credential cannot be empty".to_string());
        }
        if self.database.uri.is_empty() {
            return Err("database uri cannot be empty".to_string());
        }
        if self.remote.owner.is_empty() {
            return Err("remote owner cannot be empty".to_string());
        }
        if self.remote.default_repository.is_empty() {
            return Err("remote default repository cannot be empty".to_string());
        }
        if self.upload_policy.min_chunk_size > self.upload_policy.max_chunk_size {
            return Err("min_chunk_size cannot exceed max_chunk_size".to_string());
        }
        if self.upload_policy.default_chunk_size == 0 {
            return Err("default_chunk_size cannot be 0".to_string());
        }
        if self.upload_policy.max_upload_size == 0 {
            return Err("max_upload_size cannot be 0".to_string());
        }
        if self.scratch.base_dir.is_empty() {
            return Err("scratch base_dir cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "invalid log level '{}'. Valid values: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(format!(
                "invalid log format '{}'. Valid values: {}",
                self.logging.format,
                valid_formats.join(", ")
            ));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_chunk_bounds() {
        let mut config = Config::default();
        config.upload_policy.min_chunk_size = config.upload_policy.max_chunk_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn server_address_formats_host_and_port() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.server_address(), "127.0.0.1:9090");
    }
}
