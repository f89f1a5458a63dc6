// ABOUTME: Server configuration loaded from environment variables with defaults
// ABOUTME: Holds database, blob storage, listener, analyzer and session settings

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string (default: sqlite:stockroom.db?mode=rwc)
    pub database_url: String,
    /// Root directory for uploaded image blobs (default: ./stockroom-files)
    pub storage_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Enables image analysis when set
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Prefix for the URLs encoded into label QR codes
    pub app_url: String,
    /// Request body and upload size limit in MB (default: 25)
    pub max_upload_mb: usize,
    /// Lifetime of an issued session token (default: one week)
    pub session_ttl_hours: i64,
    /// Sets the Secure flag on the session cookie
    pub secure_cookies: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:stockroom.db?mode=rwc".to_string(),
            storage_path: PathBuf::from("./stockroom-files"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            app_url: "http://localhost:3000".to_string(),
            max_upload_mb: 25,
            session_ttl_hours: 168,
            secure_cookies: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let storage_path = std::env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let host = std::env::var("HOST").unwrap_or(defaults.host);

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        // An empty key counts as unset
        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.openai_base_url);

        let openai_model = std::env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model);

        let app_url = std::env::var("APP_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_url);

        let max_upload_mb = std::env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_upload_mb);

        let session_ttl_hours = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.session_ttl_hours);

        let secure_cookies = app_url.starts_with("https://");

        Self {
            database_url,
            storage_path,
            host,
            port,
            openai_api_key,
            openai_base_url,
            openai_model,
            app_url,
            max_upload_mb,
            session_ttl_hours,
            secure_cookies,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes(), 25 * 1024 * 1024);
        assert!(!config.ai_enabled());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_ai_enabled_follows_api_key() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert!(config.ai_enabled());
    }
}
