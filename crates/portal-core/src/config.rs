//! Portal configuration management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Outbound email / reset links
    pub email: EmailConfig,

    /// Session lifetime
    pub session: SessionConfig,

    /// Seeded admin account
    pub bootstrap: BootstrapConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "API_PORT".to_string(),
                value: port,
            })?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL; absent means the in-memory store
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.postgres_url = Some(url);
        }

        // Email
        if let Ok(host) = std::env::var("SMTP_HOST") {
            config.email.smtp_host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            config.email.smtp_port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SMTP_PORT".to_string(),
                value: port,
            })?;
        }
        if let Ok(username) = std::env::var("SMTP_USERNAME") {
            config.email.username = username;
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            config.email.password = password;
        }
        if let Ok(from) = std::env::var("SMTP_FROM") {
            config.email.from_address = from;
        }
        if let Ok(base) = std::env::var("RESET_LINK_BASE") {
            config.email.reset_link_base = base;
        }

        // Session
        if let Ok(minutes) = std::env::var("SESSION_IDLE_MINUTES") {
            config.session.idle_minutes =
                minutes.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "SESSION_IDLE_MINUTES".to_string(),
                    value: minutes,
                })?;
        }

        // Seeded admin
        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            config.bootstrap.admin_email = email;
        }
        if let Ok(name) = std::env::var("ADMIN_NAME") {
            config.bootstrap.admin_name = name;
        }
        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            config.bootstrap.admin_password = password;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default for security - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; `None` runs against the ephemeral
    /// in-memory store
    pub postgres_url: Option<String>,

    /// PostgreSQL connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            pool_size: 5,
        }
    }
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,

    /// SMTP port (587 for STARTTLS)
    pub smtp_port: u16,

    /// SMTP username
    pub username: String,

    /// SMTP password or app-specific password
    pub password: String,

    /// From address on outgoing mail
    pub from_address: String,

    /// Base URL the reset link is built on; email and token are appended
    /// as query parameters
    pub reset_link_base: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_address: "no-reply@studyportal.local".to_string(),
            reset_link_base: "http://localhost:8080/reset-password".to_string(),
        }
    }
}

/// Session lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding idle timeout in minutes
    pub idle_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { idle_minutes: 30 }
    }
}

/// Seeded admin account, created or repaired at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_email: "admin@example.com".to_string(),
            admin_name: "Admin".to_string(),
            admin_password: "admin123".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.idle_minutes, 30);
        assert_eq!(config.bootstrap.admin_email, "admin@example.com");
        assert!(config.database.postgres_url.is_none());
    }

    #[test]
    fn test_parse_from_toml() {
        let toml_src = r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            cors_origins = []

            [database]
            pool_size = 2

            [email]
            smtp_host = "mail.example.com"
            smtp_port = 465
            username = "portal"
            password = "secret"
            from_address = "portal@example.com"
            reset_link_base = "https://portal.example.com/reset-password"

            [session]
            idle_minutes = 15

            [bootstrap]
            admin_email = "root@example.com"
            admin_name = "Root"
            admin_password = "rootpw"

            [logging]
            level = "debug"
            json_format = false
        "#;

        let config: AppConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.session.idle_minutes, 15);
        assert_eq!(config.email.smtp_port, 465);
        assert_eq!(config.bootstrap.admin_email, "root@example.com");
    }
}
