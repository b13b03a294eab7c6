//! Configuration management
//!
//! Configuration is read from `config.yml` and may be overridden by
//! `BLOGROLL_*` environment variables. Missing values fall back to defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Blog presentation settings
    #[serde(default)]
    pub blog: BlogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/blogroll.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Email of a superuser to create at startup when missing
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Password for the startup superuser
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            admin_email: None,
            admin_password: None,
        }
    }
}

fn default_session_days() -> i64 {
    14
}

/// Longest accepted session lifetime, ten years
pub const MAX_SESSION_DAYS: i64 = 3650;

/// Blog presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Blog name shown in page headers
    #[serde(default = "default_blog_title")]
    pub title: String,
    /// Published posts shown per list page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: default_blog_title(),
            page_size: default_page_size(),
        }
    }
}

fn default_blog_title() -> String {
    "Blogroll".to_string()
}

fn default_page_size() -> u32 {
    10
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid value in config file '{path}': {message}")]
    InvalidValue { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate().map_err(|message| ConfigError::InvalidValue {
            path: path.display().to_string(),
            message,
        })?;

        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_SESSION_DAYS).contains(&self.auth.session_days) {
            return Err(format!(
                "auth.session_days must be between 1 and {}, got {}",
                MAX_SESSION_DAYS, self.auth.session_days
            ));
        }
        if self.blog.page_size == 0 {
            return Err("blog.page_size must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - BLOGROLL_SERVER_HOST
    /// - BLOGROLL_SERVER_PORT
    /// - BLOGROLL_DATABASE_DRIVER
    /// - BLOGROLL_DATABASE_URL
    /// - BLOGROLL_AUTH_SESSION_DAYS
    /// - BLOGROLL_AUTH_ADMIN_EMAIL
    /// - BLOGROLL_AUTH_ADMIN_PASSWORD
    /// - BLOGROLL_BLOG_TITLE
    /// - BLOGROLL_BLOG_PAGE_SIZE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides; unparseable values are ignored
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BLOGROLL_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("BLOGROLL_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(driver) = std::env::var("BLOGROLL_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("BLOGROLL_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(days) = std::env::var("BLOGROLL_AUTH_SESSION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                if (1..=MAX_SESSION_DAYS).contains(&days) {
                    self.auth.session_days = days;
                }
            }
        }
        if let Ok(email) = std::env::var("BLOGROLL_AUTH_ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Ok(password) = std::env::var("BLOGROLL_AUTH_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }

        if let Ok(title) = std::env::var("BLOGROLL_BLOG_TITLE") {
            self.blog.title = title;
        }
        if let Ok(size) = std::env::var("BLOGROLL_BLOG_PAGE_SIZE") {
            if let Ok(size) = size.parse::<u32>() {
                if size > 0 {
                    self.blog.page_size = size;
                }
            }
        }
    }
}

/// Format YAML parsing error with location
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
