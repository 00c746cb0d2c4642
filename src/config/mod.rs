//! Configuration management
//!
//! Configuration is loaded from a YAML file (default `config.yml`) and then
//! overridden by `PORTFOLIO_<SECTION>_<KEY>` environment variables.
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "PORTFOLIO";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Outgoing email configuration
    #[serde(default)]
    pub email: EmailConfig,
    /// Public site information
    #[serde(default)]
    pub site: SiteConfig,
    /// Session and throttling settings
    #[serde(default)]
    pub security: SecurityConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file path (or `:memory:`)
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_path() -> String {
    "data/portfolio.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound for cache entries when no per-entry TTL is given
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_max_capacity() -> u64 {
    10_000
}

/// Upload configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types (images plus PDF resumes)
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("media")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "application/pdf".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn get_extension(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            _ => "bin",
        }
    }
}

/// Which transport delivers outgoing mail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    /// Real SMTP relay
    Smtp,
    /// Write messages to the log (default)
    #[default]
    Console,
    /// Keep messages in memory
    Memory,
}

/// Outgoing email configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub backend: EmailBackend,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address for every outgoing message
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Recipient of contact notifications; falls back to `from_address`
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: EmailBackend::default(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
            from_name: default_from_name(),
            contact_email: None,
        }
    }
}

impl EmailConfig {
    /// Address that receives contact form notifications
    pub fn notification_recipient(&self) -> &str {
        self.contact_email
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.from_address)
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@localhost".to_string()
}

fn default_from_name() -> String {
    "Portfolio Platform".to_string()
}

/// Public site information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Absolute base URL used in links inside emails
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            base_url: default_base_url(),
        }
    }
}

fn default_site_name() -> String {
    "Portfolio Platform".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Session lifetime and throttling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_session_days")]
    pub session_days: i64,
    /// Failed logins allowed per email inside the window
    #[serde(default = "default_login_max_attempts")]
    pub login_max_attempts: usize,
    #[serde(default = "default_login_window_minutes")]
    pub login_window_minutes: i64,
    /// Contact form submissions allowed per IP per hour
    #[serde(default = "default_contact_max_per_hour")]
    pub contact_max_per_hour: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_days: default_session_days(),
            login_max_attempts: default_login_max_attempts(),
            login_window_minutes: default_login_window_minutes(),
            contact_max_per_hour: default_contact_max_per_hour(),
        }
    }
}

fn default_session_days() -> i64 {
    7
}

fn default_login_max_attempts() -> usize {
    5
}

fn default_login_window_minutes() -> i64 {
    15
}

fn default_contact_max_per_hour() -> usize {
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
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
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

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        Ok(config)
    }

    /// Load configuration from file, apply environment overrides and validate
    ///
    /// Environment variables follow the pattern `PORTFOLIO_<SECTION>_<KEY>`:
    /// - PORTFOLIO_SERVER_HOST / _PORT / _CORS_ORIGIN
    /// - PORTFOLIO_DATABASE_PATH
    /// - PORTFOLIO_CACHE_TTL_SECONDS
    /// - PORTFOLIO_UPLOAD_PATH / _MAX_FILE_SIZE
    /// - PORTFOLIO_EMAIL_BACKEND / _SMTP_HOST / _SMTP_PORT / _SMTP_USERNAME /
    ///   _SMTP_PASSWORD / _FROM_ADDRESS / _CONTACT_EMAIL
    /// - PORTFOLIO_SITE_BASE_URL
    /// - PORTFOLIO_SECURITY_SESSION_DAYS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than 0".to_string(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path cannot be empty".to_string(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than 0".to_string(),
            ));
        }
        if self.email.backend == EmailBackend::Smtp
            && self.email.smtp_host.as_deref().map_or(true, |h| h.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "email.smtp_host is required when email.backend is smtp".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_value("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parsed::<u16>("SERVER_PORT") {
            self.server.port = port;
        }
        if let Some(cors_origin) = env_value("SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Some(path) = env_value("DATABASE_PATH") {
            self.database.path = path;
        }

        if let Some(ttl) = env_parsed::<u64>("CACHE_TTL_SECONDS") {
            self.cache.ttl_seconds = ttl;
        }

        if let Some(path) = env_value("UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Some(size) = env_parsed::<u64>("UPLOAD_MAX_FILE_SIZE") {
            self.upload.max_file_size = size;
        }

        if let Some(backend) = env_value("EMAIL_BACKEND") {
            match backend.to_lowercase().as_str() {
                "smtp" => self.email.backend = EmailBackend::Smtp,
                "console" => self.email.backend = EmailBackend::Console,
                "memory" => self.email.backend = EmailBackend::Memory,
                _ => {} // Ignore invalid values
            }
        }
        if let Some(host) = env_value("EMAIL_SMTP_HOST") {
            self.email.smtp_host = Some(host);
        }
        if let Some(port) = env_parsed::<u16>("EMAIL_SMTP_PORT") {
            self.email.smtp_port = port;
        }
        if let Some(username) = env_value("EMAIL_SMTP_USERNAME") {
            self.email.smtp_username = Some(username);
        }
        if let Some(password) = env_value("EMAIL_SMTP_PASSWORD") {
            self.email.smtp_password = Some(password);
        }
        if let Some(from) = env_value("EMAIL_FROM_ADDRESS") {
            self.email.from_address = from;
        }
        if let Some(contact) = env_value("EMAIL_CONTACT_EMAIL") {
            self.email.contact_email = Some(contact);
        }

        if let Some(base_url) = env_value("SITE_BASE_URL") {
            self.site.base_url = base_url;
        }

        if let Some(days) = env_parsed::<i64>("SECURITY_SESSION_DAYS") {
            self.security.session_days = days;
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key)).ok()
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_value(key).and_then(|v| v.parse::<T>().ok())
}

/// Format YAML parsing error with location and context
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

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
