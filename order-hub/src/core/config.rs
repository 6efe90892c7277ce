use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP/WebSocket port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | Default tracing filter |
/// | LOG_DIR | unset | Directory for daily rolling log files |
/// | BROADCAST_CAPACITY | 256 | Per-topic realtime buffer |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP request timeout (ms) |
/// | DB_FILE | orders.redb | Order database, relative to WORK_DIR |
/// | CATALOG_FILE | unset | JSON catalog seed (restaurants, tables, menus, stock) |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// Messages buffered per realtime topic before slow receivers lag
    pub broadcast_capacity: usize,
    pub request_timeout_ms: u64,
    pub db_file: String,
    pub catalog_file: Option<String>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
            broadcast_capacity: env_or("BROADCAST_CAPACITY", 256),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "orders.redb".into()),
            catalog_file: std::env::var("CATALOG_FILE").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Override the parts tests usually care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Absolute or work-dir-relative database path
    pub fn db_path(&self) -> PathBuf {
        let db_file = PathBuf::from(&self.db_file);
        if db_file.is_absolute() {
            db_file
        } else {
            PathBuf::from(&self.work_dir).join(db_file)
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
