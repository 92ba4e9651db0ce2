use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub max_search_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
}

const DEFAULT_DATABASE_URL: &str = "mysql://root@localhost:3306/db_moveat";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_HOST") {
            self.api.host = v;
        }
        if let Some(port) = env::var("API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_MAX_SEARCH_LIMIT") {
            self.api.max_search_limit = v.parse().unwrap_or(self.api.max_search_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET_KEY") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                max_search_limit: 200,
            },
            security: SecurityConfig {
                jwt_secret: "your_default_secret_key".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["*".to_string()],
                bcrypt_cost: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_request_size_bytes: 1024 * 1024, // 1MB
                max_search_limit: 100,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.moveat.app".to_string()],
                bcrypt_cost: 12,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_request_size_bytes: 1024 * 1024, // 1MB
                max_search_limit: 50,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                cors_origins: vec!["https://app.moveat.app".to_string()],
                bcrypt_cost: 12,
            },
        }
    }

    /// Clamp a requested page size to the configured maximum.
    pub fn search_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.api.max_search_limit)
            .clamp(1, self.api.max_search_limit)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
