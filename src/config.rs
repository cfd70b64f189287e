use std::env;

/// Fallback customer identity for orders placed without an account.
pub const DEFAULT_GUEST_EMAIL: &str = "guest@example.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub guest_email: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let guest_email = env::var("GUEST_EMAIL")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GUEST_EMAIL.to_string());
        Ok(Self {
            port,
            database_url,
            host,
            guest_email,
        })
    }
}
