use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_provider: String,
    pub database_url: String,
    pub manager_token: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_provider: env::var("DATABASE_PROVIDER")
                .unwrap_or_else(|_| "sqlite".to_string()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "schedules.db".to_string()),
            manager_token: env::var("MANAGER_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
        }
    }
}
