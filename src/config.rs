use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Controls behavior the product has not settled yet.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UserPolicy {
    /// Run the email/password rules on `update_user` too.
    pub validate_on_update: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server: ServerConfig,
    pub users: UserPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
        };
        let users = UserPolicy {
            validate_on_update: std::env::var("USERS_VALIDATE_ON_UPDATE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(false),
        };
        Ok(Self {
            database_url,
            database_max_connections,
            server,
            users,
        })
    }
}
