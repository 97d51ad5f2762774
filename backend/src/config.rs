use anyhow::Context;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/warehouse";

#[derive(Debug, Clone)]
pub struct Config {
    /// `postgres://...` or `memory://` for the in-process store.
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.starts_with("memory://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> Config {
        Config {
            database_url: url.to_string(),
            max_connections: 10,
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }

    #[test]
    fn memory_scheme_selects_memory_store() {
        assert!(config("memory://").uses_memory_store());
        assert!(!config(DEFAULT_DATABASE_URL).uses_memory_store());
    }
}
