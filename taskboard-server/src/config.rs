use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;

/// Server settings. Every flag can also come from the environment or `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "taskboard-server", version, about = "Multi-user task manager API")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// sqlite URL; defaults to a file in the user's state directory
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// HS256 signing secret for bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,

    /// Reported by /api/health
    #[arg(long = "env", env = "APP_ENV", default_value = "development")]
    pub environment: String,
}

impl Config {
    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid server address {}:{}", self.host, self.port))
    }

    pub fn database_url(&self) -> anyhow::Result<String> {
        match &self.database_url {
            Some(url) => Ok(url.clone()),
            None => Ok(taskboard_core::default_database_url()?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "taskboard-server",
            "--port",
            "8080",
            "--jwt-secret",
            "s3cret",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.database_url().unwrap(), "sqlite::memory:");
        assert_eq!(config.address().unwrap().port(), 8080);
    }

    #[test]
    fn rejects_unparseable_host() {
        let config = Config::try_parse_from([
            "taskboard-server",
            "--host",
            "not a host",
            "--jwt-secret",
            "s3cret",
        ])
        .unwrap();
        assert!(config.address().is_err());
    }
}
