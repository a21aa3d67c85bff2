use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use modal_db::Backend;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Server settings, read once at startup from `MODAL_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub db_path: PathBuf,
    pub json_path: PathBuf,
    pub jwt_secret: String,
    pub static_dir: PathBuf,
    pub chrome_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let raw_port = or("MODAL_PORT", "3000");
        let port = raw_port
            .trim()
            .parse()
            .with_context(|| format!("MODAL_PORT must be a port number, got {:?}", raw_port))?;
        let backend = or("MODAL_STORE", "sqlite").parse().context("MODAL_STORE")?;

        Ok(Self {
            host: or("MODAL_HOST", "0.0.0.0"),
            port,
            backend,
            db_path: or("MODAL_DB_PATH", "database.sqlite").into(),
            json_path: or("MODAL_JSON_PATH", "database.json").into(),
            jwt_secret: or("MODAL_JWT_SECRET", DEFAULT_JWT_SECRET),
            static_dir: or("MODAL_STATIC_DIR", "public").into(),
            chrome_path: or("MODAL_CHROME_PATH", "chromium").into(),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("database.sqlite"));
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(config.uses_default_secret());
        assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("MODAL_PORT", "8080"),
            ("MODAL_STORE", "json"),
            ("MODAL_JWT_SECRET", "s3cret"),
            ("MODAL_HOST", "127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(config.backend, Backend::Json);
        assert!(!config.uses_default_secret());
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn invalid_values_fail() {
        assert!(config(&[("MODAL_PORT", "http")]).is_err());
        assert!(config(&[("MODAL_STORE", "mongo")]).is_err());
    }
}
