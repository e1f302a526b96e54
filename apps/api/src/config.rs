//! API server configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use storefront_shared_config::{
    get_required_env, parse_env, CommonConfig, DatabaseConfig, Environment,
};

use crate::loaders::{LoaderConfig, DEFAULT_BATCH_DELAY, DEFAULT_MAX_BATCH_SIZE};

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Server port (default: 8080)
    pub port: u16,

    /// CORS allowed origins (optional)
    pub cors_allowed_origins: Option<Vec<String>>,

    /// Serve the GraphQL playground at `GET /graphql` (default: on outside production)
    pub graphql_playground: bool,

    /// Batching tunables for per-request loaders
    pub loader: LoaderConfig,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// In production mode `DATABASE_URL` must be set explicitly. In
    /// development/staging the shared defaults are used.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        )
        .unwrap_or_default();
        let is_production = environment.is_production();

        if is_production {
            Self::validate_database_url()?;
        }

        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        Ok(Self {
            common,

            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid PORT value")?,

            cors_allowed_origins: env::var("CORS_ORIGINS").ok().map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),

            graphql_playground: parse_env("GRAPHQL_PLAYGROUND", !is_production)?,

            loader: Self::load_loader_config()?,
        })
    }

    /// Load batching tunables
    ///
    /// `LOADER_BATCH_DELAY_MS` is how long a batch waits for more keys
    /// (default 1); `LOADER_MAX_BATCH_SIZE` caps the keys per batch and must
    /// be at least 1.
    fn load_loader_config() -> Result<LoaderConfig> {
        let delay_ms: u64 = parse_env(
            "LOADER_BATCH_DELAY_MS",
            DEFAULT_BATCH_DELAY.as_millis() as u64,
        )?;
        let max_batch_size: usize = parse_env("LOADER_MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE)?;
        if max_batch_size == 0 {
            bail!("LOADER_MAX_BATCH_SIZE must be at least 1");
        }

        Ok(LoaderConfig {
            delay: Duration::from_millis(delay_ms),
            max_batch_size,
        })
    }

    /// Validate that DATABASE_URL is explicitly set in production
    fn validate_database_url() -> Result<()> {
        match get_required_env("DATABASE_URL") {
            Ok(url) if !url.is_empty() => Ok(()),
            _ => {
                bail!(
                    "DATABASE_URL environment variable is required in production. \
                     Please set your PostgreSQL connection string."
                );
            }
        }
    }

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_defaults() {
        temp_env::with_vars_unset(["LOADER_BATCH_DELAY_MS", "LOADER_MAX_BATCH_SIZE"], || {
            let loader = Config::load_loader_config().unwrap();
            assert_eq!(loader, LoaderConfig::default());
        });
    }

    #[test]
    fn test_loader_overrides() {
        temp_env::with_vars(
            [
                ("LOADER_BATCH_DELAY_MS", Some("5")),
                ("LOADER_MAX_BATCH_SIZE", Some("250")),
            ],
            || {
                let loader = Config::load_loader_config().unwrap();
                assert_eq!(loader.delay, Duration::from_millis(5));
                assert_eq!(loader.max_batch_size, 250);
            },
        );
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        temp_env::with_var("LOADER_MAX_BATCH_SIZE", Some("0"), || {
            let err = Config::load_loader_config().unwrap_err().to_string();
            assert!(err.contains("LOADER_MAX_BATCH_SIZE"));
        });
    }

    #[test]
    fn test_database_url_required_in_production() {
        temp_env::with_vars(
            [("ENVIRONMENT", Some("production")), ("DATABASE_URL", None)],
            || {
                let err = Config::from_env().unwrap_err().to_string();
                assert!(err.contains("DATABASE_URL"));
                assert!(err.contains("required in production"));
            },
        );
    }

    #[test]
    fn test_development_defaults() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", None::<&str>),
                ("DATABASE_URL", None),
                ("PORT", None),
                ("CORS_ORIGINS", Some("http://localhost:3000, ,https://shop.example")),
                ("GRAPHQL_PLAYGROUND", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 8080);
                assert!(config.graphql_playground);
                assert!(!config.is_production());
                assert_eq!(
                    config.cors_allowed_origins,
                    Some(vec![
                        "http://localhost:3000".to_string(),
                        "https://shop.example".to_string()
                    ])
                );
            },
        );
    }

    #[test]
    fn test_playground_off_in_production_by_default() {
        temp_env::with_vars(
            [
                ("ENVIRONMENT", Some("production")),
                ("DATABASE_URL", Some("postgres://shop:secret@db/shop")),
                ("GRAPHQL_PLAYGROUND", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(!config.graphql_playground);
                assert_eq!(config.database().url, "postgres://shop:secret@db/shop");
            },
        );
    }
}
