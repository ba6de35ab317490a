use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

use crate::keygen::DEFAULT_KEY_LENGTH;

/// Which key-value backend holds documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Spanner(SpannerConfig),
}

/// Spanner caps the size of a primary key at 8 KiB
pub const MAX_SPANNER_KEY_LENGTH: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannerConfig {
    pub emulator_host: Option<String>,
    pub project: String,
    pub instance: String,
    pub database: String,
}

impl SpannerConfig {
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service_host: String,
    pub service_port: u16,
    pub key_length: usize,
    pub assets_dir: PathBuf,
    pub store: StoreBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_host = lookup("SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let service_port = lookup("SERVICE_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("SERVICE_PORT must be a valid port number (0-65535)")?;

        let key_length = match lookup("KEY_LENGTH") {
            Some(raw) => raw
                .parse::<usize>()
                .context("KEY_LENGTH must be a positive integer")?,
            None => DEFAULT_KEY_LENGTH,
        };
        if key_length == 0 {
            bail!("KEY_LENGTH must be at least 1");
        }

        let assets_dir = PathBuf::from(lookup("ASSETS_DIR").unwrap_or_else(|| "public".to_string()));

        let backend = lookup("STORE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let store = match backend.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "spanner" => StoreBackend::Spanner(SpannerConfig {
                emulator_host: lookup("SPANNER_EMULATOR_HOST"),
                project: lookup("SPANNER_PROJECT")
                    .context("SPANNER_PROJECT environment variable is required")?,
                instance: lookup("SPANNER_INSTANCE")
                    .context("SPANNER_INSTANCE environment variable is required")?,
                database: lookup("SPANNER_DATABASE")
                    .context("SPANNER_DATABASE environment variable is required")?,
            }),
            other => bail!("STORE_BACKEND must be 'memory' or 'spanner', got '{}'", other),
        };

        if matches!(store, StoreBackend::Spanner(_)) && key_length > MAX_SPANNER_KEY_LENGTH {
            bail!(
                "KEY_LENGTH must be at most {} with the spanner backend, got {}",
                MAX_SPANNER_KEY_LENGTH,
                key_length
            );
        }

        Ok(Config {
            service_host,
            service_port,
            key_length,
            assets_dir,
            store,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service_host, self.service_port)
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Key length: {}", self.key_length);
        tracing::info!("  Assets directory: {}", self.assets_dir.display());
        match &self.store {
            StoreBackend::Memory => tracing::info!("  Store backend: memory"),
            StoreBackend::Spanner(spanner) => {
                tracing::info!("  Store backend: spanner");
                tracing::info!(
                    "  Spanner emulator: {}",
                    spanner
                        .emulator_host
                        .as_deref()
                        .unwrap_or("disabled (using production)")
                );
                tracing::info!("  Spanner database: {}", spanner.database_path());
            }
        }
        tracing::info!("  Service listening on: {}", self.bind_address());
    }
}
