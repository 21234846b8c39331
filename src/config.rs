use crate::{aggregate::AggregateOptions, error::ShelfError};
use clap::Parser;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Clone, Parser)]
pub struct StartArgs {
    #[arg(short, long, default_value = "config.json")]
    pub config_path: String,

    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    #[arg(short, long, default_value = "3030")]
    pub port: u16,

    #[arg(short, long, default_value = "INFO")]
    pub log_level: tracing::Level,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Site title passed along with rendered libraries
    pub title: Option<String>,

    /// Without this the admin routes are not mounted
    pub admin: Option<AdminConfig>,

    /// Query options used when a public request leaves them out
    #[serde(default)]
    pub defaults: AggregateOptions,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ShelfError> {
        let config = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&config)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Argon2 PHC string of the admin bearer token
    #[serde(alias = "token")]
    pub token_hash: String,
}
