use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3978";
pub const DEFAULT_CARD_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_origin: Option<String>,
    pub card_queue_capacity: usize,
    /// Incoming webhook every card is posted to when set, instead of the
    /// conversation's own service URL.
    pub card_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = match non_empty("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value,
            })?,
            None => DEFAULT_BIND_ADDR.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        };

        let card_queue_capacity = match non_empty("CARD_QUEUE_CAPACITY") {
            Some(value) => match value.parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CARD_QUEUE_CAPACITY",
                        value,
                    })
                }
            },
            None => DEFAULT_CARD_QUEUE_CAPACITY,
        };

        Ok(Config {
            database_url,
            bind_addr,
            frontend_origin: non_empty("FRONTEND_ORIGIN"),
            card_queue_capacity,
            card_webhook_url: non_empty("CARD_WEBHOOK_URL"),
        })
    }
}
