//! Server configuration, loaded from environment variables.

use std::env;

use thiserror::Error;
use uuid::Uuid;

use crate::backplane::InstanceId;

/// Default WebSocket listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default backplane URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime knobs. None of these affect relay semantics.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`BEACON_PORT`).
    pub port: u16,
    /// Backplane connection URL (`BEACON_REDIS_URL`). May embed credentials,
    /// so it must never be logged.
    pub redis_url: String,
    /// Identity of this instance on the backplane channel
    /// (`BEACON_INSTANCE_ID`, a UUID). Random per process when unset.
    pub instance_id: InstanceId,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            env::var("BEACON_PORT").ok(),
            env::var("BEACON_REDIS_URL").ok(),
            env::var("BEACON_INSTANCE_ID").ok(),
        )
    }

    fn from_vars(
        port: Option<String>,
        redis_url: Option<String>,
        instance_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = match port {
            Some(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "BEACON_PORT",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };

        let redis_url = redis_url.unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let instance_id = match instance_id {
            Some(v) => InstanceId(Uuid::parse_str(&v).map_err(|_| ConfigError::Invalid {
                name: "BEACON_INSTANCE_ID",
                value: v,
            })?),
            None => InstanceId::new(),
        };

        Ok(Self {
            port,
            redis_url,
            instance_id,
        })
    }
}
