//! Driver configuration
//!
//! ## Environment Variables
//!
//! [`DriverConfig::from_env`] reads a `.env` file if present, then:
//!
//! - `BOLT_HOST` - Server host
//! - `BOLT_PORT` - Server port
//! - `BOLT_USER` - Basic auth principal (defaults to `neo4j` when only a password is set)
//! - `BOLT_PASSWORD` - Basic auth credentials
//! - `BOLT_TLS` - `true`/`1` to connect over TLS
//! - `BOLT_MAX_CONNECTIONS` - Connections per pool context
//! - `BOLT_REQUEST_TIMEOUT_MS` - How long a pool borrow may wait

use std::time::Duration;

use crate::bolt::message::{Auth, HelloExtra};
use crate::bolt::{BoltConfig, TlsConfig};
use crate::error::{DriverError, DriverResult};
use crate::pool::PoolConfig;

pub const ENV_HOST: &str = "BOLT_HOST";
pub const ENV_PORT: &str = "BOLT_PORT";
pub const ENV_USER: &str = "BOLT_USER";
pub const ENV_PASSWORD: &str = "BOLT_PASSWORD";
pub const ENV_TLS: &str = "BOLT_TLS";
pub const ENV_MAX_CONNECTIONS: &str = "BOLT_MAX_CONNECTIONS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "BOLT_REQUEST_TIMEOUT_MS";

/// Everything needed to open and authenticate one connection.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub bolt: BoltConfig,
    pub hello: HelloExtra,
    pub auth: Auth,
}

impl SessionConfig {
    pub fn new(bolt: BoltConfig) -> Self {
        Self {
            bolt,
            ..Default::default()
        }
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn hello(mut self, hello: HelloExtra) -> Self {
        self.hello = hello;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub session: SessionConfig,
    pub pool: PoolConfig,
    /// Number of pool contexts, usually one per worker.
    pub contexts: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            pool: PoolConfig::default(),
            contexts: 1,
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> DriverResult<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies every override `lookup` knows about. Empty values are ignored.
    pub fn apply_overrides<L>(&mut self, lookup: L) -> DriverResult<()>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.session.bolt.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.session.bolt.port = parse(ENV_PORT, &port)?;
        }
        if let Some(tls) = get(ENV_TLS) {
            self.session.bolt.tls = match tls.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Some(TlsConfig::default()),
                "0" | "false" | "no" => None,
                other => {
                    return Err(DriverError::Config(format!(
                        "{} must be true or false, got '{}'",
                        ENV_TLS, other
                    )))
                }
            };
        }
        if let Some(password) = get(ENV_PASSWORD) {
            let user = get(ENV_USER);
            self.session.auth = Auth::basic(user.as_deref(), password);
        }
        if let Some(max) = get(ENV_MAX_CONNECTIONS) {
            self.pool.max_connections_per_context = parse(ENV_MAX_CONNECTIONS, &max)?;
        }
        if let Some(millis) = get(ENV_REQUEST_TIMEOUT_MS) {
            self.pool.request_timeout = Duration::from_millis(parse(ENV_REQUEST_TIMEOUT_MS, &millis)?);
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> DriverResult<T> {
    value
        .parse()
        .map_err(|_| DriverError::Config(format!("invalid value for {}: '{}'", key, value)))
}
