use thiserror::Error;

use crate::bolt::error::BoltError;
use crate::packstream::PackStreamError;
use crate::pool::PoolError;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    PackStream(#[from] PackStreamError),

    #[error(transparent)]
    Bolt(#[from] BoltError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DriverError {
    pub fn as_bolt(&self) -> Option<&BoltError> {
        match self {
            DriverError::Bolt(err) => Some(err),
            _ => None,
        }
    }

    /// Server FAILURE code and message, if this is one.
    pub fn failure(&self) -> Option<(&str, &str)> {
        self.as_bolt().and_then(BoltError::failure)
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
