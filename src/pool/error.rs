use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timeout: no connection became available within {0:?}")]
    Timeout(Duration),
}

pub type PoolResult<T> = Result<T, PoolError>;
