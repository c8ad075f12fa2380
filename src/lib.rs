//! Async client engine for the Bolt graph database protocol.
//!
//! - [`packstream`]: the binary value format and its serde bridge
//! - [`bolt`]: handshake, chunked framing, typed messages and the connection actor
//! - [`pool`]: per-context connection pools with a FIFO waiting list
//! - [`session`]: query and transaction helpers over one connection

pub mod bolt;
pub mod config;
pub mod error;
pub mod packstream;
pub mod pool;
pub mod session;

pub use bolt::{BoltConfig, BoltConnection, BoltConnectionPool, BoltError, BoltErrorKind, ServerState};
pub use config::{DriverConfig, SessionConfig};
pub use error::{DriverError, DriverResult};
pub use packstream::{PackStreamError, Value};
pub use pool::{ContextId, PoolConfig, PoolError};
pub use session::{QueryResult, Session};
