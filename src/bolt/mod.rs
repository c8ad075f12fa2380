//! Bolt protocol client
//!
//! Handshake, chunked message framing, typed request/response messages and
//! the per-connection actor that enforces the server state machine.

pub mod chunking;
pub mod config;
pub mod connection;
pub mod error;
pub mod handshake;
pub mod message;
pub mod pool;
pub mod state;
pub mod transport;
pub mod types;
pub mod version;

pub use config::{BoltConfig, TlsConfig};
pub use connection::{BoltConnection, ConnectionStatus};
pub use error::{BoltError, BoltErrorKind, BoltResult};
pub use handshake::SUPPORTED_VERSIONS;
pub use pool::{BoltConnectionFactory, BoltConnectionPool};
pub use state::ServerState;
pub use transport::{BoxedTransport, Connector, TcpConnector, Transport};
pub use version::Version;
