//! Byte-stream transports the connection task runs over.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use super::config::{BoltConfig, TlsConfig};

/// Trait alias for connection streams
pub trait Transport: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send> Transport for T {}

pub type BoxedTransport = Box<dyn Transport>;

/// Opens a fresh transport for a connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> io::Result<BoxedTransport>;

    /// Peer description for logs.
    fn peer(&self) -> String {
        "custom transport".to_string()
    }
}

/// Plain TCP, optionally wrapped in TLS.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    host: String,
    timeout: Duration,
    tls: Option<TlsConfig>,
}

impl TcpConnector {
    pub fn new(config: &BoltConfig) -> Self {
        Self {
            address: config.address(),
            host: config.host.clone(),
            timeout: config.connect_timeout,
            tls: config.tls.clone(),
        }
    }

    async fn connect_tcp(&self) -> io::Result<TcpStream> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("Connecting to {} timed out after {:?}", self.address, self.timeout),
                )
            })??;
        stream.set_nodelay(true)?;
        debug!("TCP connected to {}", self.address);
        Ok(stream)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<BoxedTransport> {
        let stream = self.connect_tcp().await?;
        match &self.tls {
            None => Ok(Box::new(stream)),
            Some(tls) => wrap_tls(stream, &self.host, tls).await,
        }
    }

    fn peer(&self) -> String {
        self.address.clone()
    }
}

#[cfg(feature = "tls")]
async fn wrap_tls(stream: TcpStream, host: &str, tls: &TlsConfig) -> io::Result<BoxedTransport> {
    use tokio_native_tls::native_tls;

    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(tls.accept_invalid_certs)
        .build()
        .map_err(io::Error::other)?;
    let domain = tls.server_hostname.as_deref().unwrap_or(host);
    let stream = tokio_native_tls::TlsConnector::from(connector)
        .connect(domain, stream)
        .await
        .map_err(io::Error::other)?;
    debug!("TLS session established with {}", domain);
    Ok(Box::new(stream))
}

#[cfg(not(feature = "tls"))]
async fn wrap_tls(_stream: TcpStream, host: &str, _tls: &TlsConfig) -> io::Result<BoxedTransport> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("TLS to {} requested but the `tls` feature is disabled", host),
    ))
}
