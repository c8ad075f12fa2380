use std::time::Duration;

use super::handshake::SUPPORTED_VERSIONS;
use super::version::Version;

/// TLS settings for the transport.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Name checked against the server certificate; defaults to the host.
    pub server_hostname: Option<String>,
    pub accept_invalid_certs: bool,
}

/// Where and how a connection reaches its server.
#[derive(Debug, Clone)]
pub struct BoltConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    pub connect_timeout: Duration,
    /// Candidate versions for the handshake, in preference order.
    pub versions: Vec<Version>,
}

impl Default for BoltConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 7687,
            tls: None,
            connect_timeout: Duration::from_secs(10),
            versions: SUPPORTED_VERSIONS.to_vec(),
        }
    }
}

impl BoltConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn versions(mut self, versions: Vec<Version>) -> Self {
        self.versions = versions;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoltConfig::default();
        assert_eq!(config.address(), "localhost:7687");
        assert!(config.tls.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.versions[0], Version::V5_4);
    }

    #[test]
    fn test_builder() {
        let config = BoltConfig::new("graph.internal")
            .port(7688)
            .tls(TlsConfig::default())
            .connect_timeout(Duration::from_millis(500));
        assert_eq!(config.address(), "graph.internal:7688");
        assert!(config.tls.is_some());
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
    }
}
