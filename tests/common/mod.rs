//! Common test utilities for Bolt connection tests
//!
//! Provides:
//! - An in-memory connector backed by `tokio::io::duplex`
//! - A scripted server side that speaks the handshake and chunked messages

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bolt_driver::bolt::chunking::{read_message, write_message};
use bolt_driver::bolt::handshake::BOLT_MAGIC;
use bolt_driver::bolt::message::signature;
use bolt_driver::bolt::{BoltConnection, BoxedTransport, Connector, Version};
use bolt_driver::packstream::{decode_exact, encode, Structure, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// Hands out one end of a duplex pipe, once.
pub struct DuplexConnector {
    stream: Mutex<Option<DuplexStream>>,
}

impl DuplexConnector {
    pub fn pair() -> (Arc<Self>, DuplexStream) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let connector = Arc::new(Self {
            stream: Mutex::new(Some(client)),
        });
        (connector, server)
    }
}

#[async_trait]
impl Connector for DuplexConnector {
    async fn connect(&self) -> io::Result<BoxedTransport> {
        match self.stream.lock().unwrap().take() {
            Some(stream) => Ok(Box::new(stream)),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "duplex already used")),
        }
    }

    fn peer(&self) -> String {
        "duplex".to_string()
    }
}

/// A connection wired to an in-memory server stream.
pub fn connect() -> (BoltConnection, DuplexStream) {
    let (connector, server) = DuplexConnector::pair();
    let connection = BoltConnection::with_connector(connector, vec![Version::V5_4]);
    (connection, server)
}

pub fn map(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Server side of a scripted conversation.
pub struct MockServer {
    stream: DuplexStream,
}

impl MockServer {
    /// Reads the handshake and agrees on `version`.
    pub async fn accept(mut stream: DuplexStream, version: Version) -> Self {
        let mut request = [0u8; 20];
        stream.read_exact(&mut request).await.unwrap();
        assert_eq!(request[..4], BOLT_MAGIC);
        stream
            .write_all(&version.to_raw().to_be_bytes())
            .await
            .unwrap();
        Self { stream }
    }

    /// Reads the handshake and answers that no version matched.
    pub async fn reject(mut stream: DuplexStream) {
        let mut request = [0u8; 20];
        stream.read_exact(&mut request).await.unwrap();
        stream.write_all(&[0, 0, 0, 0]).await.unwrap();
    }

    /// Reads one message and checks its signature.
    pub async fn expect(&mut self, signature: u8) -> Structure {
        let bytes = read_message(&mut self.stream).await.unwrap();
        let structure = decode_exact(&bytes).unwrap().into_structure().unwrap();
        assert_eq!(
            structure.signature, signature,
            "expected message 0x{:02X}, got 0x{:02X}",
            signature, structure.signature
        );
        structure
    }

    pub async fn send(&mut self, signature: u8, fields: Vec<Value>) {
        let payload = encode(&Value::Structure(Structure::new(signature, fields))).unwrap();
        write_message(&mut self.stream, &payload).await.unwrap();
    }

    pub async fn success(&mut self, metadata: &[(&str, Value)]) {
        self.send(signature::SUCCESS, vec![Value::Map(map(metadata))])
            .await;
    }

    pub async fn record(&mut self, fields: Vec<Value>) {
        self.send(signature::RECORD, vec![Value::List(fields)]).await;
    }

    pub async fn failure(&mut self, code: &str, message: &str) {
        let metadata = map(&[("code", Value::from(code)), ("message", Value::from(message))]);
        self.send(signature::FAILURE, vec![Value::Map(metadata)]).await;
    }

    pub async fn ignored(&mut self) {
        self.send(signature::IGNORED, Vec::new()).await;
    }

    /// HELLO then LOGON, both successful.
    pub async fn authenticate(&mut self) {
        self.expect(signature::HELLO).await;
        self.success(&[("server", Value::from("Neo4j/5.20.0")), ("connection_id", Value::from("bolt-1"))])
            .await;
        self.expect(signature::LOGON).await;
        self.success(&[]).await;
    }

    /// True once the client has closed its end.
    pub async fn is_closed(&mut self) -> bool {
        let mut byte = [0u8; 1];
        matches!(self.stream.read(&mut byte).await, Ok(0) | Err(_))
    }

    pub fn into_inner(self) -> DuplexStream {
        self.stream
    }
}
