//! Pool Tests
//!
//! Pooling real `BoltConnection`s:
//! - Saturation and request timeouts
//! - FIFO hand-off to waiting borrowers
//! - Closed connections are replaced, live ones reused
//! - Group routing over TCP with `BoltConnectionFactory`

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bolt_driver::bolt::message::{signature, HelloExtra};
use bolt_driver::bolt::{BoltConfig, BoltConnection, BoltConnectionFactory, ServerState, Version};
use bolt_driver::pool::{ConnectionFactory, ContextId, ContextPool, GroupPool, PoolConfig, PoolError};
use common::{DuplexConnector, MockServer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Builds connections over in-memory pipes whose server side accepts the
/// handshake (or rejects it when asked) and then stays open.
#[derive(Default)]
struct DuplexFactory {
    created: AtomicUsize,
    reject_next: Mutex<bool>,
    hang_up_next: Mutex<bool>,
    servers: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

#[async_trait]
impl ConnectionFactory for DuplexFactory {
    type Connection = BoltConnection;

    async fn create_connection(&self, _context: ContextId) -> BoltConnection {
        self.created.fetch_add(1, Ordering::SeqCst);
        let (connector, stream) = DuplexConnector::pair();
        let reject = std::mem::take(&mut *self.reject_next.lock().unwrap());
        let hang_up = std::mem::take(&mut *self.hang_up_next.lock().unwrap());
        let server = tokio::spawn(async move {
            if reject {
                MockServer::reject(stream).await;
            } else {
                let mut server = MockServer::accept(stream, Version::V5_4).await;
                if !hang_up {
                    server.is_closed().await;
                }
            }
        });
        self.servers.lock().unwrap().push(server);
        BoltConnection::with_connector(connector, vec![Version::V5_4])
    }
}

fn context_pool(max: usize, timeout: Duration) -> (ContextPool<DuplexFactory>, Arc<DuplexFactory>) {
    let factory = Arc::new(DuplexFactory::default());
    let pool = ContextPool::new(ContextId(0), factory.clone(), PoolConfig::new(max, timeout));
    (pool, factory)
}

async fn wait_until_closed(conn: &BoltConnection) {
    let mut status = conn.watch_status();
    while !conn.is_closed() {
        if status.changed().await.is_err() {
            break;
        }
    }
}

// ============================================================================
// Saturation
// ============================================================================

#[tokio::test]
async fn test_saturation_times_out() {
    let (pool, factory) = context_pool(1, Duration::from_millis(50));
    let _held = pool.request_connection().await.unwrap();

    let started = tokio::time::Instant::now();
    let err = pool.request_connection().await.unwrap_err();
    assert_eq!(err, PoolError::Timeout(Duration::from_millis(50)));
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_timed_out_waiter_does_not_take_later_connection() {
    let (pool, _) = context_pool(1, Duration::from_millis(30));
    let held = pool.request_connection().await.unwrap();
    assert!(pool.request_connection().await.is_err());

    pool.return_connection(held).unwrap();
    let again = tokio::time::timeout(Duration::from_secs(1), pool.request_connection())
        .await
        .unwrap()
        .unwrap();
    assert!(!again.is_closed());
}

// ============================================================================
// FIFO hand-off
// ============================================================================

#[tokio::test]
async fn test_waiters_are_served_first_come_first_served() {
    let (pool, factory) = context_pool(1, Duration::from_secs(5));
    let held = pool.request_connection().await.unwrap();

    let (order_tx, mut order_rx) = mpsc::unbounded_channel();
    let mut waiters = Vec::new();
    for n in 0..4 {
        let pool = pool.clone();
        let order_tx = order_tx.clone();
        waiters.push(tokio::spawn(async move {
            let conn = pool.request_connection().await.unwrap();
            order_tx.send(n).unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            pool.return_connection(conn).unwrap();
        }));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pool.return_connection(held).unwrap();
    for waiter in waiters {
        waiter.await.unwrap();
    }
    drop(order_tx);

    let mut order = Vec::new();
    while let Some(n) = order_rx.recv().await {
        order.push(n);
    }
    assert_eq!(order, vec![0, 1, 2, 3]);
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Reuse and replacement
// ============================================================================

#[tokio::test]
async fn test_defunct_connection_is_replaced() {
    let (pool, factory) = context_pool(1, Duration::from_secs(1));
    *factory.reject_next.lock().unwrap() = true;

    let broken = pool.request_connection().await.unwrap();
    wait_until_closed(&broken).await;
    assert_eq!(broken.server_state(), ServerState::Defunct);
    pool.return_connection(broken).unwrap();

    let fresh = pool.request_connection().await.unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    assert!(!fresh.is_closed());
}

#[tokio::test]
async fn test_idle_connection_dropped_by_server_is_replaced() {
    let (pool, factory) = context_pool(1, Duration::from_secs(1));
    *factory.hang_up_next.lock().unwrap() = true;

    let conn = pool.request_connection().await.unwrap();
    wait_until_closed(&conn).await;
    assert_eq!(conn.negotiated_version(), Some(Version::V5_4));
    pool.return_connection(conn).unwrap();

    let fresh = pool.request_connection().await.unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    assert!(!fresh.is_closed());
}

#[tokio::test]
async fn test_with_connection_returns_connection() {
    let (pool, factory) = context_pool(1, Duration::from_millis(100));
    for _ in 0..3 {
        let state = pool
            .with_connection(|conn| {
                let state = conn.server_state();
                Box::pin(async move { Ok::<_, PoolError>(state) })
            })
            .await
            .unwrap();
        assert_ne!(state, ServerState::Defunct);
    }
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Group pool over TCP
// ============================================================================

/// Accepts any number of connections; answers the handshake and every HELLO.
async fn spawn_tcp_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut handshake = [0u8; 20];
                socket.read_exact(&mut handshake).await.unwrap();
                socket
                    .write_all(&Version::V5_4.to_raw().to_be_bytes())
                    .await
                    .unwrap();
                let (mut reader, mut writer) = socket.into_split();
                loop {
                    let Ok(bytes) = bolt_driver::bolt::chunking::read_message(&mut reader).await else {
                        return;
                    };
                    let message = bolt_driver::packstream::decode_exact(&bytes).unwrap();
                    let signature_byte = message.as_structure().unwrap().signature;
                    assert_eq!(signature_byte, signature::HELLO);
                    let success = bolt_driver::packstream::Structure::new(
                        signature::SUCCESS,
                        vec![bolt_driver::Value::Map(Default::default())],
                    );
                    let payload =
                        bolt_driver::packstream::encode(&bolt_driver::Value::Structure(success)).unwrap();
                    bolt_driver::bolt::chunking::write_message(&mut writer, &payload)
                        .await
                        .unwrap();
                }
            });
        }
    });
    port
}

#[tokio::test]
async fn test_group_pool_over_tcp() {
    let port = spawn_tcp_server().await;
    let config = BoltConfig::new("127.0.0.1").port(port);
    let pool = GroupPool::new(
        2,
        Arc::new(BoltConnectionFactory::new(config)),
        PoolConfig::new(1, Duration::from_secs(1)),
    );

    let conn = pool.request_connection(ContextId(1)).await.unwrap();
    assert_eq!(conn.context(), ContextId(1));
    conn.hello(HelloExtra::default()).await.unwrap();
    assert_eq!(conn.server_state(), ServerState::Authentication);
    pool.return_connection(conn).unwrap();

    // Same context, max 1: the authenticated connection comes back.
    let again = pool.request_connection(ContextId(1)).await.unwrap();
    assert_eq!(again.server_state(), ServerState::Authentication);

    // The other context opens its own.
    let other = pool.request_connection(ContextId(0)).await.unwrap();
    wait_for_negotiation(&other).await;
    assert_eq!(other.server_state(), ServerState::Negotiation);

    pool.shutdown().await.unwrap();
}

async fn wait_for_negotiation(conn: &BoltConnection) {
    let mut status = conn.watch_status();
    status
        .wait_for(|status| status.server_state != ServerState::Disconnected)
        .await
        .unwrap();
}
