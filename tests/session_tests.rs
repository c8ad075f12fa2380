//! Session Tests
//!
//! Covers the convenience layer over one connection:
//! - Lazy HELLO/LOGON and RESET after failures
//! - Typed rows through the serde bridge
//! - Explicit transactions with commit and rollback

mod common;

use std::collections::HashMap;

use bolt_driver::bolt::message::{signature, Auth, BeginExtra, RunExtra};
use bolt_driver::bolt::types::Node;
use bolt_driver::bolt::{ServerState, Version};
use bolt_driver::packstream::{StructureEncode, Value};
use bolt_driver::{DriverError, Session, SessionConfig};
use common::{connect, map, MockServer};
use serde::Deserialize;

fn session() -> (Session, tokio::io::DuplexStream) {
    let (conn, stream) = connect();
    let config = SessionConfig::default().auth(Auth::basic(None, "password"));
    (Session::with_connection(conn, config), stream)
}

// ============================================================================
// Preparation
// ============================================================================

#[tokio::test]
async fn test_prepare_authenticates_once() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.expect(signature::HELLO).await;
        server.success(&[]).await;
        let logon = server.expect(signature::LOGON).await;
        server.success(&[]).await;
        (server, logon)
    });

    session.prepare_if_needed().await.unwrap();
    session.prepare_if_needed().await.unwrap();
    assert_eq!(session.connection().server_state(), ServerState::Ready);

    let (_server, logon) = server.await.unwrap();
    let auth = logon.fields[0].as_map().unwrap();
    assert_eq!(auth.get("principal"), Some(&Value::from("neo4j")));
    assert_eq!(auth.get("credentials"), Some(&Value::from("password")));
}

#[tokio::test]
async fn test_prepare_resets_failed_connection() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        server.expect(signature::RUN).await;
        server.failure("Neo.ClientError.Statement.SyntaxError", "bad").await;
        server.expect(signature::RESET).await;
        server.success(&[]).await;
        server.expect(signature::RUN).await;
        server.success(&[]).await;
        server.expect(signature::DISCARD).await;
        server.success(&[]).await;
        server
    });

    let err = session
        .execute("BAD", HashMap::new(), RunExtra::default())
        .await
        .unwrap_err();
    assert_eq!(err.failure().map(|(code, _)| code), Some("Neo.ClientError.Statement.SyntaxError"));
    assert_eq!(session.connection().server_state(), ServerState::Failed);

    session
        .execute("CREATE ()", HashMap::new(), RunExtra::default())
        .await
        .unwrap();
    assert_eq!(session.connection().server_state(), ServerState::Ready);
    server.await.unwrap();
}

#[tokio::test]
async fn test_prepare_on_rejected_handshake() {
    let (session, stream) = session();
    tokio::spawn(MockServer::reject(stream));

    let err = session.prepare_if_needed().await.unwrap_err();
    assert!(matches!(err, DriverError::Bolt(ref e) if e.is_connection_closed()));
}

// ============================================================================
// Typed rows
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
struct Person {
    name: String,
}

#[tokio::test]
async fn test_run_query_decodes_rows() {
    let (session, stream) = session();
    let alice = Node {
        id: 1,
        labels: vec!["Person".to_string()],
        properties: map(&[("name", Value::from("Alice"))]),
        element_id: "4:abc:1".to_string(),
    };
    let node_value = Value::Structure(alice.to_structure().unwrap());

    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        let run = server.expect(signature::RUN).await;
        server
            .success(&[("fields", Value::List(vec![Value::from("p"), Value::from("age")]))])
            .await;
        server.expect(signature::PULL).await;
        server.record(vec![node_value, Value::from(42)]).await;
        server.success(&[("has_more", Value::from(false))]).await;
        (run, server)
    });

    let rows: Vec<(Node, i64)> = session
        .run_query(
            "MATCH (p:Person) RETURN p, p.age AS age",
            HashMap::new(),
            RunExtra::default(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let (node, age) = &rows[0];
    assert!(node.has_label("Person"));
    assert_eq!(node.properties_as::<Person>().unwrap(), Person { name: "Alice".into() });
    assert_eq!(*age, 42);

    let (run, _server) = server.await.unwrap();
    assert_eq!(run.fields.len(), 3);
}

#[tokio::test]
async fn test_fetch_all_follows_has_more() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        server.expect(signature::RUN).await;
        server
            .success(&[("fields", Value::List(vec![Value::from("n")]))])
            .await;
        server.expect(signature::PULL).await;
        server.record(vec![Value::from(1)]).await;
        server.success(&[("has_more", Value::from(true))]).await;
        server.expect(signature::PULL).await;
        server.record(vec![Value::from(2)]).await;
        server.success(&[]).await;
        server
    });

    let result = session
        .fetch_all("UNWIND [1, 2] AS n RETURN n", HashMap::new(), RunExtra::default())
        .await
        .unwrap();
    assert_eq!(result.fields, vec!["n".to_string()]);
    assert_eq!(result.records, vec![vec![Value::from(1)], vec![Value::from(2)]]);
    server.await.unwrap();
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn test_within_transaction_commits() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        server.expect(signature::BEGIN).await;
        server.success(&[]).await;
        server.expect(signature::RUN).await;
        server.success(&[("qid", Value::from(0))]).await;
        server.expect(signature::DISCARD).await;
        server.success(&[]).await;
        server.expect(signature::COMMIT).await;
        server.success(&[("bookmark", Value::from("bm-1"))]).await;
        server
    });

    let value = session
        .within_transaction(BeginExtra::default(), |tx| {
            Box::pin(async move {
                tx.execute("CREATE (:Movie)", HashMap::new(), RunExtra::default())
                    .await?;
                Ok::<_, DriverError>(7)
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(session.connection().server_state(), ServerState::Ready);
    server.await.unwrap();
}

#[tokio::test]
async fn test_within_transaction_rolls_back_on_error() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        server.expect(signature::BEGIN).await;
        server.success(&[]).await;
        server.expect(signature::ROLLBACK).await;
        server.success(&[]).await;
        server
    });

    let result: Result<(), DriverError> = session
        .within_transaction(BeginExtra::default(), |_tx| {
            Box::pin(async move { Err::<(), _>(DriverError::Config("aborted by caller".into())) })
        })
        .await;
    assert!(matches!(result, Err(DriverError::Config(_))));
    assert_eq!(session.connection().server_state(), ServerState::Ready);
    server.await.unwrap();
}

#[tokio::test]
async fn test_within_transaction_skips_rollback_when_failed() {
    let (session, stream) = session();
    let server = tokio::spawn(async move {
        let mut server = MockServer::accept(stream, Version::V5_4).await;
        server.authenticate().await;
        server.expect(signature::BEGIN).await;
        server.success(&[]).await;
        server.expect(signature::RUN).await;
        server.failure("Neo.ClientError.Schema.ConstraintValidationFailed", "exists").await;
        // Nothing else may arrive before the client hangs up.
        assert!(server.is_closed().await);
    });

    let result: Result<(), DriverError> = session
        .within_transaction(BeginExtra::default(), |tx| {
            Box::pin(async move {
                tx.execute("CREATE (:Unique {id: 1})", HashMap::new(), RunExtra::default())
                    .await?;
                Ok::<_, DriverError>(())
            })
        })
        .await;
    assert!(result.unwrap_err().failure().is_some());
    assert_eq!(session.connection().server_state(), ServerState::Failed);

    drop(session);
    server.await.unwrap();
}
