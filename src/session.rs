//! Session helpers over a single connection
//!
//! A [`Session`] brings its connection into a usable state on demand (HELLO,
//! LOGON, RESET after a failure) and wraps the usual RUN/PULL and
//! BEGIN/COMMIT sequences.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::bolt::message::{Amount, BeginExtra, RunExtra, SuccessMetadata};
use crate::bolt::{BoltConnection, BoltError, ServerState};
use crate::config::SessionConfig;
use crate::error::DriverResult;
use crate::packstream::{from_value, Value};

/// Column names and rows of a fully consumed result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub fields: Vec<String>,
    pub records: Vec<Vec<Value>>,
    pub summary: SuccessMetadata,
}

#[derive(Debug, Clone)]
pub struct Session {
    connection: BoltConnection,
    config: SessionConfig,
}

impl Session {
    /// Opens a new connection as described by `config`.
    pub fn new(config: SessionConfig) -> Self {
        let connection = BoltConnection::new(&config.bolt);
        Self { connection, config }
    }

    /// Wraps an existing connection, for instance one borrowed from a pool.
    pub fn with_connection(connection: BoltConnection, config: SessionConfig) -> Self {
        Self { connection, config }
    }

    pub fn connection(&self) -> &BoltConnection {
        &self.connection
    }

    /// Sends whatever HELLO, LOGON or RESET the connection needs before it
    /// can take a query.
    pub async fn prepare_if_needed(&self) -> DriverResult<()> {
        let mut status = self.connection.watch_status();
        let state = status
            .wait_for(|status| status.server_state != ServerState::Disconnected)
            .await
            .map(|status| status.server_state)
            .map_err(|_| BoltError::connection_closed("The connection task has stopped"))?;

        match state {
            ServerState::Negotiation => {
                self.connection.hello(self.config.hello.clone()).await?;
                self.connection.logon(self.config.auth.clone()).await?;
            }
            ServerState::Authentication => {
                self.connection.logon(self.config.auth.clone()).await?;
            }
            ServerState::Failed | ServerState::Interrupted => {
                debug!("Resetting connection in state {}", state);
                self.connection.reset().await?;
            }
            ServerState::Defunct => {
                return Err(BoltError::connection_closed("The connection is defunct").into());
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs `query` and pulls every record.
    pub async fn fetch_all(
        &self,
        query: &str,
        parameters: HashMap<String, Value>,
        extra: RunExtra,
    ) -> DriverResult<QueryResult> {
        self.prepare_if_needed().await?;
        let run = self.connection.run(query, parameters, extra).await?;

        let mut records = Vec::new();
        loop {
            let (batch, summary) = self.connection.pull(Amount::ALL, run.qid).await?;
            records.extend(batch);
            if !summary.has_more() {
                return Ok(QueryResult {
                    fields: run.fields.unwrap_or_default(),
                    records,
                    summary,
                });
            }
        }
    }

    /// Runs `query` and decodes each row as `T`. A row is a list, so tuples,
    /// `Vec`s and tuple structs work.
    pub async fn run_query<T: DeserializeOwned>(
        &self,
        query: &str,
        parameters: HashMap<String, Value>,
        extra: RunExtra,
    ) -> DriverResult<Vec<T>> {
        let result = self.fetch_all(query, parameters, extra).await?;
        let rows = result
            .records
            .into_iter()
            .map(|row| from_value(Value::List(row)))
            .collect::<Result<Vec<T>, _>>()?;
        Ok(rows)
    }

    /// Runs `query` for its side effects and discards the records.
    pub async fn execute(
        &self,
        query: &str,
        parameters: HashMap<String, Value>,
        extra: RunExtra,
    ) -> DriverResult<SuccessMetadata> {
        self.prepare_if_needed().await?;
        let run = self.connection.run(query, parameters, extra).await?;
        let summary = self.connection.discard(Amount::ALL, run.qid).await?;
        Ok(summary)
    }

    /// Runs `body` inside an explicit transaction. Commits on success; on
    /// error rolls back unless the server already failed the transaction.
    pub async fn within_transaction<T, B>(&self, extra: BeginExtra, body: B) -> DriverResult<T>
    where
        B: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, DriverResult<T>>,
    {
        self.prepare_if_needed().await?;
        self.connection.begin(extra).await?;

        match body(self).await {
            Ok(value) => {
                self.connection.commit().await?;
                Ok(value)
            }
            Err(err) => {
                let state = self.connection.server_state();
                if state.in_transaction() {
                    if let Err(rollback_err) = self.connection.rollback().await {
                        warn!("Rollback after a failed transaction body failed: {}", rollback_err);
                    }
                } else {
                    debug!("Skipping rollback in state {}", state);
                }
                Err(err)
            }
        }
    }
}
