//! Connection actor
//!
//! A [`BoltConnection`] is a cheap, cloneable handle. The transport is owned
//! by a spawned task that serves requests strictly in submission order:
//! validate the state, write the request, read records until a summary,
//! apply the transition, reply. The current server state is published on a
//! watch channel so handles can read it without a round trip.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn};

use super::chunking::{read_message, write_message};
use super::config::BoltConfig;
use super::error::{BoltError, BoltErrorKind, BoltResult};
use super::handshake::negotiate;
use super::message::{
    Amount, Auth, Begin, BeginExtra, Commit, Discard, Goodbye, Hello, HelloExtra, Logoff, Logon,
    Pull, PullExtra, Request, Reset, Response, ResponseAssembler, Rollback, Route, RouteExtra,
    Run, RunExtra, SuccessMetadata, Summary, Telemetry, TelemetryApi,
};
use super::state::ServerState;
use super::transport::{BoxedTransport, Connector, TcpConnector};
use super::version::Version;
use crate::packstream::{decode_exact, encode, Value};

/// Snapshot of a connection published by its task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub server_state: ServerState,
    pub version: Option<Version>,
}

type NextState = fn(ServerState, &Summary) -> Option<ServerState>;

/// A request waiting for its turn on the wire.
struct QueuedRequest {
    name: &'static str,
    payload: Vec<u8>,
    is_allowed: fn(ServerState) -> bool,
    next_state: NextState,
    reply: oneshot::Sender<BoltResult<Response>>,
}

impl QueuedRequest {
    fn respond(self, result: BoltResult<Response>) {
        // The caller may have stopped waiting.
        let _ = self.reply.send(result);
    }
}

impl std::fmt::Debug for QueuedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedRequest")
            .field("name", &self.name)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

/// Handle to one Bolt connection.
#[derive(Debug, Clone)]
pub struct BoltConnection {
    requests: mpsc::UnboundedSender<QueuedRequest>,
    status: watch::Receiver<ConnectionStatus>,
}

impl BoltConnection {
    /// Spawns a connection over TCP (or TLS) described by `config`.
    ///
    /// Must be called from within a tokio runtime. Requests may be issued
    /// immediately; they are served once the handshake completes.
    pub fn new(config: &BoltConfig) -> Self {
        Self::with_connector(Arc::new(TcpConnector::new(config)), config.versions.clone())
    }

    /// Spawns a connection over an arbitrary transport.
    pub fn with_connector(connector: Arc<dyn Connector>, versions: Vec<Version>) -> Self {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::default());

        let task = ConnectionTask {
            connector,
            versions,
            requests: requests_rx,
            status: status_tx,
        };
        tokio::spawn(task.run());

        Self {
            requests: requests_tx,
            status: status_rx,
        }
    }

    pub fn server_state(&self) -> ServerState {
        self.status.borrow().server_state
    }

    pub fn negotiated_version(&self) -> Option<Version> {
        self.status.borrow().version
    }

    pub fn is_closed(&self) -> bool {
        self.server_state().is_terminal() || self.requests.is_closed()
    }

    /// Subscribes to state changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Queues `request` and waits for its converted outcome.
    pub async fn execute<R: Request>(&self, request: R) -> BoltResult<R::Output> {
        let structure = request.to_structure()?;
        let payload = encode(&Value::Structure(structure))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = QueuedRequest {
            name: R::NAME,
            payload,
            is_allowed: R::is_allowed,
            next_state: R::next_state,
            reply: reply_tx,
        };
        self.requests.send(queued).map_err(|_| {
            BoltError::connection_closed(format!(
                "Cannot send {}, the connection is terminated",
                R::NAME
            ))
        })?;

        let response = reply_rx.await.map_err(|_| {
            BoltError::connection_closed(format!(
                "The connection stopped before answering {}",
                R::NAME
            ))
        })??;
        R::convert(response)
    }

    // ==================== Lifecycle ====================

    pub async fn hello(&self, extra: HelloExtra) -> BoltResult<SuccessMetadata> {
        let metadata = self.execute(Hello { extra }).await?;
        if let Some(id) = &metadata.connection_id {
            debug!("Server connection id: {}", id);
        }
        Ok(metadata)
    }

    pub async fn logon(&self, auth: Auth) -> BoltResult<SuccessMetadata> {
        self.execute(Logon { auth }).await
    }

    pub async fn logoff(&self) -> BoltResult<SuccessMetadata> {
        self.execute(Logoff).await
    }

    pub async fn telemetry(&self, api: TelemetryApi) -> BoltResult<SuccessMetadata> {
        self.execute(Telemetry { api }).await
    }

    /// Ends the session. The server closing the transport counts as success.
    pub async fn goodbye(&self) -> BoltResult<()> {
        match self.execute(Goodbye).await {
            Err(err) if err.is_connection_closed() => Ok(()),
            other => other,
        }
    }

    pub async fn reset(&self) -> BoltResult<SuccessMetadata> {
        self.execute(Reset).await
    }

    // ==================== Queries ====================

    pub async fn run(
        &self,
        query: impl Into<String>,
        parameters: HashMap<String, Value>,
        extra: RunExtra,
    ) -> BoltResult<SuccessMetadata> {
        self.execute(Run {
            query: query.into(),
            parameters,
            extra,
        })
        .await
    }

    pub async fn discard(&self, n: Amount, qid: Option<i64>) -> BoltResult<SuccessMetadata> {
        self.execute(Discard {
            extra: PullExtra::new(n, qid),
        })
        .await
    }

    pub async fn pull(
        &self,
        n: Amount,
        qid: Option<i64>,
    ) -> BoltResult<(Vec<Vec<Value>>, SuccessMetadata)> {
        self.execute(Pull {
            extra: PullExtra::new(n, qid),
        })
        .await
    }

    // ==================== Transactions ====================

    pub async fn begin(&self, extra: BeginExtra) -> BoltResult<SuccessMetadata> {
        self.execute(Begin { extra }).await
    }

    pub async fn commit(&self) -> BoltResult<SuccessMetadata> {
        self.execute(Commit).await
    }

    pub async fn rollback(&self) -> BoltResult<SuccessMetadata> {
        self.execute(Rollback).await
    }

    pub async fn route(
        &self,
        routing: HashMap<String, Value>,
        bookmarks: Vec<String>,
        extra: RouteExtra,
    ) -> BoltResult<SuccessMetadata> {
        self.execute(Route {
            routing,
            bookmarks,
            extra,
        })
        .await
    }
}

// ==================== Connection task ====================

struct ConnectionTask {
    connector: Arc<dyn Connector>,
    versions: Vec<Version>,
    requests: mpsc::UnboundedReceiver<QueuedRequest>,
    status: watch::Sender<ConnectionStatus>,
}

impl ConnectionTask {
    async fn run(mut self) {
        info!("Starting Bolt connection to {}", self.connector.peer());

        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(err) => {
                error!("Unable to establish a Bolt connection: {}", err);
                self.set_state(ServerState::Defunct);
                self.fail_pending();
                return;
            }
        };

        let mut transport = BufReader::new(transport);
        let mut assembler = ResponseAssembler::new();
        let mut watch_peer = true;
        loop {
            let request = tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
                open = peer_open(&mut transport), if watch_peer => {
                    if open {
                        // Unsolicited bytes stay buffered for the next read.
                        watch_peer = false;
                        continue;
                    }
                    warn!("Server closed the idle connection to {}", self.connector.peer());
                    break;
                }
            };
            self.serve(&mut transport, &mut assembler, request).await;
            if self.state().is_terminal() {
                break;
            }
            watch_peer = true;
        }

        self.set_state(ServerState::Defunct);
        self.fail_pending();
        let _ = transport.shutdown().await;
        debug!("Bolt connection task finished");
    }

    async fn open(&mut self) -> BoltResult<BoxedTransport> {
        let mut transport = self.connector.connect().await?;
        let version = negotiate(&mut transport, &self.versions).await?;
        self.status.send_modify(|status| {
            status.server_state = ServerState::Negotiation;
            status.version = Some(version);
        });
        Ok(transport)
    }

    async fn serve(
        &mut self,
        transport: &mut BufReader<BoxedTransport>,
        assembler: &mut ResponseAssembler,
        request: QueuedRequest,
    ) {
        let state = self.state();
        if !(request.is_allowed)(state) {
            debug!("{} rejected in state {}", request.name, state);
            let err = BoltError::with_detail(
                BoltErrorKind::Forbidden,
                format!("{} is not allowed in state {}", request.name, state),
            );
            request.respond(Err(err));
            return;
        }

        trace!("C: {} ({} bytes)", request.name, request.payload.len());
        match exchange(transport, assembler, &request.payload).await {
            Ok(response) => {
                trace!(
                    "S: {:?} after {} records",
                    response.summary,
                    response.records.len()
                );
                match (request.next_state)(state, &response.summary) {
                    Some(next) => {
                        if next != state {
                            debug!("{}: {} -> {}", request.name, state, next);
                        }
                        self.set_state(next);
                        request.respond(Ok(response));
                    }
                    None => {
                        error!(
                            "{} received an unexpected summary in state {}, closing connection",
                            request.name, state
                        );
                        self.set_state(ServerState::Defunct);
                        let detail = format!(
                            "No transition for {} from state {} on {:?}",
                            request.name, state, response.summary
                        );
                        if cfg!(debug_assertions) {
                            panic!("{}", detail);
                        }
                        request.respond(Err(BoltError::with_detail(
                            BoltErrorKind::Generic,
                            detail,
                        )));
                    }
                }
            }
            Err(err) if err.is_transport() => {
                warn!("Connection closed while serving {}: {}", request.name, err);
                self.set_state(ServerState::Defunct);
                request.respond(Err(BoltError::connection_closed(format!(
                    "The connection to the server was unexpectedly closed: {}",
                    err.detail().unwrap_or_default()
                ))));
            }
            Err(err) => {
                error!("Invalid response to {}: {}", request.name, err);
                self.set_state(ServerState::Defunct);
                request.respond(Err(err));
            }
        }
    }

    fn state(&self) -> ServerState {
        self.status.borrow().server_state
    }

    fn set_state(&self, state: ServerState) {
        self.status.send_modify(|status| status.server_state = state);
    }

    /// Stops accepting requests and fails everything still queued.
    fn fail_pending(&mut self) {
        self.requests.close();
        let mut failed = 0usize;
        while let Ok(request) = self.requests.try_recv() {
            request.respond(Err(BoltError::connection_closed(
                "The connection to the server has been shut down",
            )));
            failed += 1;
        }
        if failed > 0 {
            warn!("Failed {} queued requests on a closed connection", failed);
        }
    }
}

/// Resolves once the idle transport has data buffered (`true`) or has hit
/// end of stream (`false`).
async fn peer_open<T: AsyncBufRead + Unpin>(transport: &mut T) -> bool {
    matches!(transport.fill_buf().await, Ok(buf) if !buf.is_empty())
}

/// Writes one request and reads messages until its summary.
async fn exchange(
    transport: &mut BufReader<BoxedTransport>,
    assembler: &mut ResponseAssembler,
    payload: &[u8],
) -> BoltResult<Response> {
    write_message(transport, payload).await?;
    loop {
        let bytes = read_message(transport).await?;
        let message = decode_exact(&bytes)?;
        if let Some(response) = assembler.push(message)? {
            return Ok(response);
        }
    }
}
