use std::fmt;

/// Server-side connection state as tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServerState {
    #[default]
    Disconnected,
    /// Terminal: the connection can no longer be used.
    Defunct,
    Negotiation,
    Authentication,
    Ready,
    Streaming,
    TxReady,
    TxStreaming,
    Failed,
    Interrupted,
}

impl ServerState {
    pub fn is_terminal(self) -> bool {
        self == ServerState::Defunct
    }

    pub fn in_transaction(self) -> bool {
        matches!(self, ServerState::TxReady | ServerState::TxStreaming)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Disconnected => "DISCONNECTED",
            ServerState::Defunct => "DEFUNCT",
            ServerState::Negotiation => "NEGOTIATION",
            ServerState::Authentication => "AUTHENTICATION",
            ServerState::Ready => "READY",
            ServerState::Streaming => "STREAMING",
            ServerState::TxReady => "TX_READY",
            ServerState::TxStreaming => "TX_STREAMING",
            ServerState::Failed => "FAILED",
            ServerState::Interrupted => "INTERRUPTED",
        };
        f.write_str(name)
    }
}
