//! Client request messages and their state transitions.

use std::collections::HashMap;

use super::extra::{
    Auth, BeginExtra, DiscardExtra, HelloExtra, PullExtra, RouteExtra, RunExtra, TelemetryApi,
};
use super::metadata::SuccessMetadata;
use super::request::Request;
use super::response::{Response, Summary};
use super::signature;
use crate::bolt::error::BoltResult;
use crate::bolt::state::ServerState;
use crate::packstream::{FieldWriter, PackStreamResult, PackStreamStructure, StructureEncode, Value};

use ServerState::*;

/// Declares a request without fields.
macro_rules! empty_request {
    ($name:ident, $signature:expr) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl PackStreamStructure for $name {
            const SIGNATURE: u8 = $signature;
        }

        impl StructureEncode for $name {
            fn encode_fields(&self, _fields: &mut FieldWriter) -> PackStreamResult<()> {
                Ok(())
            }
        }
    };
}

empty_request!(Goodbye, signature::GOODBYE);
empty_request!(Logoff, signature::LOGOFF);
empty_request!(Reset, signature::RESET);
empty_request!(Commit, signature::COMMIT);
empty_request!(Rollback, signature::ROLLBACK);

/// Transition shared by DISCARD and PULL.
fn streaming_next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
    match (current, summary) {
        (Streaming, Summary::Success(metadata)) if metadata.has_more() => Some(Streaming),
        (Streaming, Summary::Success(_)) => Some(Ready),
        (Streaming, Summary::Failure(_)) => Some(Failed),
        (TxStreaming, Summary::Success(metadata)) if metadata.has_more() => Some(TxStreaming),
        (TxStreaming, Summary::Success(_)) => Some(TxReady),
        (TxStreaming, Summary::Failure(_)) => Some(Failed),
        (Failed, Summary::Ignored) => Some(Failed),
        (Interrupted, Summary::Ignored) => Some(Interrupted),
        _ => None,
    }
}

/// Transition shared by COMMIT and ROLLBACK.
fn closing_next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
    match (current, summary) {
        (TxReady, Summary::Success(_)) => Some(Ready),
        (TxReady, Summary::Failure(_)) => Some(Failed),
        (Failed, Summary::Ignored) => Some(Failed),
        (Interrupted, Summary::Ignored) => Some(Interrupted),
        _ => None,
    }
}

// ==================== Connection lifecycle ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Hello {
    pub extra: HelloExtra,
}

impl PackStreamStructure for Hello {
    const SIGNATURE: u8 = signature::HELLO;
}

impl StructureEncode for Hello {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.extra)
    }
}

impl Request for Hello {
    const NAME: &'static str = "HELLO";
    const ALLOWED_STATES: &'static [ServerState] = &[Negotiation];
    type Output = SuccessMetadata;

    fn next_state(_current: ServerState, summary: &Summary) -> Option<ServerState> {
        match summary {
            Summary::Success(_) => Some(Authentication),
            Summary::Failure(_) | Summary::Ignored => Some(Defunct),
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

impl Request for Goodbye {
    const NAME: &'static str = "GOODBYE";
    const ALLOWED_STATES: &'static [ServerState] =
        &[Ready, Streaming, TxReady, TxStreaming, Failed, Interrupted];
    type Output = ();

    fn next_state(_current: ServerState, _summary: &Summary) -> Option<ServerState> {
        Some(Defunct)
    }

    fn convert(_response: Response) -> BoltResult<Self::Output> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Logon {
    pub auth: Auth,
}

impl PackStreamStructure for Logon {
    const SIGNATURE: u8 = signature::LOGON;
}

impl StructureEncode for Logon {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.auth)
    }
}

impl Request for Logon {
    const NAME: &'static str = "LOGON";
    const ALLOWED_STATES: &'static [ServerState] = &[Authentication];
    type Output = SuccessMetadata;

    fn next_state(_current: ServerState, summary: &Summary) -> Option<ServerState> {
        match summary {
            Summary::Success(_) => Some(Ready),
            Summary::Failure(_) | Summary::Ignored => Some(Defunct),
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

impl Request for Logoff {
    const NAME: &'static str = "LOGOFF";
    const ALLOWED_STATES: &'static [ServerState] = &[Ready, Failed];
    type Output = SuccessMetadata;

    fn next_state(_current: ServerState, summary: &Summary) -> Option<ServerState> {
        match summary {
            Summary::Success(_) => Some(Authentication),
            Summary::Failure(_) | Summary::Ignored => Some(Defunct),
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

impl Request for Reset {
    const NAME: &'static str = "RESET";
    const ALLOWED_STATES: &'static [ServerState] =
        &[Ready, Streaming, TxReady, TxStreaming, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(_current: ServerState, summary: &Summary) -> Option<ServerState> {
        match summary {
            Summary::Success(_) => Some(Ready),
            Summary::Failure(_) | Summary::Ignored => Some(Defunct),
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    pub api: TelemetryApi,
}

impl PackStreamStructure for Telemetry {
    const SIGNATURE: u8 = signature::TELEMETRY;
}

impl StructureEncode for Telemetry {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.api)
    }
}

impl Request for Telemetry {
    const NAME: &'static str = "TELEMETRY";
    const ALLOWED_STATES: &'static [ServerState] = &[Ready];
    type Output = SuccessMetadata;

    fn next_state(_current: ServerState, summary: &Summary) -> Option<ServerState> {
        match summary {
            Summary::Success(_) => Some(Ready),
            Summary::Failure(_) | Summary::Ignored => Some(Failed),
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

// ==================== Queries and streams ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub query: String,
    pub parameters: HashMap<String, Value>,
    pub extra: RunExtra,
}

impl PackStreamStructure for Run {
    const SIGNATURE: u8 = signature::RUN;
}

impl StructureEncode for Run {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.query)?;
        fields.write(&self.parameters)?;
        fields.write(&self.extra)
    }
}

impl Request for Run {
    const NAME: &'static str = "RUN";
    const ALLOWED_STATES: &'static [ServerState] =
        &[Ready, TxReady, TxStreaming, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        match (current, summary) {
            (Ready, Summary::Success(_)) => Some(Streaming),
            (Ready, Summary::Failure(_)) => Some(Failed),
            (TxReady | TxStreaming, Summary::Success(metadata)) if metadata.qid.is_some() => {
                Some(TxStreaming)
            }
            (TxReady | TxStreaming, Summary::Failure(_)) => Some(Failed),
            (Failed, Summary::Ignored) => Some(Failed),
            (Interrupted, Summary::Ignored) => Some(Interrupted),
            _ => None,
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discard {
    pub extra: DiscardExtra,
}

impl PackStreamStructure for Discard {
    const SIGNATURE: u8 = signature::DISCARD;
}

impl StructureEncode for Discard {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.extra)
    }
}

impl Request for Discard {
    const NAME: &'static str = "DISCARD";
    const ALLOWED_STATES: &'static [ServerState] = &[Streaming, TxStreaming, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        streaming_next_state(current, summary)
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pull {
    pub extra: PullExtra,
}

impl PackStreamStructure for Pull {
    const SIGNATURE: u8 = signature::PULL;
}

impl StructureEncode for Pull {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.extra)
    }
}

impl Request for Pull {
    const NAME: &'static str = "PULL";
    const ALLOWED_STATES: &'static [ServerState] = &[Streaming, TxStreaming, Failed, Interrupted];
    type Output = (Vec<Vec<Value>>, SuccessMetadata);

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        streaming_next_state(current, summary)
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_records_and_metadata()
    }
}

// ==================== Transactions ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Begin {
    pub extra: BeginExtra,
}

impl PackStreamStructure for Begin {
    const SIGNATURE: u8 = signature::BEGIN;
}

impl StructureEncode for Begin {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.extra)
    }
}

impl Request for Begin {
    const NAME: &'static str = "BEGIN";
    const ALLOWED_STATES: &'static [ServerState] = &[Ready, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        match (current, summary) {
            (_, Summary::Success(_)) => Some(TxReady),
            (Ready, Summary::Failure(_)) => Some(Failed),
            (Failed, Summary::Ignored) => Some(Failed),
            (Interrupted, Summary::Ignored) => Some(Interrupted),
            _ => None,
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

impl Request for Commit {
    const NAME: &'static str = "COMMIT";
    const ALLOWED_STATES: &'static [ServerState] = &[TxReady, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        closing_next_state(current, summary)
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

impl Request for Rollback {
    const NAME: &'static str = "ROLLBACK";
    const ALLOWED_STATES: &'static [ServerState] = &[TxReady, Failed, Interrupted];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        closing_next_state(current, summary)
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}

// ==================== Routing ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub routing: HashMap<String, Value>,
    pub bookmarks: Vec<String>,
    pub extra: RouteExtra,
}

impl PackStreamStructure for Route {
    const SIGNATURE: u8 = signature::ROUTE;
}

impl StructureEncode for Route {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()> {
        fields.write(&self.routing)?;
        fields.write(&self.bookmarks)?;
        fields.write(&self.extra)
    }
}

impl Request for Route {
    const NAME: &'static str = "ROUTE";
    const ALLOWED_STATES: &'static [ServerState] = &[Ready, Failed];
    type Output = SuccessMetadata;

    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState> {
        match (current, summary) {
            (Ready, Summary::Success(_)) => Some(Ready),
            (Ready, Summary::Failure(_)) => Some(Failed),
            (Failed, Summary::Ignored) => Some(Failed),
            _ => None,
        }
    }

    fn convert(response: Response) -> BoltResult<Self::Output> {
        response.into_metadata()
    }
}
