//! Bolt request and response messages.

pub mod extra;
pub mod metadata;
pub mod request;
pub mod requests;
pub mod response;

pub use extra::{
    Amount, Auth, BeginExtra, BoltAgent, DiscardExtra, HelloExtra, Mode, PullExtra, RouteExtra,
    RunExtra, TelemetryApi,
};
pub use metadata::{
    FailureMetadata, Hints, RoutingTable, Server, ServerRole, StatementType, Stats,
    SuccessMetadata,
};
pub use request::Request;
pub use requests::{
    Begin, Commit, Discard, Goodbye, Hello, Logoff, Logon, Pull, Reset, Rollback, Route, Run,
    Telemetry,
};
pub use response::{Failure, Ignored, Record, Response, ResponseAssembler, Success, Summary};

/// Structure signatures of every message.
pub mod signature {
    pub const HELLO: u8 = 0x01;
    pub const GOODBYE: u8 = 0x02;
    pub const LOGON: u8 = 0x6A;
    pub const LOGOFF: u8 = 0x6B;
    pub const RESET: u8 = 0x0F;
    pub const RUN: u8 = 0x10;
    pub const BEGIN: u8 = 0x11;
    pub const COMMIT: u8 = 0x12;
    pub const ROLLBACK: u8 = 0x13;
    pub const DISCARD: u8 = 0x2F;
    pub const PULL: u8 = 0x3F;
    pub const ROUTE: u8 = 0x66;
    pub const TELEMETRY: u8 = 0x54;

    pub const RECORD: u8 = 0x71;
    pub const SUCCESS: u8 = 0x70;
    pub const FAILURE: u8 = 0x7F;
    pub const IGNORED: u8 = 0x7E;
}
