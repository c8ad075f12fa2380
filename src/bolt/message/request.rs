use crate::bolt::error::BoltResult;
use crate::bolt::state::ServerState;
use crate::packstream::StructureEncode;

use super::response::{Response, Summary};

/// A client message together with its slice of the state machine.
pub trait Request: StructureEncode + Send + 'static {
    const NAME: &'static str;

    /// States in which the request may be written.
    const ALLOWED_STATES: &'static [ServerState];

    type Output: Send;

    /// State after `summary` was received in `current`. `None` marks a
    /// combination the protocol never produces.
    fn next_state(current: ServerState, summary: &Summary) -> Option<ServerState>;

    fn convert(response: Response) -> BoltResult<Self::Output>;

    fn is_allowed(state: ServerState) -> bool {
        Self::ALLOWED_STATES.contains(&state)
    }
}
