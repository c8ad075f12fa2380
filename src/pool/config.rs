use std::time::Duration;

/// Pool sizing and wait limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on live connections owned by one context.
    pub max_connections_per_context: usize,
    /// How long a borrower waits on a saturated context before failing.
    pub request_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections_per_context: 10,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new(max_connections_per_context: usize, request_timeout: Duration) -> Self {
        Self {
            max_connections_per_context,
            request_timeout,
        }
    }
}
