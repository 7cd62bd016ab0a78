/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff unit in milliseconds; the wait after attempt `k` is `unit * 2^k`.
    pub backoff_unit_ms: u64,
    /// Value sent in the `User-Agent` header.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 100_000,
            max_attempts: 7,
            backoff_unit_ms: 1_000,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}
