use crate::ServiceState;

/// Error type returned by this crate.
///
/// Expected HTTP outcomes never show up here; they are reported as
/// [`crate::AttemptOutcome`] values. These are the faults that stop a
/// service from starting at all.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The configuration source has no value for the endpoint path key.
    #[error("configuration key '{key}' is missing or empty")]
    MissingConfig { key: String },
    /// A configuration argument was not of the `key=value` form.
    #[error("invalid configuration argument '{0}', expected key=value")]
    InvalidArgument(String),
    /// The target URL could not be built from base address and path.
    #[error("invalid request url from base '{base}' and path '{path}': {source}")]
    InvalidRequest {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },
    /// The underlying `reqwest` client could not be constructed.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
    /// A lifecycle operation was called in a state that does not allow it.
    #[error("cannot {operation} service in state {state}")]
    InvalidState {
        operation: &'static str,
        state: ServiceState,
    },
}
