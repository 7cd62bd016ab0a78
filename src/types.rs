use std::fmt;

/// Classified result of a single HTTP attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response; the body is kept as opaque bytes.
    Success { status: u16, body: Vec<u8> },
    /// Network fault, timeout, or server-side status worth retrying.
    TransientFailure { status: Option<u16>, reason: String },
    /// HTTP 404. Retried like a transient failure.
    NotFound,
    /// Client-side status that will not change on retry.
    PermanentFailure { status: u16, reason: String },
    /// The cancellation signal fired before the attempt finished.
    Cancelled,
}

impl AttemptOutcome {
    /// Whether the endpoint answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Outcomes the retry policy may schedule another attempt for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFailure { .. } | Self::NotFound)
    }

    /// Response body as text, if this is a success.
    pub fn body_text(&self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status, body } => write!(f, "success ({status}, {} bytes)", body.len()),
            Self::TransientFailure {
                status: Some(status),
                reason,
            } => write!(f, "transient failure ({status}): {reason}"),
            Self::TransientFailure { status: None, reason } => {
                write!(f, "transient failure: {reason}")
            }
            Self::NotFound => write!(f, "not found (404)"),
            Self::PermanentFailure { status, reason } => {
                write!(f, "permanent failure ({status}): {reason}")
            }
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of one resilient invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    /// The last classified outcome; never retried further.
    pub outcome: AttemptOutcome,
    /// Number of network attempts actually performed.
    pub attempts: u32,
}

impl Completion {
    pub(crate) fn cancelled(attempts: u32) -> Self {
        Self {
            outcome: AttemptOutcome::Cancelled,
            attempts,
        }
    }
}
