use std::future::Future;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use tokio_util::sync::CancellationToken;

use crate::{AttemptOutcome, ClientOptions, ProbeError, Result};

/// Target of one invocation: a fixed base address plus a per-call path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    path: String,
    url: Url,
}

impl InvocationRequest {
    /// Resolves `path` against `base` the way a relative link would be.
    pub fn new(base: &Url, path: &str) -> Result<Self> {
        let url = base.join(path).map_err(|source| ProbeError::InvalidRequest {
            base: base.to_string(),
            path: path.to_owned(),
            source,
        })?;
        Ok(Self {
            path: path.to_owned(),
            url,
        })
    }

    /// Path as supplied by the caller.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fully resolved target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Parses a base address, forcing a trailing slash so that relative paths
/// extend it instead of replacing its last segment.
pub fn parse_base_address(base: &str) -> Result<Url> {
    let trimmed = base.trim();
    let mut url = Url::parse(trimmed).map_err(|source| ProbeError::InvalidRequest {
        base: trimmed.to_owned(),
        path: String::new(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// A single, classified, cancellable attempt against an endpoint.
///
/// Implementations perform exactly one call and never retry or log.
pub trait Attempt: Send + Sync {
    /// Base address every request path is resolved against.
    fn base_address(&self) -> &Url;

    fn attempt(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = AttemptOutcome> + Send;
}

/// Coarse class of an HTTP status for retry purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotFound,
    Transient,
    Permanent,
}

/// Classifies a response status: 2xx success, 404 not-found, 5xx and 408
/// transient, everything else permanent.
pub fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        StatusClass::Transient
    } else {
        StatusClass::Permanent
    }
}

/// `reqwest`-backed GET invoker.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct HttpInvoker {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpInvoker {
    /// Creates an invoker with default options.
    pub fn new(base_address: &str) -> Result<Self> {
        Self::with_options(base_address, &ClientOptions::default())
    }

    /// Creates an invoker with its own `reqwest` client built from `opts`.
    pub fn with_options(base_address: &str, opts: &ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(opts.user_agent.as_str())
            .build()?;
        Self::with_client(http, base_address, opts)
    }

    /// Creates an invoker around an existing client, e.g. to share one pool
    /// between several services.
    pub fn with_client(http: reqwest::Client, base_address: &str, opts: &ClientOptions) -> Result<Self> {
        Ok(Self {
            http,
            base: parse_base_address(base_address)?,
            timeout: Duration::from_millis(opts.timeout_ms),
        })
    }

    async fn send(&self, request: &InvocationRequest) -> AttemptOutcome {
        let response = match self
            .http
            .get(request.url().clone())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return request_failure(&err),
        };

        let status = response.status();
        match classify_status(status) {
            StatusClass::Success => match response.bytes().await {
                Ok(body) => AttemptOutcome::Success {
                    status: status.as_u16(),
                    body: body.to_vec(),
                },
                Err(err) => request_failure(&err),
            },
            StatusClass::NotFound => AttemptOutcome::NotFound,
            StatusClass::Transient => AttemptOutcome::TransientFailure {
                status: Some(status.as_u16()),
                reason: status_reason(status),
            },
            StatusClass::Permanent => AttemptOutcome::PermanentFailure {
                status: status.as_u16(),
                reason: status_reason(status),
            },
        }
    }
}

impl Attempt for HttpInvoker {
    fn base_address(&self) -> &Url {
        &self.base
    }

    async fn attempt(&self, request: &InvocationRequest, cancel: &CancellationToken) -> AttemptOutcome {
        if cancel.is_cancelled() {
            return AttemptOutcome::Cancelled;
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => AttemptOutcome::Cancelled,
            outcome = self.send(request) => outcome,
        }
    }
}

fn status_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unrecognized status")
        .to_owned()
}

/// Status reported for a redirect loop when `reqwest` does not carry one.
const REDIRECT_STATUS_FALLBACK: u16 = 300;

// A redirect loop never resolves; every other fault (connect, timeout, body) is
// worth another try.
fn request_failure(err: &reqwest::Error) -> AttemptOutcome {
    if err.is_redirect() {
        return AttemptOutcome::PermanentFailure {
            status: err
                .status()
                .map_or(REDIRECT_STATUS_FALLBACK, |status| status.as_u16()),
            reason: error_chain("redirect limit exceeded", err),
        };
    }

    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "body read failed"
    } else {
        "request failed"
    };

    AttemptOutcome::TransientFailure {
        status: None,
        reason: error_chain(kind, err),
    }
}

fn error_chain(kind: &str, err: &reqwest::Error) -> String {
    let mut reason = format!("{kind}: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}
