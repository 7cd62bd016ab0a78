use std::fmt;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::{
    invoker::{Attempt, HttpInvoker, InvocationRequest},
    policy::{Decision, RetryPolicy},
    AttemptOutcome, ClientOptions, Completion, Result,
};

/// Resilient GET client: one [`Attempt`] implementation driven by a
/// [`RetryPolicy`].
///
/// Each [`ResilientClient::invoke`] call owns its own attempt counter; nothing
/// is shared between invocations.
pub struct ResilientClient<I = HttpInvoker> {
    invoker: I,
    policy: RetryPolicy,
    span: Span,
}

impl<I> fmt::Debug for ResilientClient<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ResilientClient<HttpInvoker> {
    /// Creates a client for `base_address` with default options
    /// (7 attempts, `2^k` second backoff).
    pub fn new(base_address: &str) -> Result<Self> {
        Self::with_options(base_address, &ClientOptions::default())
    }

    /// Creates a client with explicit timeout and retry options.
    pub fn with_options(base_address: &str, opts: &ClientOptions) -> Result<Self> {
        let invoker = HttpInvoker::with_options(base_address, opts)?;
        Ok(Self::from_parts(invoker, RetryPolicy::from(opts)))
    }
}

impl<I: Attempt> ResilientClient<I> {
    /// Composes an already-built invoker and policy.
    pub fn from_parts(invoker: I, policy: RetryPolicy) -> Self {
        let span = tracing::info_span!(
            "resilient_client",
            base = %invoker.base_address(),
            max_attempts = policy.max_attempts,
        );
        Self {
            invoker,
            policy,
            span,
        }
    }

    /// Retry policy applied to every invocation.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying single-attempt invoker.
    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Invokes `path` relative to the base address until a terminal outcome.
    ///
    /// Returns `Err` only when the request URL cannot be built; every HTTP
    /// result, including exhaustion and cancellation, is a [`Completion`].
    pub async fn invoke(&self, path: &str, cancel: &CancellationToken) -> Result<Completion> {
        let request = InvocationRequest::new(self.invoker.base_address(), path)?;
        Ok(self.run(&request, cancel).await)
    }

    /// Drives the attempt/wait loop for an already-built request.
    pub async fn run(&self, request: &InvocationRequest, cancel: &CancellationToken) -> Completion {
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Completion::cancelled(attempt);
            }
            attempt += 1;

            let outcome = self.invoker.attempt(request, cancel).await;
            if outcome == AttemptOutcome::Cancelled {
                return Completion::cancelled(attempt);
            }

            let delay = match self.policy.decide(&outcome, attempt) {
                Decision::Stop => {
                    return Completion {
                        outcome,
                        attempts: attempt,
                    }
                }
                Decision::RetryAfter(delay) => delay,
            };

            tracing::debug!(
                parent: &self.span,
                attempt,
                delay_ms = delay.as_millis() as u64,
                %outcome,
                "retrying {} after backoff",
                request.url()
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Completion::cancelled(attempt),
                () = sleep(delay) => {}
            }
        }
    }
}
