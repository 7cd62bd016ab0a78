//! Managed service lifecycle.
//!
//! A [`ManagedService`] runs exactly one resilient invocation per lifetime:
//!
//! ```text
//! Created ──start──► Running ──invocation done / stop──► Stopped
//!    └──────────────────stop────────────────────────────────┘
//! ```

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::{
    client::ResilientClient, config::ConfigSource, invoker::Attempt, invoker::HttpInvoker,
    AttemptOutcome, Completion, ProbeError, Result,
};

/// Start/stop capability a host drives.
pub trait HostedService: Send + Sync {
    /// Runs the service's startup work. `cancel` aborts it.
    fn start(&self, cancel: &CancellationToken) -> impl Future<Output = Result<()>> + Send;

    /// Signals any in-flight work to unwind; does not wait for it.
    fn stop(&self, cancel: &CancellationToken) -> impl Future<Output = Result<()>> + Send;
}

/// Lifecycle state of a [`ManagedService`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Background service that, on start, resolves a path from configuration and
/// invokes it once through a [`ResilientClient`].
pub struct ManagedService<C, I = HttpInvoker> {
    client: ResilientClient<I>,
    config: C,
    path_key: String,
    state: Mutex<ServiceState>,
    shutdown: CancellationToken,
    span: Span,
}

impl<C, I> fmt::Debug for ManagedService<C, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedService")
            .field("path_key", &self.path_key)
            .field("state", &*self.lock_state())
            .finish_non_exhaustive()
    }
}

impl<C, I> ManagedService<C, I> {
    /// Current lifecycle state.
    pub fn state(&self) -> ServiceState {
        *self.lock_state()
    }

    /// Configuration key the endpoint path is read from.
    pub fn path_key(&self) -> &str {
        &self.path_key
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState> {
        // The guarded value is a plain enum; a poisoned lock still holds a valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter_running(&self) -> Result<()> {
        let mut state = self.lock_state();
        if *state != ServiceState::Created {
            return Err(ProbeError::InvalidState {
                operation: "start",
                state: *state,
            });
        }
        *state = ServiceState::Running;
        Ok(())
    }

    fn enter_stopped(&self) {
        *self.lock_state() = ServiceState::Stopped;
    }
}

impl<C: ConfigSource, I: Attempt> ManagedService<C, I> {
    /// Composes a client and a configuration source; `path_key` names the
    /// configuration entry holding the endpoint path.
    pub fn new(client: ResilientClient<I>, config: C, path_key: impl Into<String>) -> Self {
        let path_key = path_key.into();
        let span = tracing::info_span!("managed_service", path_key = %path_key);
        Self {
            client,
            config,
            path_key,
            state: Mutex::new(ServiceState::Created),
            shutdown: CancellationToken::new(),
            span,
        }
    }

    /// Client used for the startup invocation.
    pub fn client(&self) -> &ResilientClient<I> {
        &self.client
    }

    /// Performs the single startup invocation and reports its terminal outcome.
    ///
    /// Fails only for misconfiguration, a malformed request URL, or a call
    /// outside the `Created` state. Exhausted retries, permanent failures and
    /// cancellation are all `Ok` and distinguishable via
    /// [`Completion::outcome`].
    pub async fn execute(&self, cancel: &CancellationToken) -> Result<Completion> {
        self.enter_running()?;
        let result = self.invoke_configured(cancel).await;
        self.enter_stopped();
        result
    }

    /// Signals cancellation to the in-flight invocation, if any.
    pub fn request_stop(&self) {
        let previous = {
            let mut state = self.lock_state();
            std::mem::replace(&mut *state, ServiceState::Stopped)
        };
        self.shutdown.cancel();
        tracing::info!(parent: &self.span, from = %previous, "stop requested");
    }

    async fn invoke_configured(&self, cancel: &CancellationToken) -> Result<Completion> {
        let Some(path) = self
            .config
            .get(&self.path_key)
            .filter(|value| !value.trim().is_empty())
        else {
            let err = ProbeError::MissingConfig {
                key: self.path_key.clone(),
            };
            tracing::error!(parent: &self.span, error = %err, "endpoint path is not configured");
            return Err(err);
        };

        tracing::info!(parent: &self.span, %path, "invoking endpoint");

        let token = self.shutdown.child_token();
        let invoke = self.client.invoke(&path, &token);
        tokio::pin!(invoke);
        let result = tokio::select! {
            result = &mut invoke => result,
            () = cancel.cancelled() => {
                token.cancel();
                invoke.await
            }
        };

        match result {
            Ok(completion) => {
                self.log_completion(&path, &completion);
                Ok(completion)
            }
            Err(err) => {
                tracing::error!(parent: &self.span, %path, error = %err, "request could not be built");
                Err(err)
            }
        }
    }

    fn log_completion(&self, path: &str, completion: &Completion) {
        let attempts = completion.attempts;
        match &completion.outcome {
            AttemptOutcome::Success { status, .. } => {
                let body = completion.outcome.body_text().unwrap_or_default();
                tracing::info!(parent: &self.span, %path, status, attempts, %body, "endpoint responded");
            }
            AttemptOutcome::Cancelled => {
                tracing::info!(parent: &self.span, %path, attempts, "invocation cancelled");
            }
            AttemptOutcome::PermanentFailure { .. } => {
                tracing::error!(
                    parent: &self.span,
                    %path,
                    attempts,
                    outcome = %completion.outcome,
                    "endpoint rejected request"
                );
            }
            AttemptOutcome::TransientFailure { .. } | AttemptOutcome::NotFound => {
                tracing::error!(
                    parent: &self.span,
                    %path,
                    attempts,
                    outcome = %completion.outcome,
                    "endpoint still failing after retries were exhausted"
                );
            }
        }
    }
}

impl<C: ConfigSource, I: Attempt> HostedService for ManagedService<C, I> {
    async fn start(&self, cancel: &CancellationToken) -> Result<()> {
        self.execute(cancel).await.map(drop)
    }

    async fn stop(&self, _cancel: &CancellationToken) -> Result<()> {
        self.request_stop();
        Ok(())
    }
}
