use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{service::HostedService, Result};

/// Runs `service` until `shutdown` resolves.
///
/// `start` is called once. If it fails, the error is returned right away and
/// the host does not wait for the shutdown signal. If it completes, the host
/// keeps waiting for shutdown, whatever the outcome of the service's work.
/// On shutdown the host cancels a still-running start, calls `stop`, then
/// waits for start to unwind.
pub async fn run_until<S, F>(service: &S, shutdown: F) -> Result<()>
where
    S: HostedService,
    F: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let start = service.start(&cancel);
    tokio::pin!(start);
    tokio::pin!(shutdown);

    tokio::select! {
        result = &mut start => {
            result?;
            tracing::info!("service started; waiting for shutdown signal");
            shutdown.await;
            tracing::info!("shutdown signal received");
            service.stop(&cancel).await
        }
        () = &mut shutdown => {
            tracing::info!("shutdown signal received during startup");
            cancel.cancel();
            service.stop(&cancel).await?;
            start.await
        }
    }
}

/// Resolves on Ctrl-C, or on SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
