use super::{ErrorReceiver, Manager, ShutdownContext, ShutdownReason};
use crate::error::ManagerError;
use std::future::Future;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, error, info};

impl Manager {
    /// Wait for a termination signal or a component failure, then shut down.
    ///
    /// Returns the process exit code.
    pub async fn run(
        &self,
        errors: ErrorReceiver,
        grace_period: Duration,
    ) -> Result<i32, ManagerError> {
        self.run_until(errors, shutdown_signal(), grace_period).await
    }

    /// Like [`run`](Self::run) with a caller supplied shutdown trigger
    pub async fn run_until<F>(
        &self,
        mut errors: ErrorReceiver,
        trigger: F,
        grace_period: Duration,
    ) -> Result<i32, ManagerError>
    where
        F: Future<Output = ShutdownReason>,
    {
        info!(count = self.components.len(), "Components running");
        tokio::pin!(trigger);
        let mut channel_open = true;

        let reason = loop {
            tokio::select! {
                received = errors.recv(), if channel_open => match received {
                    Some(failure) => {
                        error!(
                            error = %failure,
                            timeout = failure.is_timeout(),
                            "Component failure, shutting down"
                        );
                        break ShutdownReason::ComponentFailure(failure.to_string());
                    }
                    None => {
                        debug!("Every component start routine has returned");
                        channel_open = false;
                    }
                },
                reason = &mut trigger => break reason,
            }
        };

        info!(?reason, "Shutdown initiated");

        let mut exit_code = match reason {
            ShutdownReason::ComponentFailure(_) => 1,
            ShutdownReason::Signal(_) => 0,
        };

        match self
            .shutdown(ShutdownContext::with_timeout(grace_period), grace_period)
            .await
        {
            Ok(()) => {}
            Err(ManagerError::AlreadyShutdown) => return Err(ManagerError::AlreadyShutdown),
            Err(err) => {
                error!(error = %err, timeout = err.is_timeout(), "Shutdown failed");
                exit_code = 1;
            }
        }

        info!(exit_code, "Component manager exited");
        Ok(exit_code)
    }
}

/// Resolves on SIGINT, or SIGTERM/SIGQUIT on unix
pub async fn shutdown_signal() -> ShutdownReason {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => ShutdownReason::Signal("SIGINT".to_string()),
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = unix_signal(signal::unix::SignalKind::terminate(), "SIGTERM");
    #[cfg(unix)]
    let quit = unix_signal(signal::unix::SignalKind::quit(), "SIGQUIT");

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownReason>();
    #[cfg(not(unix))]
    let quit = std::future::pending::<ShutdownReason>();

    let reason = tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
        reason = quit => reason,
    };

    info!(?reason, "Received termination signal");
    reason
}

#[cfg(unix)]
async fn unix_signal(kind: signal::unix::SignalKind, label: &'static str) -> ShutdownReason {
    match signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            ShutdownReason::Signal(label.to_string())
        }
        Err(e) => {
            error!("Failed to register {} handler: {}", label, e);
            std::future::pending().await
        }
    }
}
