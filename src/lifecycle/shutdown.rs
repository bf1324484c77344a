use super::{ComponentState, Manager, ShutdownContext};
use crate::error::{ComponentFailure, ManagerError};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

impl Manager {
    /// Shut down every component in reverse registration order.
    ///
    /// Components are stopped one at a time and a failing component does not
    /// stop the sequence. If the whole sequence outlives `grace_period` a
    /// [`ManagerError::ShutdownTimeout`] is returned and the remaining work is
    /// left running in the background. Otherwise every failure is reported in
    /// a single [`ManagerError::Shutdown`].
    pub async fn shutdown(
        &self,
        ctx: ShutdownContext,
        grace_period: Duration,
    ) -> Result<(), ManagerError> {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            warn!("Shutdown requested more than once");
            return Err(ManagerError::AlreadyShutdown);
        }

        info!(count = self.components.len(), ?grace_period, "Shutting down components");
        let started_at = Instant::now();

        let components = self.components.clone();
        let states = self.states.clone();
        let driver = tokio::spawn(async move {
            let mut failures = Vec::new();

            for (index, component) in components.iter().enumerate().rev() {
                let name = component.name().to_string();
                info!(component = %name, "Shutting down component");
                states.set(index, &name, ComponentState::Stopping);
                let component_started = Instant::now();

                match component.shutdown(ctx.child()).await {
                    Ok(()) => {
                        states.set(index, &name, ComponentState::Stopped);
                        info!(
                            component = %name,
                            elapsed = ?component_started.elapsed(),
                            "Component shutdown successfully"
                        );
                    }
                    Err(source) => {
                        states.set(index, &name, ComponentState::Failed);
                        error!(
                            component = %name,
                            elapsed = ?component_started.elapsed(),
                            error = %source,
                            "Component failed to shut down"
                        );
                        failures.push(ComponentFailure {
                            component: name,
                            source,
                        });
                    }
                }
            }

            failures
        });

        let failures = match time::timeout(grace_period, driver).await {
            Ok(joined) => joined?,
            Err(_) => {
                error!(
                    period = ?grace_period,
                    "Shutdown did not finish within the grace period"
                );
                return Err(ManagerError::ShutdownTimeout {
                    period: grace_period,
                });
            }
        };

        info!(elapsed = ?started_at.elapsed(), "Shutdown finished");

        if !failures.is_empty() {
            return Err(ManagerError::Shutdown { errors: failures });
        }

        info!("Shutdown completed successfully");
        Ok(())
    }
}
