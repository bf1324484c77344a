use super::state::StateTable;
use super::{Component, ComponentState, Manager, ReadySignal};
use crate::error::ManagerError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

/// Channel carrying start failures, including ones that happen long after
/// `start` returned. Callers should keep draining it for the process lifetime.
pub type ErrorReceiver = mpsc::Receiver<ManagerError>;

impl Manager {
    /// Start every component in registration order.
    ///
    /// Each component's `start` runs on its own task and the next component is
    /// not started until the previous one is ready. The first timeout or start
    /// error is published on the returned channel and stops the sequence;
    /// components already launched keep running.
    pub async fn start(&self) -> ErrorReceiver {
        self.started.store(true, Ordering::SeqCst);

        let count = self.components.len();
        info!(count, "Starting components");

        // Every start task publishes at most once, plus one manager verdict
        let (errors, mut receiver) = mpsc::channel(count + 1);
        let started_at = Instant::now();

        for (index, component) in self.components.iter().enumerate() {
            let name = component.name().to_string();
            let timeout = component.start_timeout();
            info!(component = %name, ?timeout, "Starting component");
            self.states.set(index, &name, ComponentState::Starting);

            let (ready, ready_receiver) = ReadySignal::pair();
            let task = spawn_start(
                index,
                Arc::clone(component),
                ready,
                errors.clone(),
                self.states.clone(),
            );
            let component_started = Instant::now();

            match time::timeout(timeout, ready_receiver).await {
                Ok(Ok(())) => {
                    debug!(
                        component = %name,
                        elapsed = ?component_started.elapsed(),
                        "Component initialization completed"
                    );
                }
                Ok(Err(_)) => {
                    // Ready signal dropped; the start routine may still be running
                    let remaining = timeout.saturating_sub(component_started.elapsed());
                    if time::timeout(remaining, task).await.is_err() {
                        error!(
                            component = %name,
                            ?timeout,
                            "Component dropped its ready signal and did not return"
                        );
                        self.states.set(index, &name, ComponentState::Failed);
                        publish(
                            &errors,
                            ManagerError::StartTimeout {
                                component: name,
                                timeout,
                            },
                        );
                        return receiver;
                    }

                    let failure = receiver.try_recv().unwrap_or_else(|_| {
                        ManagerError::start(
                            name.clone(),
                            "start returned before signalling readiness".into(),
                        )
                    });
                    error!(
                        component = %name,
                        elapsed = ?component_started.elapsed(),
                        error = %failure,
                        "Component failed to start"
                    );
                    self.states.set(index, &name, ComponentState::Failed);
                    publish(&errors, failure);
                    return receiver;
                }
                Err(_) => {
                    error!(
                        component = %name,
                        ?timeout,
                        "Component start timed out"
                    );
                    self.states.set(index, &name, ComponentState::Failed);
                    publish(
                        &errors,
                        ManagerError::StartTimeout {
                            component: name,
                            timeout,
                        },
                    );
                    return receiver;
                }
            }

            // A start routine may already have failed right after signalling
            if let Ok(failure) = receiver.try_recv() {
                error!(
                    component = %name,
                    error = %failure,
                    "Component failed during startup"
                );
                publish(&errors, failure);
                return receiver;
            }

            self.states
                .transition(index, &name, ComponentState::Starting, ComponentState::Running);
            info!(
                component = %name,
                elapsed = ?component_started.elapsed(),
                "Component started successfully"
            );
        }

        info!(count, elapsed = ?started_at.elapsed(), "All components started");
        receiver
    }
}

/// Run a component's start routine, forwarding its failure or panic to the channel
fn spawn_start(
    index: usize,
    component: Arc<dyn Component>,
    ready: ReadySignal,
    errors: mpsc::Sender<ManagerError>,
    states: StateTable,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = component.name().to_string();

        // Inner task so a panicking start routine still reports through the channel
        let routine = tokio::spawn(async move { component.start(ready).await });
        let outcome = match routine.await {
            Ok(result) => result,
            Err(join_error) => Err(format!("start routine panicked: {}", join_error).into()),
        };

        match outcome {
            Ok(()) => {
                debug!(component = %name, "Component start routine returned");
                states.set(index, &name, ComponentState::Stopped);
            }
            Err(source) => {
                error!(component = %name, error = %source, "Component start routine failed");
                states.set(index, &name, ComponentState::Failed);
                if errors.send(ManagerError::start(name, source)).await.is_err() {
                    debug!("Error receiver dropped, start failure discarded");
                }
            }
        }
    })
}

fn publish(errors: &mpsc::Sender<ManagerError>, failure: ManagerError) {
    if let Err(err) = errors.try_send(failure) {
        warn!(error = %err, "Unable to publish start failure");
    }
}
