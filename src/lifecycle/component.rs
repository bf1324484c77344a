use super::ShutdownContext;
use crate::error::BoxError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::oneshot;

/// A long-lived subsystem managed by the [`Manager`](super::Manager)
#[async_trait]
pub trait Component: Send + Sync {
    /// Identifier used for logging and error attribution
    fn name(&self) -> &str;

    /// Run the component.
    ///
    /// `ready` must be signalled once the setup dependents rely on is done
    /// (e.g. a socket is bound). The call may then keep running for the whole
    /// lifetime of the component; an error returned after readiness is
    /// reported as an asynchronous failure.
    async fn start(&self, ready: ReadySignal) -> Result<(), BoxError>;

    /// Release all resources and make a blocked `start` return, honoring
    /// the context deadline on a best-effort basis.
    async fn shutdown(&self, ctx: ShutdownContext) -> Result<(), BoxError>;

    /// Maximum time to wait for the ready signal
    fn start_timeout(&self) -> Duration;
}

/// Single-use notification that a component finished initializing.
///
/// Dropping it without calling [`signal`](Self::signal) tells the manager the
/// start routine gave up before becoming ready.
#[derive(Debug)]
pub struct ReadySignal {
    sender: oneshot::Sender<()>,
}

impl ReadySignal {
    /// Create a signal together with the receiver that observes it
    pub fn pair() -> (Self, oneshot::Receiver<()>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Mark the component as ready
    pub fn signal(self) {
        // Receiver is gone once the start timeout has fired
        let _ = self.sender.send(());
    }
}
