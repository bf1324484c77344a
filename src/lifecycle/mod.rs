//! Ordered startup and reverse-order shutdown of registered components.
//!
//! ```text
//! register(C1..Cn) → start() → [C1 ready] → [C2 ready] → ... → error channel
//! shutdown(ctx, grace) → Cn.shutdown → ... → C1.shutdown   (raced against grace)
//! ```

mod component;
mod context;
mod manager;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use component::{Component, ReadySignal};
pub use context::ShutdownContext;
pub use manager::Manager;
pub use runtime::shutdown_signal;
pub use startup::ErrorReceiver;
pub use types::{ComponentState, ShutdownReason};
