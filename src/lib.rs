pub mod config;
pub mod error;
pub mod lifecycle;

#[cfg(feature = "http")]
pub mod server;

pub use config::{AppConfig, ManagerConfig, ServerConfig};
pub use error::{AppError, BoxError, ComponentFailure, ManagerError, Result};
pub use lifecycle::{
    shutdown_signal, Component, ComponentState, ErrorReceiver, Manager, ReadySignal,
    ShutdownContext, ShutdownReason,
};

#[cfg(feature = "http")]
pub use server::{HttpServer, HttpServerBuilder};
