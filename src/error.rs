use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error type returned by component lifecycle hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures published or returned by the [`Manager`](crate::lifecycle::Manager)
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("component {component} timed out after {timeout:?} waiting for readiness")]
    StartTimeout { component: String, timeout: Duration },

    #[error("failed to start component {component}: {source}")]
    Start {
        component: String,
        #[source]
        source: BoxError,
    },

    #[error("shutdown timed out after {period:?}")]
    ShutdownTimeout { period: Duration },

    #[error("{} component(s) failed to shut down: {}", .errors.len(), FailureList(.errors))]
    Shutdown { errors: Vec<ComponentFailure> },

    #[error("components cannot be registered after start")]
    AlreadyStarted,

    #[error("shutdown has already been requested")]
    AlreadyShutdown,

    #[error("shutdown task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ManagerError {
    pub fn start<S: Into<String>>(component: S, source: BoxError) -> Self {
        Self::Start {
            component: component.into(),
            source,
        }
    }

    /// Timeouts usually mean a hang rather than a clean failure
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::StartTimeout { .. } | Self::ShutdownTimeout { .. }
        )
    }

    /// Name of the component the failure is attributed to, if any
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::StartTimeout { component, .. } | Self::Start { component, .. } => {
                Some(component)
            }
            _ => None,
        }
    }
}

/// A single component's shutdown failure
#[derive(Error, Debug)]
#[error("failed to shutdown component {component}: {source}")]
pub struct ComponentFailure {
    pub component: String,
    #[source]
    pub source: BoxError,
}

struct FailureList<'a>(&'a [ComponentFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Errors from the hosting application around the manager
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] ManagerError),

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl AppError {
    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let start = ManagerError::StartTimeout {
            component: "grpc-server".to_string(),
            timeout: Duration::from_millis(3),
        };
        let shutdown = ManagerError::ShutdownTimeout {
            period: Duration::from_secs(1),
        };
        let failed = ManagerError::start("grpc-server", "boom".into());

        assert!(start.is_timeout());
        assert!(shutdown.is_timeout());
        assert!(!failed.is_timeout());
        assert_eq!(start.component(), Some("grpc-server"));
        assert_eq!(shutdown.component(), None);
    }

    #[test]
    fn test_start_error_keeps_source() {
        let err = ManagerError::start("kafka-consumer", "broker unreachable".into());

        assert_eq!(
            err.to_string(),
            "failed to start component kafka-consumer: broker unreachable"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("broker unreachable"));
    }

    #[test]
    fn test_shutdown_error_lists_every_failure() {
        let err = ManagerError::Shutdown {
            errors: vec![
                ComponentFailure {
                    component: "b".to_string(),
                    source: "flush failed".into(),
                },
                ComponentFailure {
                    component: "a".to_string(),
                    source: "socket busy".into(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 component(s) failed to shut down: failed to shutdown component b: flush failed; \
             failed to shutdown component a: socket busy"
        );
    }

    #[test]
    fn test_manager_error_converts_into_app_error() {
        fn register() -> std::result::Result<(), ManagerError> {
            Err(ManagerError::AlreadyStarted)
        }
        fn build() -> Result<()> {
            register()?;
            Ok(())
        }

        let err = build().unwrap_err();
        assert!(matches!(
            err,
            AppError::Lifecycle(ManagerError::AlreadyStarted)
        ));
        assert_eq!(
            err.to_string(),
            "Lifecycle error: components cannot be registered after start"
        );
    }
}
