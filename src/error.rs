//! Error types for the dependency injection container.

use std::fmt;

use crate::key::ServiceKey;

/// A failure reported by a [`Dispose`](crate::Dispose) implementation.
#[derive(Debug, Clone)]
pub struct DisposeError(pub String);

impl DisposeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for DisposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DisposeError {}

impl From<String> for DisposeError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for DisposeError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// One instance that failed to release during a disposal sweep.
#[derive(Debug, Clone)]
pub struct DisposalFailure {
    /// Type name of the instance that failed to dispose.
    pub service: &'static str,
    /// The underlying failure.
    pub error: DisposeError,
}

/// Dependency injection errors.
///
/// All variants are raised synchronously to the immediate caller of the
/// resolution or scope-exit operation that triggered them; none are retried.
///
/// # Examples
///
/// ```rust
/// use argon_di::{DiError, Resolver, ServiceRegistry};
///
/// let container = ServiceRegistry::new().build();
/// match container.get_instance::<String>() {
///     Err(DiError::UnableToResolve(key)) => {
///         assert_eq!(key.display_name(), "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// The requested top-level service has no registration.
    UnableToResolve(ServiceKey),
    /// A mandatory constructor dependency has no registration and no
    /// declared default value.
    UnresolvedDependency {
        /// Type being constructed.
        target: &'static str,
        /// Declared name of the unsatisfied constructor parameter.
        parameter: &'static str,
        /// The dependency key that could not be satisfied.
        requested: ServiceKey,
    },
    /// A cycle was detected while planning; carries the full key path with
    /// the repeated key at both ends.
    Recursive(Vec<ServiceKey>),
    /// A per-scope service was requested with no active scope.
    OutsideScope(ServiceKey),
    /// A disposable instance was created outside any scope while strict
    /// disposal tracking is enabled.
    DisposableOutsideScope(&'static str),
    /// A cached instance did not downcast to the requested type.
    TypeMismatch(&'static str),
    /// One or more instances failed to release during a disposal sweep.
    /// Every failure is attempted and aggregated; none are dropped.
    Disposal(Vec<DisposalFailure>),
    /// A deferred dependency outlived its container.
    ContainerReleased(ServiceKey),
    /// The resolution chain exceeded the maximum depth.
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::UnableToResolve(key) => {
                write!(
                    f,
                    "unable to resolve type: {}, service name: {}",
                    key.display_name(),
                    key.service_name().unwrap_or("")
                )
            }
            DiError::UnresolvedDependency { target, parameter, requested } => {
                write!(
                    f,
                    "unresolved dependency [target type: {}], [parameter: {}({})], [requested dependency: {}]",
                    target,
                    parameter,
                    requested.display_name(),
                    requested
                )
            }
            DiError::Recursive(path) => {
                write!(f, "recursive dependency detected: ")?;
                for (i, key) in path.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    f.write_str(key.display_name())?;
                }
                Ok(())
            }
            DiError::OutsideScope(key) => {
                write!(f, "attempt to create a per-scope instance of {} without an active scope", key)
            }
            DiError::DisposableOutsideScope(name) => {
                write!(f, "the disposable instance ({}) was created outside a scope", name)
            }
            DiError::TypeMismatch(name) => write!(f, "type mismatch for: {}", name),
            DiError::Disposal(failures) => {
                write!(f, "disposal failed for {} instance(s):", failures.len())?;
                for failure in failures {
                    write!(f, " [{}: {}]", failure.service, failure.error)?;
                }
                Ok(())
            }
            DiError::ContainerReleased(key) => {
                write!(f, "deferred resolution of {} after the container was released", key)
            }
            DiError::DepthExceeded(depth) => write!(f, "max resolution depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
