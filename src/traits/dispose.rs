//! Disposal trait for resource cleanup.

use crate::error::DisposeError;

/// Trait for services that need structured teardown (flushing caches,
/// closing connections).
///
/// Tracked disposables are released deterministically when their owning
/// scope ends, or when [`ServiceContainer::dispose`](crate::ServiceContainer::dispose)
/// runs for container-lifetime instances, always in reverse creation
/// order. A failure from one instance does not stop the sweep; all failures
/// are aggregated into a single
/// [`DiError::Disposal`](crate::DiError::Disposal).
///
/// # Examples
///
/// ```rust
/// use argon_di::{Dispose, DisposeError};
///
/// struct Connection {
///     id: u32,
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) -> Result<(), DisposeError> {
///         // close the connection...
///         Ok(())
///     }
/// }
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Release held resources.
    fn dispose(&self) -> Result<(), DisposeError>;
}
