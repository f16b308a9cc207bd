//! Container configuration consumed at build time.

/// How the container treats disposable instances created while no scope is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalTracking {
    /// Untracked disposables are allowed; the caller owns their disposal.
    Lenient,
    /// Creating a tracked disposable outside a scope fails with
    /// [`DiError::DisposableOutsideScope`](crate::DiError::DisposableOutsideScope).
    Strict,
}

/// Options applied to a container when the registry is built.
///
/// # Examples
///
/// ```rust
/// use argon_di::{ContainerOptions, ServiceRegistry};
///
/// let options = ContainerOptions {
///     enable_property_injection: false,
///     ..ContainerOptions::default()
/// };
/// let _container = ServiceRegistry::with_options(options).build();
/// ```
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    /// When disabled, the planner skips property-dependency discovery
    /// entirely; constructor injection is unaffected.
    pub enable_property_injection: bool,
    /// Policy for disposables created outside any scope.
    pub disposal_tracking: DisposalTracking,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            enable_property_injection: true,
            disposal_tracking: DisposalTracking::Lenient,
        }
    }
}
