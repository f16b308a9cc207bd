//! Lifetime policies and the manager objects that enforce them.

use std::any::Any;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::scope;

/// Type-erased shared instance, as handed between compiled factories and
/// lifetime managers.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// Service lifetimes controlling instance caching behavior.
///
/// # Examples
///
/// ```rust
/// use argon_di::{Blueprint, Constructor, Lifetime, Resolver, ServiceRegistry};
/// use std::sync::Arc;
///
/// struct Counter;
///
/// let mut services = ServiceRegistry::new();
/// services.register::<Counter>(
///     Lifetime::PerContainer,
///     Blueprint::new().constructor(Constructor::new().build(|_| Ok(Counter))),
/// );
///
/// let container = services.build();
/// let a = container.get_instance::<Counter>().unwrap();
/// let b = container.get_instance::<Counter>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// New instance per resolution, never cached. Disposable instances are
    /// tracked by the active scope if one is active; otherwise the caller
    /// owns disposal.
    Transient,
    /// Single instance per container, cached after first construction.
    /// Later reads are lock-free.
    PerContainer,
    /// Single instance per active scope. Resolving with no active scope is
    /// an error, not a fallback.
    PerScope,
}

/// Pluggable instance-reuse policy wrapping a compiled factory.
///
/// The three standard lifetimes are built in; a custom policy can be
/// supplied at registration time through
/// [`ServiceRegistry::register_factory_with_manager`](crate::ServiceRegistry::register_factory_with_manager).
/// `create` invokes the service's compiled factory; the manager decides
/// whether to call it or return something it cached earlier. The container
/// is agnostic to the caching strategy.
pub trait LifetimeManager: Send + Sync + 'static {
    /// Return an instance, either cached or freshly created via `create`.
    fn instance(
        &self,
        create: &mut dyn FnMut() -> DiResult<SharedInstance>,
    ) -> DiResult<SharedInstance>;
}

/// Invokes the factory on every request.
pub(crate) struct TransientManager;

impl LifetimeManager for TransientManager {
    fn instance(
        &self,
        create: &mut dyn FnMut() -> DiResult<SharedInstance>,
    ) -> DiResult<SharedInstance> {
        create()
    }
}

/// Caches the first successfully created instance for the container's
/// lifetime. `OnceCell` gives the check-lock-check shape: concurrent first
/// callers race to initialize exactly once, and every later read returns the
/// cached value without taking a lock.
pub(crate) struct PerContainerManager {
    cell: OnceCell<SharedInstance>,
}

impl PerContainerManager {
    pub(crate) fn new() -> Self {
        Self { cell: OnceCell::new() }
    }
}

impl LifetimeManager for PerContainerManager {
    fn instance(
        &self,
        create: &mut dyn FnMut() -> DiResult<SharedInstance>,
    ) -> DiResult<SharedInstance> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        self.cell.get_or_try_init(|| create()).cloned()
    }
}

/// Caches one instance per (service key, active scope) pair. The cache
/// itself lives in the scope, so ending the scope releases the instances.
pub(crate) struct PerScopeManager {
    key: ServiceKey,
}

impl PerScopeManager {
    pub(crate) fn new(key: ServiceKey) -> Self {
        Self { key }
    }
}

impl LifetimeManager for PerScopeManager {
    fn instance(
        &self,
        create: &mut dyn FnMut() -> DiResult<SharedInstance>,
    ) -> DiResult<SharedInstance> {
        let current = scope::current().ok_or(DiError::OutsideScope(self.key))?;
        if let Some(value) = current.cached(&self.key) {
            return Ok(value);
        }
        let value = create()?;
        current.cache(self.key, value.clone());
        Ok(value)
    }
}
