//! Deferred (factory-of-T) dependencies.

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::ContainerCore;
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::traits::downcast_concrete;

/// A zero-argument factory for a service, satisfied without eagerly
/// resolving it.
///
/// A constructor or property slot declared with
/// [`Constructor::deferred_param`](crate::Constructor::deferred_param) or
/// [`Blueprint::deferred_property`](crate::Blueprint::deferred_property)
/// receives a `Deferred<T>` instead of an instance; the actual resolution
/// happens on [`resolve`](Deferred::resolve), against the originating
/// container. Because nothing is resolved until then, a deferred slot also
/// breaks dependency cycles that would otherwise be rejected at plan time.
///
/// The handle holds the container weakly; resolving after the container has
/// been released fails with [`DiError::ContainerReleased`].
pub struct Deferred<T: Send + Sync + 'static> {
    core: Weak<ContainerCore>,
    key: ServiceKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Deferred<T> {
    pub(crate) fn new(core: Weak<ContainerCore>, key: ServiceKey) -> Self {
        Self { core, key, _marker: PhantomData }
    }

    /// Resolve the service now, honoring its registered lifetime policy.
    pub fn resolve(&self) -> DiResult<Arc<T>> {
        let core = self.core.upgrade().ok_or(DiError::ContainerReleased(self.key))?;
        downcast_concrete(core.resolve(self.key)?)
    }

    /// The key this handle resolves.
    pub fn key(&self) -> ServiceKey {
        self.key
    }
}

impl<T: Send + Sync + 'static> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self { core: self.core.clone(), key: self.key, _marker: PhantomData }
    }
}
