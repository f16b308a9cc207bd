//! Container: the resolution surface over a frozen registry.
//!
//! [`ServiceRegistry`] collects registrations; [`build`](ServiceRegistry::build)
//! freezes them into a [`ServiceContainer`], after which resolution is the
//! only operation. Separating the phases makes the open question of
//! registration-after-caching unrepresentable: there is no way to mutate
//! the registry once any factory may have been compiled.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::blueprint::{ErasedBlueprint, GenericService};
use crate::compiler::{self, FactoryCache};
use crate::deferred::Deferred;
use crate::error::{DiError, DiResult};
use crate::internal::{run_reverse, Disposer};
use crate::key::ServiceKey;
use crate::lifetime::SharedInstance;
use crate::options::ContainerOptions;
use crate::registration::Registry;
use crate::scope::{self, Scope};
use crate::traits::{Dispose, Resolver, ResolverCore};

mod registry;
pub use registry::ServiceRegistry;

pub(crate) struct ContainerCore {
    pub(crate) registry: Registry,
    pub(crate) options: ContainerOptions,
    pub(crate) factories: FactoryCache,
    pub(crate) root_disposers: Mutex<Vec<Disposer>>,
    synthesized: RwLock<HashMap<TypeId, Arc<ErasedBlueprint>>>,
    pub(crate) self_weak: Weak<ContainerCore>,
}

impl ContainerCore {
    /// A key counts as registered once it is in the registry or already
    /// has a compiled factory (synthesized closed generics have only the
    /// latter).
    pub(crate) fn is_registered(&self, key: ServiceKey) -> bool {
        self.factories.contains(&key) || self.registry.contains(&key)
    }

    pub(crate) fn resolve(&self, key: ServiceKey) -> DiResult<SharedInstance> {
        let compiled = compiler::get_or_compile(self, key)?;
        compiled.resolve(self)
    }

    pub(crate) fn record_synthesized(&self, blueprint: &Arc<ErasedBlueprint>) {
        self.synthesized
            .write()
            .entry(blueprint.impl_id)
            .or_insert_with(|| blueprint.clone());
    }

    fn blueprint_for(&self, impl_id: TypeId) -> Option<Arc<ErasedBlueprint>> {
        self.registry
            .blueprint_for(impl_id)
            .or_else(|| self.synthesized.read().get(&impl_id).cloned())
    }
}

/// The built container: resolves services, opens scopes, injects
/// properties, and disposes container-lifetime instances.
///
/// Cloning is cheap (`Arc` internally) and clones share all caches.
/// Resolution is thread-safe; scopes are per-thread.
///
/// # Examples
///
/// ```rust
/// use argon_di::{Lifetime, Resolver, ServiceRegistry};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let mut services = ServiceRegistry::new();
/// services.register_factory(Lifetime::PerContainer, |_| Greeter {
///     greeting: "hello".to_string(),
/// });
///
/// let container = services.build();
/// let greeter = container.get_instance::<Greeter>().unwrap();
/// assert_eq!(greeter.greeting, "hello");
/// ```
pub struct ServiceContainer {
    core: Arc<ContainerCore>,
}

impl ServiceContainer {
    pub(crate) fn from_parts(registry: Registry, options: ContainerOptions) -> Self {
        let core = Arc::new_cyclic(|weak| ContainerCore {
            registry,
            options,
            factories: FactoryCache::new(),
            root_disposers: Mutex::new(Vec::new()),
            synthesized: RwLock::new(HashMap::new()),
            self_weak: weak.clone(),
        });
        Self { core }
    }

    /// Begin a scope on the calling thread. Scopes nest; the returned
    /// guard ends the scope (and disposes everything it tracked, in
    /// reverse creation order) when dropped or explicitly
    /// [`end`](Scope::end)ed.
    pub fn begin_scope(&self) -> Scope {
        Scope::begin()
    }

    /// Resolve a closed instantiation of an open generic family,
    /// synthesizing and caching its registration on first use. Afterwards
    /// the closed key also resolves through plain
    /// [`get_instance`](Resolver::get_instance).
    pub fn get_generic<T: GenericService>(&self) -> DiResult<Arc<T>> {
        compiler::ensure_generic::<T>(&self.core)?;
        self.get_instance::<T>()
    }

    /// Apply property injection to an externally-owned instance, using the
    /// property slots declared for `T`. Unresolvable properties are
    /// skipped, never fatal. Without a declared schema for `T` this is a
    /// no-op.
    pub fn inject_properties<T: Send + Sync + 'static>(&self, target: &mut T) -> DiResult<()> {
        let Some(blueprint) = self.core.blueprint_for(TypeId::of::<T>()) else {
            return Ok(());
        };
        for (index, slot) in blueprint.properties.iter().enumerate() {
            let value = match &slot.deferred {
                Some(make) => make(&self.core.self_weak),
                None => {
                    if !self.core.is_registered(slot.key) {
                        continue;
                    }
                    self.core.resolve(slot.key)?
                }
            };
            (blueprint.apply_properties)(target, &[(index, value)])?;
        }
        Ok(())
    }

    /// Dispose every container-lifetime instance tracked so far, in
    /// reverse creation order. Failures do not stop the sweep and are
    /// aggregated into [`DiError::Disposal`].
    pub fn dispose(&self) -> DiResult<()> {
        let disposers: Vec<Disposer> = {
            let mut bag = self.core.root_disposers.lock();
            bag.drain(..).collect()
        };
        let failures = run_reverse(disposers);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Disposal(failures))
        }
    }
}

impl Clone for ServiceContainer {
    fn clone(&self) -> Self {
        Self { core: self.core.clone() }
    }
}

impl Drop for ServiceContainer {
    fn drop(&mut self) {
        if Arc::strong_count(&self.core) == 1 {
            let bag = self.core.root_disposers.lock();
            if !bag.is_empty() {
                warn!(
                    pending = bag.len(),
                    "container dropped with undisposed instances; call dispose() first"
                );
            }
        }
    }
}

impl ResolverCore for ServiceContainer {
    fn resolve_key(&self, key: ServiceKey) -> DiResult<SharedInstance> {
        self.core.resolve(key)
    }
}

impl Resolver for ServiceContainer {}

/// Live resolver handed to factory closures while an instance is being
/// created.
///
/// Besides plain resolution (via [`Resolver`]), it can mint
/// [`Deferred`] handles and register disposables created by the factory.
pub struct InjectionContext<'a> {
    core: &'a ContainerCore,
}

impl<'a> InjectionContext<'a> {
    pub(crate) fn new(core: &'a ContainerCore) -> Self {
        Self { core }
    }

    /// A deferred factory handle for `T`, resolving against this
    /// container on demand.
    pub fn deferred<T: Send + Sync + 'static>(&self) -> Deferred<T> {
        Deferred::new(self.core.self_weak.clone(), ServiceKey::of::<T>())
    }

    /// Resolve a closed generic instantiation, synthesizing its
    /// registration from the family's open template on first use.
    pub fn get_generic<T: GenericService>(&self) -> DiResult<Arc<T>> {
        compiler::ensure_generic::<T>(self.core)?;
        self.get_instance::<T>()
    }

    /// Register an instance built by this factory for disposal: with the
    /// active scope if one is active, otherwise with the container.
    pub fn track_disposable<T: Dispose>(&self, instance: Arc<T>) {
        let disposer = Disposer::new(std::any::type_name::<T>(), move || instance.dispose());
        if let Err(disposer) = scope::track_current(disposer) {
            self.core.root_disposers.lock().push(disposer);
        }
    }
}

impl ResolverCore for InjectionContext<'_> {
    fn resolve_key(&self, key: ServiceKey) -> DiResult<SharedInstance> {
        self.core.resolve(key)
    }
}

impl Resolver for InjectionContext<'_> {}
