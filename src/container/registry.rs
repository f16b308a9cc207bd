//! Registration surface.
//!
//! Thin, mechanical writes into the registry; the interesting behavior
//! lives in the planner and compiler. `build()` freezes the registry, so
//! every registration happens strictly before the first resolution.

use std::sync::Arc;

use crate::blueprint::{finish_concrete, finish_trait, Blueprint};
use crate::container::{InjectionContext, ServiceContainer};
use crate::key::ServiceKey;
use crate::lifetime::{Lifetime, LifetimeManager, SharedInstance};
use crate::options::ContainerOptions;
use crate::registration::{
    ErasedFactory, LifetimeBinding, Registry, ServiceRegistration, ServiceSource,
};

/// Mutable collection of service registrations.
///
/// Re-registering a key replaces the prior registration. Call
/// [`build`](ServiceRegistry::build) to freeze the collection into a
/// [`ServiceContainer`].
///
/// # Examples
///
/// ```rust
/// use argon_di::{Blueprint, Constructor, Lifetime, Resolver, ServiceRegistry};
/// use std::sync::Arc;
///
/// trait Bus: Send + Sync {
///     fn publish(&self, event: &str);
/// }
///
/// struct LocalBus;
/// impl Bus for LocalBus {
///     fn publish(&self, _event: &str) {}
/// }
///
/// let mut services = ServiceRegistry::new();
/// services.register_trait::<dyn Bus, _, _>(
///     Lifetime::PerContainer,
///     Blueprint::new().constructor(Constructor::new().build(|_| Ok(LocalBus))),
///     |bus| bus as Arc<dyn Bus>,
/// );
///
/// let container = services.build();
/// let bus = container.get_trait_instance::<dyn Bus>().unwrap();
/// bus.publish("ready");
/// ```
pub struct ServiceRegistry {
    registry: Registry,
    options: ContainerOptions,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self { registry: Registry::new(), options }
    }

    fn insert(&mut self, key: ServiceKey, lifetime: LifetimeBinding, source: ServiceSource) {
        self.registry.insert(key, ServiceRegistration { lifetime, source });
    }

    // ----- Pre-built instances -----

    /// Register a pre-built instance; every resolution returns it.
    pub fn register_instance<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.insert(
            ServiceKey::of::<T>(),
            LifetimeBinding::Standard(Lifetime::PerContainer),
            ServiceSource::Instance(Arc::new(value) as SharedInstance),
        );
        self
    }

    /// Register a pre-built instance under a service name.
    pub fn register_named_instance<T: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        value: T,
    ) -> &mut Self {
        self.insert(
            ServiceKey::named::<T>(name),
            LifetimeBinding::Standard(Lifetime::PerContainer),
            ServiceSource::Instance(Arc::new(value) as SharedInstance),
        );
        self
    }

    /// Register a pre-built trait object.
    pub fn register_trait_instance<S: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<S>,
    ) -> &mut Self {
        self.insert(
            ServiceKey::of::<S>(),
            LifetimeBinding::Standard(Lifetime::PerContainer),
            ServiceSource::Instance(Arc::new(value) as SharedInstance),
        );
        self
    }

    /// Register a pre-built trait object under a service name.
    pub fn register_named_trait_instance<S: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        value: Arc<S>,
    ) -> &mut Self {
        self.insert(
            ServiceKey::named::<S>(name),
            LifetimeBinding::Standard(Lifetime::PerContainer),
            ServiceSource::Instance(Arc::new(value) as SharedInstance),
        );
        self
    }

    // ----- Factory closures -----

    /// Register a factory closure for a concrete type.
    pub fn register_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as SharedInstance));
        self.insert(
            ServiceKey::of::<T>(),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Factory(erased),
        );
        self
    }

    /// Register a factory closure under a service name.
    pub fn register_named_factory<T, F>(
        &mut self,
        name: &'static str,
        lifetime: Lifetime,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as SharedInstance));
        self.insert(
            ServiceKey::named::<T>(name),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Factory(erased),
        );
        self
    }

    /// Register a factory producing a trait object.
    pub fn register_trait_factory<S, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&InjectionContext<'a>) -> Arc<S> + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as SharedInstance));
        self.insert(
            ServiceKey::of::<S>(),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Factory(erased),
        );
        self
    }

    /// Register a factory producing a trait object under a service name.
    pub fn register_named_trait_factory<S, F>(
        &mut self,
        name: &'static str,
        lifetime: Lifetime,
        factory: F,
    ) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&InjectionContext<'a>) -> Arc<S> + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as SharedInstance));
        self.insert(
            ServiceKey::named::<S>(name),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Factory(erased),
        );
        self
    }

    /// Register a factory governed by a custom lifetime policy.
    pub fn register_factory_with_manager<T, F>(
        &mut self,
        manager: Arc<dyn LifetimeManager>,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&InjectionContext<'a>) -> T + Send + Sync + 'static,
    {
        let erased: ErasedFactory =
            Arc::new(move |ctx| Ok(Arc::new(factory(ctx)) as SharedInstance));
        self.insert(
            ServiceKey::of::<T>(),
            LifetimeBinding::Custom(manager),
            ServiceSource::Factory(erased),
        );
        self
    }

    // ----- Declared schemas -----

    /// Register a concrete type through its declared schema.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        lifetime: Lifetime,
        blueprint: Blueprint<T>,
    ) -> &mut Self {
        let erased = Arc::new(blueprint.erase(finish_concrete::<T>()));
        self.registry.record_blueprint(erased.clone());
        self.insert(
            ServiceKey::of::<T>(),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Blueprint(erased),
        );
        self
    }

    /// Register a concrete type through its declared schema, under a
    /// service name.
    pub fn register_named<T: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        lifetime: Lifetime,
        blueprint: Blueprint<T>,
    ) -> &mut Self {
        let erased = Arc::new(blueprint.erase(finish_concrete::<T>()));
        self.registry.record_blueprint(erased.clone());
        self.insert(
            ServiceKey::named::<T>(name),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Blueprint(erased),
        );
        self
    }

    /// Register a trait-keyed service backed by the declared schema of its
    /// implementation type. `coerce` performs the unsized coercion,
    /// typically `|imp| imp as Arc<dyn Trait>`.
    pub fn register_trait<S, T, F>(
        &mut self,
        lifetime: Lifetime,
        blueprint: Blueprint<T>,
        coerce: F,
    ) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        let erased = Arc::new(blueprint.erase(finish_trait::<S, T, F>(coerce)));
        self.registry.record_blueprint(erased.clone());
        self.insert(
            ServiceKey::of::<S>(),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Blueprint(erased),
        );
        self
    }

    /// Register a trait-keyed service under a service name.
    pub fn register_named_trait<S, T, F>(
        &mut self,
        name: &'static str,
        lifetime: Lifetime,
        blueprint: Blueprint<T>,
        coerce: F,
    ) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
    {
        let erased = Arc::new(blueprint.erase(finish_trait::<S, T, F>(coerce)));
        self.registry.record_blueprint(erased.clone());
        self.insert(
            ServiceKey::named::<S>(name),
            LifetimeBinding::Standard(lifetime),
            ServiceSource::Blueprint(erased),
        );
        self
    }

    // ----- Open generics -----

    /// Register an open generic template. Closed instantiations of the
    /// family (types implementing
    /// [`GenericService`](crate::GenericService) with this family token)
    /// are synthesized and cached on first request with the given
    /// lifetime.
    pub fn register_open_generic(
        &mut self,
        family: &'static str,
        lifetime: Lifetime,
    ) -> &mut Self {
        self.registry.insert_open(family, lifetime);
        self
    }

    /// Freeze the registrations into a container.
    pub fn build(self) -> ServiceContainer {
        let mut registry = self.registry;
        registry.finalize();
        ServiceContainer::from_parts(registry, self.options)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
