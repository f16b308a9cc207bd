//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::lifetime::SharedInstance;

pub(crate) fn downcast_concrete<T: Send + Sync + 'static>(
    any: SharedInstance,
) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait-bound services are stored as `Arc<Arc<S>>` so the outer `Arc` has a
// sized, downcastable payload.
pub(crate) fn downcast_shared<S: ?Sized + Send + Sync + 'static>(
    any: SharedInstance,
) -> DiResult<Arc<S>> {
    any.downcast::<Arc<S>>()
        .map(|shared| (*shared).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<S>()))
}

/// Object-safe core of service resolution: everything resolves through one
/// key-driven entry point.
pub trait ResolverCore {
    /// Resolve the registration behind `key`, honoring its lifetime policy.
    fn resolve_key(&self, key: ServiceKey) -> DiResult<SharedInstance>;
}

/// Typed resolution interface shared by [`ServiceContainer`](crate::ServiceContainer)
/// and the [`InjectionContext`](crate::InjectionContext) handed to factory
/// closures, making them interchangeable inside factories.
///
/// # Examples
///
/// ```rust
/// use argon_di::{Lifetime, Resolver, ServiceRegistry};
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
/// struct UserService {
///     db: Arc<Database>,
/// }
///
/// let mut services = ServiceRegistry::new();
/// services.register_instance(Database { url: "postgres://localhost".to_string() });
/// services.register_factory(Lifetime::Transient, |ctx| UserService {
///     db: ctx.get_instance::<Database>().unwrap(),
/// });
///
/// let container = services.build();
/// let users = container.get_instance::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolve the default registration of a concrete service type.
    fn get_instance<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        downcast_concrete(self.resolve_key(ServiceKey::of::<T>())?)
    }

    /// Resolve a named registration of a concrete service type.
    fn get_named_instance<T: Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> DiResult<Arc<T>> {
        downcast_concrete(self.resolve_key(ServiceKey::named::<T>(name))?)
    }

    /// Resolve the default registration of a trait-bound service.
    fn get_trait_instance<S: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<S>> {
        downcast_shared(self.resolve_key(ServiceKey::of::<S>())?)
    }

    /// Resolve a named registration of a trait-bound service.
    fn get_named_trait_instance<S: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> DiResult<Arc<S>> {
        downcast_shared(self.resolve_key(ServiceKey::named::<S>(name))?)
    }
}
