//! Declared dependency schemas.
//!
//! Runtime reflection is replaced by an explicit schema: a registration
//! declares candidate constructors (ordered lists of typed parameter slots)
//! and injectable property slots through the builders in this module. The
//! typed builders erase themselves into plain slot lists at registration
//! time, which is what the planner and compiler operate on.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::ContainerCore;
use crate::deferred::Deferred;
use crate::error::{DiError, DiResult};
use crate::internal::Disposer;
use crate::key::ServiceKey;
use crate::lifetime::SharedInstance;
use crate::traits::{downcast_concrete, downcast_shared, Dispose};

pub(crate) type DeferredMaker =
    Arc<dyn Fn(&Weak<ContainerCore>) -> SharedInstance + Send + Sync>;
pub(crate) type EnsureGeneric =
    Arc<dyn Fn(&ContainerCore, &mut Vec<ServiceKey>) -> DiResult<()> + Send + Sync>;

/// How one constructor parameter slot is satisfied.
pub(crate) enum ParamKind {
    /// Must resolve from the registry; aborts planning otherwise.
    Required,
    /// Resolves from the registry when registered, otherwise falls back to
    /// the declared default value.
    Defaulted(SharedInstance),
    /// Satisfied by a `Deferred<T>` handle; resolution happens on demand.
    Deferred(DeferredMaker),
    /// Closed instantiation of an open generic family, synthesized on
    /// first use.
    Generic { family: &'static str, ensure: EnsureGeneric },
}

pub(crate) struct ParamSpec {
    pub(crate) name: &'static str,
    pub(crate) key: ServiceKey,
    pub(crate) kind: ParamKind,
}

/// One injectable property slot.
pub(crate) struct PropertySlot {
    pub(crate) name: &'static str,
    pub(crate) key: ServiceKey,
    pub(crate) deferred: Option<DeferredMaker>,
}

/// Constructor arguments resolved by the compiled factory, in declaration
/// order.
pub struct ResolvedArgs<'a> {
    values: &'a [SharedInstance],
}

impl ResolvedArgs<'_> {
    fn value(&self, index: usize) -> SharedInstance {
        self.values
            .get(index)
            .unwrap_or_else(|| {
                panic!(
                    "constructor argument {} out of range ({} declared)",
                    index,
                    self.values.len()
                )
            })
            .clone()
    }

    /// The argument at `index` as a concrete service instance.
    pub fn get<D: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<D>> {
        downcast_concrete(self.value(index))
    }

    /// The argument at `index` as a trait-bound service instance.
    pub fn get_trait<D: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<D>> {
        downcast_shared(self.value(index))
    }

    /// The argument at `index` as a deferred factory handle.
    pub fn deferred<D: Send + Sync + 'static>(&self, index: usize) -> DiResult<Deferred<D>> {
        self.value(index)
            .downcast::<Deferred<D>>()
            .map(|handle| (*handle).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<Deferred<D>>()))
    }
}

/// Builder for one constructor candidate of `T`: a list of typed parameter
/// slots plus the closure that assembles the instance from the resolved
/// arguments.
///
/// # Examples
///
/// ```rust
/// use argon_di::{Blueprint, Constructor};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository {
///     db: Arc<Database>,
/// }
///
/// let blueprint = Blueprint::new().constructor(
///     Constructor::new()
///         .param::<Database>("db")
///         .build(|args| Ok(Repository { db: args.get(0)? })),
/// );
/// # let _ = blueprint;
/// ```
pub struct Constructor<T> {
    params: Vec<ParamSpec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Constructor<T> {
    pub fn new() -> Self {
        Self { params: Vec::new(), _marker: PhantomData }
    }

    /// Mandatory dependency on the default registration of `D`. Works for
    /// concrete types and trait objects alike.
    pub fn param<D: ?Sized + Send + Sync + 'static>(mut self, name: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            key: ServiceKey::of::<D>(),
            kind: ParamKind::Required,
        });
        self
    }

    /// Mandatory dependency on a named registration of `D`.
    pub fn named_param<D: ?Sized + Send + Sync + 'static>(
        mut self,
        name: &'static str,
        service_name: &'static str,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            key: ServiceKey::named::<D>(service_name),
            kind: ParamKind::Required,
        });
        self
    }

    /// Dependency that falls back to `default` when `D` is unregistered.
    pub fn default_param<D: Send + Sync + 'static>(
        mut self,
        name: &'static str,
        default: D,
    ) -> Self {
        self.params.push(ParamSpec {
            name,
            key: ServiceKey::of::<D>(),
            kind: ParamKind::Defaulted(Arc::new(default) as SharedInstance),
        });
        self
    }

    /// Dependency satisfied by a [`Deferred<D>`] handle instead of an eager
    /// instance.
    pub fn deferred_param<D: Send + Sync + 'static>(mut self, name: &'static str) -> Self {
        let key = ServiceKey::of::<D>();
        self.params.push(ParamSpec {
            name,
            key,
            kind: ParamKind::Deferred(Arc::new(move |core: &Weak<ContainerCore>| {
                Arc::new(Deferred::<D>::new(core.clone(), key)) as SharedInstance
            })),
        });
        self
    }

    /// Dependency on a closed generic instantiation, synthesized from its
    /// family's open template on first use.
    pub fn generic_param<D: GenericService>(mut self, name: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            key: ServiceKey::of::<D>(),
            kind: ParamKind::Generic {
                family: D::family(),
                ensure: Arc::new(|core, stack| {
                    crate::compiler::ensure_generic_on_stack::<D>(core, stack)
                }),
            },
        });
        self
    }

    /// Finish the candidate with the closure that builds `T` from the
    /// resolved arguments, indexed in declaration order.
    pub fn build<F>(self, build: F) -> ConstructorSpec<T>
    where
        F: Fn(&ResolvedArgs<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        ConstructorSpec { params: self.params, build: Arc::new(build) }
    }
}

impl<T: Send + Sync + 'static> Default for Constructor<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished constructor candidate, ready to attach to a [`Blueprint`].
pub struct ConstructorSpec<T> {
    params: Vec<ParamSpec>,
    build: Arc<dyn Fn(&ResolvedArgs<'_>) -> DiResult<T> + Send + Sync>,
}

type Setter<T> = Arc<dyn Fn(&mut T, SharedInstance) -> DiResult<()> + Send + Sync>;
type DisposerMaker<T> = Arc<dyn Fn(&Arc<T>) -> Disposer + Send + Sync>;
pub(crate) type Finisher<T> = Arc<dyn Fn(Arc<T>) -> SharedInstance + Send + Sync>;

struct TypedProperty<T> {
    name: &'static str,
    key: ServiceKey,
    deferred: Option<DeferredMaker>,
    set: Setter<T>,
}

/// Declared schema for building `T`: candidate constructors and injectable
/// properties.
///
/// Constructor injection is mandatory (an unsatisfiable selected
/// constructor aborts planning); property injection is best-effort (an
/// unregistered property dependency leaves the property unset).
///
/// # Examples
///
/// ```rust
/// use argon_di::{Blueprint, Constructor, Lifetime, Resolver, ServiceRegistry};
/// use std::sync::Arc;
///
/// struct Bar;
/// struct Foo {
///     bar: Option<Arc<Bar>>,
/// }
///
/// let mut services = ServiceRegistry::new();
/// services.register::<Bar>(
///     Lifetime::Transient,
///     Blueprint::new().constructor(Constructor::new().build(|_| Ok(Bar))),
/// );
/// services.register::<Foo>(
///     Lifetime::Transient,
///     Blueprint::new()
///         .constructor(Constructor::new().build(|_| Ok(Foo { bar: None })))
///         .property("bar", |foo, bar: Arc<Bar>| foo.bar = Some(bar)),
/// );
///
/// let container = services.build();
/// let foo = container.get_instance::<Foo>().unwrap();
/// assert!(foo.bar.is_some());
/// ```
pub struct Blueprint<T> {
    constructors: Vec<ConstructorSpec<T>>,
    properties: Vec<TypedProperty<T>>,
    disposer: Option<DisposerMaker<T>>,
}

impl<T: Send + Sync + 'static> Blueprint<T> {
    pub fn new() -> Self {
        Self { constructors: Vec::new(), properties: Vec::new(), disposer: None }
    }

    /// Add a constructor candidate. Declaration order breaks selection ties.
    pub fn constructor(mut self, ctor: ConstructorSpec<T>) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Injectable property depending on the default registration of `D`.
    /// Left unset when `D` is unregistered.
    pub fn property<D, F>(mut self, name: &'static str, set: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target, value| {
            set(target, downcast_concrete::<D>(value)?);
            Ok(())
        });
        self.properties.push(TypedProperty {
            name,
            key: ServiceKey::of::<D>(),
            deferred: None,
            set: setter,
        });
        self
    }

    /// Injectable property depending on a named registration of `D`.
    pub fn named_property<D, F>(
        mut self,
        name: &'static str,
        service_name: &'static str,
        set: F,
    ) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target, value| {
            set(target, downcast_concrete::<D>(value)?);
            Ok(())
        });
        self.properties.push(TypedProperty {
            name,
            key: ServiceKey::named::<D>(service_name),
            deferred: None,
            set: setter,
        });
        self
    }

    /// Injectable property depending on a trait-bound service.
    pub fn trait_property<D, F>(mut self, name: &'static str, set: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Arc::new(move |target, value| {
            set(target, downcast_shared::<D>(value)?);
            Ok(())
        });
        self.properties.push(TypedProperty {
            name,
            key: ServiceKey::of::<D>(),
            deferred: None,
            set: setter,
        });
        self
    }

    /// Injectable property receiving a [`Deferred<D>`] factory handle.
    pub fn deferred_property<D, F>(mut self, name: &'static str, set: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&mut T, Deferred<D>) + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<D>();
        let setter: Setter<T> = Arc::new(move |target, value| {
            let handle = value
                .downcast::<Deferred<D>>()
                .map(|handle| (*handle).clone())
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<Deferred<D>>()))?;
            set(target, handle);
            Ok(())
        });
        self.properties.push(TypedProperty {
            name,
            key,
            deferred: Some(Arc::new(move |core: &Weak<ContainerCore>| {
                Arc::new(Deferred::<D>::new(core.clone(), key)) as SharedInstance
            })),
            set: setter,
        });
        self
    }

    /// Track instances built from this blueprint for automatic disposal:
    /// with the active scope for transient and per-scope lifetimes, with
    /// the container for per-container lifetimes.
    pub fn tracked(mut self) -> Self
    where
        T: Dispose,
    {
        self.disposer = Some(Arc::new(|shared: &Arc<T>| {
            let instance = shared.clone();
            Disposer::new(std::any::type_name::<T>(), move || instance.dispose())
        }));
        self
    }

    pub(crate) fn erase(self, finish: Finisher<T>) -> ErasedBlueprint {
        assert!(
            !self.constructors.is_empty(),
            "blueprint for {} declares no constructor",
            std::any::type_name::<T>()
        );
        let properties = Arc::new(self.properties);
        let disposer = self.disposer;

        let constructors = self
            .constructors
            .into_iter()
            .map(|ctor| {
                let ConstructorSpec { params, build } = ctor;
                let properties = properties.clone();
                let disposer = disposer.clone();
                let finish = finish.clone();
                let assemble: Assemble = Arc::new(move |args, property_values| {
                    let resolved = ResolvedArgs { values: args };
                    let mut instance = (build)(&resolved)?;
                    for (index, value) in property_values {
                        (properties[*index].set)(&mut instance, value.clone())?;
                    }
                    let shared = Arc::new(instance);
                    let pending = disposer.as_ref().map(|make| make(&shared));
                    Ok(((finish)(shared), pending))
                });
                ErasedConstructor { params, assemble }
            })
            .collect();

        let apply_properties: ApplyProperties = {
            let properties = properties.clone();
            Arc::new(move |target: &mut dyn Any, values: &[(usize, SharedInstance)]| {
                let target = target
                    .downcast_mut::<T>()
                    .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))?;
                for (index, value) in values {
                    (properties[*index].set)(target, value.clone())?;
                }
                Ok(())
            })
        };

        ErasedBlueprint {
            impl_id: TypeId::of::<T>(),
            impl_name: std::any::type_name::<T>(),
            constructors,
            properties: properties
                .iter()
                .map(|p| PropertySlot { name: p.name, key: p.key, deferred: p.deferred.clone() })
                .collect(),
            apply_properties,
        }
    }
}

impl<T: Send + Sync + 'static> Default for Blueprint<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn finish_concrete<T: Send + Sync + 'static>() -> Finisher<T> {
    Arc::new(|instance| instance as SharedInstance)
}

pub(crate) fn finish_trait<S, T, F>(coerce: F) -> Finisher<T>
where
    S: ?Sized + Send + Sync + 'static,
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Arc<S> + Send + Sync + 'static,
{
    Arc::new(move |instance| Arc::new(coerce(instance)) as SharedInstance)
}

pub(crate) type Assemble = Arc<
    dyn Fn(&[SharedInstance], &[(usize, SharedInstance)]) -> DiResult<(SharedInstance, Option<Disposer>)>
        + Send
        + Sync,
>;
pub(crate) type ApplyProperties =
    Arc<dyn Fn(&mut dyn Any, &[(usize, SharedInstance)]) -> DiResult<()> + Send + Sync>;

pub(crate) struct ErasedConstructor {
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) assemble: Assemble,
}

/// Type-erased schema, as stored in the registry and consumed by the
/// analyzer, planner, and compiler.
pub(crate) struct ErasedBlueprint {
    pub(crate) impl_id: TypeId,
    pub(crate) impl_name: &'static str,
    pub(crate) constructors: Vec<ErasedConstructor>,
    pub(crate) properties: Vec<PropertySlot>,
    pub(crate) apply_properties: ApplyProperties,
}

/// Implemented by closed instantiations of an open generic service family.
///
/// The open side is registered once with
/// [`ServiceRegistry::register_open_generic`](crate::ServiceRegistry::register_open_generic);
/// each closed instantiation describes how to build itself, and the
/// container synthesizes and caches the closed registration the first time
/// that instantiation is requested.
///
/// # Examples
///
/// ```rust
/// use argon_di::{Blueprint, Constructor, GenericService, Lifetime, ServiceRegistry};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository<E: Send + Sync + 'static> {
///     db: Arc<Database>,
///     _marker: std::marker::PhantomData<fn() -> E>,
/// }
///
/// impl<E: Send + Sync + 'static> GenericService for Repository<E> {
///     fn family() -> &'static str {
///         "repository"
///     }
///     fn blueprint() -> Blueprint<Self> {
///         Blueprint::new().constructor(Constructor::new().param::<Database>("db").build(
///             |args| {
///                 Ok(Repository { db: args.get(0)?, _marker: std::marker::PhantomData })
///             },
///         ))
///     }
/// }
///
/// let mut services = ServiceRegistry::new();
/// services.register_instance(Database);
/// services.register_open_generic("repository", Lifetime::Transient);
///
/// struct User;
/// let container = services.build();
/// let _repo = container.get_generic::<Repository<User>>().unwrap();
/// ```
pub trait GenericService: Send + Sync + Sized + 'static {
    /// Family token shared by every instantiation of the open generic.
    fn family() -> &'static str;

    /// Schema for building this closed instantiation.
    fn blueprint() -> Blueprint<Self>;
}
