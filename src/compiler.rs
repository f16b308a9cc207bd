//! Factory compilation and caching.
//!
//! Lowers a resolution plan into one composed closure per service, with
//! every dependency lookup and property set baked in, and caches the result
//! keyed by service key. A compiled factory never re-analyzes the schema at
//! invocation time. Concurrent first access compiles outside the lock and
//! inserts-if-absent: losers discard their result in favor of the winner,
//! so at most one compiled factory per key is ever visible.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::blueprint::{finish_concrete, GenericService};
use crate::container::{ContainerCore, InjectionContext};
use crate::error::{DiError, DiResult};
use crate::internal::{Disposer, ResolveGuard};
use crate::key::ServiceKey;
use crate::lifetime::{
    Lifetime, LifetimeManager, PerContainerManager, PerScopeManager, SharedInstance,
    TransientManager,
};
use crate::options::DisposalTracking;
use crate::planner::{self, ParamPlan, PlanNode, ResolutionPlan};
use crate::registration::LifetimeBinding;
use crate::scope;

pub(crate) type CreateFn =
    Arc<dyn Fn(&ContainerCore) -> DiResult<SharedInstance> + Send + Sync>;

/// A compiled creation routine wrapped by its lifetime manager.
pub(crate) struct CompiledService {
    key: ServiceKey,
    create: CreateFn,
    manager: Arc<dyn LifetimeManager>,
}

impl CompiledService {
    /// Produce an instance, letting the lifetime manager short-circuit to a
    /// cached one. The invoke-time guard wraps the whole resolution so a
    /// cycle is reported before it can re-enter a lifetime manager's
    /// initialization cell.
    pub(crate) fn resolve(&self, core: &ContainerCore) -> DiResult<SharedInstance> {
        let _frame = ResolveGuard::push(self.key)?;
        let create = &self.create;
        let mut make = || (create)(core);
        self.manager.instance(&mut make)
    }
}

/// Concurrent read-mostly map of compiled factories.
pub(crate) struct FactoryCache {
    map: RwLock<HashMap<ServiceKey, Arc<CompiledService>>>,
}

impl FactoryCache {
    pub(crate) fn new() -> Self {
        Self { map: RwLock::new(HashMap::new()) }
    }

    pub(crate) fn get(&self, key: &ServiceKey) -> Option<Arc<CompiledService>> {
        self.map.read().get(key).cloned()
    }

    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.map.read().contains_key(key)
    }

    /// Insert unless another thread won the compilation race; either way
    /// the single visible entry is returned.
    fn insert_or_existing(
        &self,
        key: ServiceKey,
        compiled: Arc<CompiledService>,
    ) -> Arc<CompiledService> {
        self.map.write().entry(key).or_insert(compiled).clone()
    }
}

/// Cache hit returns directly; a miss plans and lowers the whole subtree.
pub(crate) fn get_or_compile(
    core: &ContainerCore,
    key: ServiceKey,
) -> DiResult<Arc<CompiledService>> {
    if let Some(compiled) = core.factories.get(&key) {
        return Ok(compiled);
    }
    debug!(service = key.display_name(), "compiling resolution plan");
    let mut stack = Vec::new();
    let plan = planner::plan(core, key, &mut stack)?;
    Ok(lower(core, plan))
}

/// Synthesize, compile, and cache the closed registration for `T` from its
/// family's open template, unless the closed key is already registered.
pub(crate) fn ensure_generic<T: GenericService>(core: &ContainerCore) -> DiResult<()> {
    let mut stack = Vec::new();
    ensure_generic_on_stack::<T>(core, &mut stack)
}

/// Stack-threaded variant used while planning a parent service, so cycles
/// running through a synthesized registration are still detected.
pub(crate) fn ensure_generic_on_stack<T: GenericService>(
    core: &ContainerCore,
    stack: &mut Vec<ServiceKey>,
) -> DiResult<()> {
    let key = ServiceKey::of::<T>();
    if core.is_registered(key) {
        return Ok(());
    }
    let lifetime = match core.registry.open_template(T::family()) {
        Some(template) => template.lifetime,
        None => return Err(DiError::UnableToResolve(key)),
    };
    if stack.contains(&key) {
        let mut path = stack.clone();
        path.push(key);
        return Err(DiError::Recursive(path));
    }

    debug!(
        service = key.display_name(),
        family = T::family(),
        "synthesizing closed generic registration"
    );
    let blueprint = Arc::new(T::blueprint().erase(finish_concrete::<T>()));
    core.record_synthesized(&blueprint);

    stack.push(key);
    let node = planner::plan_blueprint(core, blueprint, LifetimeBinding::Standard(lifetime), stack);
    stack.pop();

    lower(core, ResolutionPlan { key, node: node? });
    Ok(())
}

/// One lowered dependency slot of a compiled factory.
enum Slot {
    Service(Arc<CompiledService>),
    Value(SharedInstance),
}

impl Slot {
    fn resolve(&self, core: &ContainerCore) -> DiResult<SharedInstance> {
        match self {
            Slot::Service(compiled) => compiled.resolve(core),
            Slot::Value(value) => Ok(value.clone()),
        }
    }
}

/// Where an automatically tracked disposable is registered.
#[derive(Clone, Copy)]
enum TrackMode {
    ActiveScope,
    ContainerRoot,
}

fn lower(core: &ContainerCore, plan: ResolutionPlan) -> Arc<CompiledService> {
    let ResolutionPlan { key, node } = plan;
    match node {
        PlanNode::Compiled(compiled) => compiled,
        PlanNode::Instance(value) => {
            let create: CreateFn = Arc::new(move |_| Ok(value.clone()));
            cache(core, key, create, Arc::new(TransientManager))
        }
        PlanNode::Factory { factory, lifetime } => {
            let create: CreateFn = Arc::new(move |core| {
                let ctx = InjectionContext::new(core);
                (factory)(&ctx)
            });
            cache(core, key, create, manager_for(key, &lifetime))
        }
        PlanNode::Construct { blueprint, constructor, params, properties, lifetime } => {
            let slots: Vec<Slot> =
                params.into_iter().map(|param| lower_binding(core, param)).collect();
            let property_slots: Vec<(usize, Slot)> = properties
                .into_iter()
                .map(|(index, binding)| (index, lower_binding(core, binding)))
                .collect();
            let assemble = blueprint.constructors[constructor].assemble.clone();
            let mode = track_mode(&lifetime);

            let create: CreateFn = Arc::new(move |core| {
                let mut args = Vec::with_capacity(slots.len());
                for slot in &slots {
                    args.push(slot.resolve(core)?);
                }
                let mut values = Vec::with_capacity(property_slots.len());
                for (index, slot) in &property_slots {
                    values.push((*index, slot.resolve(core)?));
                }
                let (instance, disposer) = (assemble)(&args, &values)?;
                if let Some(disposer) = disposer {
                    track_disposer(core, mode, disposer)?;
                }
                Ok(instance)
            });
            cache(core, key, create, manager_for(key, &lifetime))
        }
    }
}

fn lower_binding(core: &ContainerCore, binding: ParamPlan) -> Slot {
    match binding {
        ParamPlan::Resolve(plan) => Slot::Service(lower(core, plan)),
        ParamPlan::Value(value) => Slot::Value(value),
    }
}

fn cache(
    core: &ContainerCore,
    key: ServiceKey,
    create: CreateFn,
    manager: Arc<dyn LifetimeManager>,
) -> Arc<CompiledService> {
    core.factories.insert_or_existing(key, Arc::new(CompiledService { key, create, manager }))
}

fn manager_for(key: ServiceKey, lifetime: &LifetimeBinding) -> Arc<dyn LifetimeManager> {
    match lifetime {
        LifetimeBinding::Standard(Lifetime::Transient) => Arc::new(TransientManager),
        LifetimeBinding::Standard(Lifetime::PerContainer) => Arc::new(PerContainerManager::new()),
        LifetimeBinding::Standard(Lifetime::PerScope) => Arc::new(PerScopeManager::new(key)),
        LifetimeBinding::Custom(manager) => manager.clone(),
    }
}

fn track_mode(lifetime: &LifetimeBinding) -> TrackMode {
    match lifetime {
        LifetimeBinding::Standard(Lifetime::PerContainer) => TrackMode::ContainerRoot,
        _ => TrackMode::ActiveScope,
    }
}

fn track_disposer(
    core: &ContainerCore,
    mode: TrackMode,
    disposer: Disposer,
) -> DiResult<()> {
    match mode {
        TrackMode::ContainerRoot => {
            core.root_disposers.lock().push(disposer);
            Ok(())
        }
        TrackMode::ActiveScope => match scope::track_current(disposer) {
            Ok(()) => Ok(()),
            // No active scope: the caller owns disposal, unless strict
            // tracking rejects that.
            Err(disposer) => match core.options.disposal_tracking {
                DisposalTracking::Lenient => Ok(()),
                DisposalTracking::Strict => {
                    Err(DiError::DisposableOutsideScope(disposer.service()))
                }
            },
        },
    }
}
