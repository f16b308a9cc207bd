//! Resolution planning.
//!
//! Walks the dependency graph from a requested key, selecting a
//! constructor per blueprint and binding every parameter and property slot.
//! Cycles are rejected with an explicit visitation stack of in-progress
//! keys, checked by membership before each recursion; planning never relies
//! on call-stack exhaustion or unwinding to surface them. Planning stops at
//! keys that already have a compiled factory: their subtrees were planned
//! acyclically against the same frozen registry.

use std::sync::Arc;

use crate::analyzer;
use crate::blueprint::{ErasedBlueprint, ParamKind};
use crate::compiler::CompiledService;
use crate::container::ContainerCore;
use crate::error::{DiError, DiResult};
use crate::key::ServiceKey;
use crate::lifetime::SharedInstance;
use crate::registration::{ErasedFactory, LifetimeBinding, ServiceSource};

const MAX_PLAN_DEPTH: usize = 1024;

/// One planned service and how to obtain it.
pub(crate) struct ResolutionPlan {
    pub(crate) key: ServiceKey,
    pub(crate) node: PlanNode,
}

pub(crate) enum PlanNode {
    /// Already lowered and cached; reuse it.
    Compiled(Arc<CompiledService>),
    /// Pre-built instance.
    Instance(SharedInstance),
    /// Opaque factory registration.
    Factory { factory: ErasedFactory, lifetime: LifetimeBinding },
    /// Blueprint-constructed service.
    Construct {
        blueprint: Arc<ErasedBlueprint>,
        constructor: usize,
        params: Vec<ParamPlan>,
        properties: Vec<(usize, ParamPlan)>,
        lifetime: LifetimeBinding,
    },
}

/// Binding for one parameter or property slot.
pub(crate) enum ParamPlan {
    /// Resolve the planned subtree, honoring its lifetime policy.
    Resolve(ResolutionPlan),
    /// Baked value: a declared default or a pre-made deferred handle.
    Value(SharedInstance),
}

pub(crate) fn plan(
    core: &ContainerCore,
    key: ServiceKey,
    stack: &mut Vec<ServiceKey>,
) -> DiResult<ResolutionPlan> {
    if let Some(compiled) = core.factories.get(&key) {
        return Ok(ResolutionPlan { key, node: PlanNode::Compiled(compiled) });
    }
    let registration = core.registry.get(&key).ok_or(DiError::UnableToResolve(key))?;
    if stack.contains(&key) {
        let mut path = stack.clone();
        path.push(key);
        return Err(DiError::Recursive(path));
    }
    if stack.len() >= MAX_PLAN_DEPTH {
        return Err(DiError::DepthExceeded(stack.len()));
    }

    stack.push(key);
    let node = match &registration.source {
        ServiceSource::Instance(value) => Ok(PlanNode::Instance(value.clone())),
        ServiceSource::Factory(factory) => Ok(PlanNode::Factory {
            factory: factory.clone(),
            lifetime: registration.lifetime.clone(),
        }),
        ServiceSource::Blueprint(blueprint) => {
            plan_blueprint(core, blueprint.clone(), registration.lifetime.clone(), stack)
        }
    };
    stack.pop();

    Ok(ResolutionPlan { key, node: node? })
}

/// Plan a blueprint-backed service: constructor selection, parameter
/// bindings, property bindings. Shared by registry-backed blueprints and
/// synthesized closed generics, whose caller pushes the closed key itself.
pub(crate) fn plan_blueprint(
    core: &ContainerCore,
    blueprint: Arc<ErasedBlueprint>,
    lifetime: LifetimeBinding,
    stack: &mut Vec<ServiceKey>,
) -> DiResult<PlanNode> {
    let constructor = analyzer::select_constructor(core, &blueprint);

    let mut params = Vec::with_capacity(blueprint.constructors[constructor].params.len());
    for param in &blueprint.constructors[constructor].params {
        let binding = match &param.kind {
            ParamKind::Defaulted(default) => {
                if core.is_registered(param.key) {
                    ParamPlan::Resolve(plan(core, param.key, stack)?)
                } else {
                    ParamPlan::Value(default.clone())
                }
            }
            ParamKind::Deferred(make) => ParamPlan::Value(make(&core.self_weak)),
            ParamKind::Generic { ensure, .. } => {
                ensure(core, stack).map_err(|error| match error {
                    DiError::UnableToResolve(requested) if requested == param.key => {
                        DiError::UnresolvedDependency {
                            target: blueprint.impl_name,
                            parameter: param.name,
                            requested,
                        }
                    }
                    other => other,
                })?;
                ParamPlan::Resolve(plan(core, param.key, stack)?)
            }
            ParamKind::Required => {
                if !core.is_registered(param.key) {
                    return Err(DiError::UnresolvedDependency {
                        target: blueprint.impl_name,
                        parameter: param.name,
                        requested: param.key,
                    });
                }
                ParamPlan::Resolve(plan(core, param.key, stack)?)
            }
        };
        params.push(binding);
    }

    // Property injection is best-effort: unregistered dependencies leave
    // the property unset. Registered-but-cyclic ones still fail planning.
    let mut properties = Vec::new();
    if core.options.enable_property_injection {
        for (index, slot) in blueprint.properties.iter().enumerate() {
            match &slot.deferred {
                Some(make) => {
                    properties.push((index, ParamPlan::Value(make(&core.self_weak))));
                }
                None => {
                    if core.is_registered(slot.key) {
                        properties.push((index, ParamPlan::Resolve(plan(core, slot.key, stack)?)));
                    }
                }
            }
        }
    }

    Ok(PlanNode::Construct { blueprint, constructor, params, properties, lifetime })
}
