//! Constructor selection over declared schemas.

use crate::blueprint::{ErasedBlueprint, ParamKind, ParamSpec};
use crate::container::ContainerCore;

/// Whether a parameter slot can be satisfied against the current registry
/// at plan time. Defaulted and deferred slots always can; generic slots can
/// when the closed key or the family's open template is registered.
pub(crate) fn is_satisfiable(core: &ContainerCore, param: &ParamSpec) -> bool {
    match &param.kind {
        ParamKind::Defaulted(_) | ParamKind::Deferred(_) => true,
        ParamKind::Generic { family, .. } => {
            core.is_registered(param.key) || core.registry.open_template(family).is_some()
        }
        ParamKind::Required => core.is_registered(param.key),
    }
}

/// Select the constructor candidate to plan with.
///
/// Prefer the candidate whose parameters are all satisfiable; among those,
/// the one with the most parameters, declaration order breaking ties. When
/// no candidate is fully satisfiable, fall back to the one with the fewest
/// parameters and let its unsatisfiable parameters fail during planning
/// (unless they carry a default value).
pub(crate) fn select_constructor(core: &ContainerCore, blueprint: &ErasedBlueprint) -> usize {
    let mut best: Option<(usize, usize)> = None;
    for (index, ctor) in blueprint.constructors.iter().enumerate() {
        if ctor.params.iter().all(|param| is_satisfiable(core, param)) {
            let better = match best {
                None => true,
                Some((count, _)) => ctor.params.len() > count,
            };
            if better {
                best = Some((ctor.params.len(), index));
            }
        }
    }
    if let Some((_, index)) = best {
        return index;
    }

    let mut fallback = 0;
    let mut fewest = usize::MAX;
    for (index, ctor) in blueprint.constructors.iter().enumerate() {
        if ctor.params.len() < fewest {
            fewest = ctor.params.len();
            fallback = index;
        }
    }
    fallback
}
