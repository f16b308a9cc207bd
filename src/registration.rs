//! Service registration storage.
//!
//! Pure data: one registration per (service type, name) key, plus open
//! generic templates and the property schemas used by
//! `inject_properties`. The registry is mutated only during the
//! registration phase and frozen when the container is built, so
//! resolution reads it without locking.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::blueprint::ErasedBlueprint;
use crate::container::InjectionContext;
use crate::error::DiResult;
use crate::key::ServiceKey;
use crate::lifetime::{Lifetime, LifetimeManager, SharedInstance};

pub(crate) type ErasedFactory =
    Arc<dyn for<'a> Fn(&InjectionContext<'a>) -> DiResult<SharedInstance> + Send + Sync>;

/// The chosen implementation behind a key.
pub(crate) enum ServiceSource {
    /// Pre-built, caller-supplied instance.
    Instance(SharedInstance),
    /// Opaque factory closure.
    Factory(ErasedFactory),
    /// Declared constructor/property schema.
    Blueprint(Arc<ErasedBlueprint>),
}

/// Lifetime policy attached to a registration.
#[derive(Clone)]
pub(crate) enum LifetimeBinding {
    Standard(Lifetime),
    Custom(Arc<dyn LifetimeManager>),
}

pub(crate) struct ServiceRegistration {
    pub(crate) lifetime: LifetimeBinding,
    pub(crate) source: ServiceSource,
}

/// Open generic template: lifetime applied to every closed instantiation
/// synthesized for the family.
pub(crate) struct OpenTemplate {
    pub(crate) lifetime: Lifetime,
}

/// Hybrid key-to-registration map: linear scan over a small sorted vec for
/// the common case, hash map overflow for large registries.
pub(crate) struct Registry {
    small: Vec<(ServiceKey, ServiceRegistration)>,
    large: HashMap<ServiceKey, ServiceRegistration>,
    open: HashMap<&'static str, OpenTemplate>,
    blueprints: HashMap<TypeId, Arc<ErasedBlueprint>>,
    small_threshold: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            small: Vec::new(),
            large: HashMap::new(),
            open: HashMap::new(),
            blueprints: HashMap::new(),
            small_threshold: 16,
        }
    }

    /// Insert a registration; re-registering a key replaces the prior
    /// entry for all not-yet-compiled resolutions.
    pub(crate) fn insert(&mut self, key: ServiceKey, registration: ServiceRegistration) {
        if let Some(position) = self.small.iter().position(|(k, _)| *k == key) {
            self.small[position] = (key, registration);
        } else if self.large.contains_key(&key) || self.small.len() >= self.small_threshold {
            self.large.insert(key, registration);
        } else {
            self.small.push((key, registration));
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &ServiceKey) -> Option<&ServiceRegistration> {
        for (k, registration) in &self.small {
            if k == key {
                return Some(registration);
            }
        }
        self.large.get(key)
    }

    #[inline(always)]
    pub(crate) fn contains(&self, key: &ServiceKey) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn insert_open(&mut self, family: &'static str, lifetime: Lifetime) {
        self.open.insert(family, OpenTemplate { lifetime });
    }

    pub(crate) fn open_template(&self, family: &str) -> Option<&OpenTemplate> {
        self.open.get(family)
    }

    /// Record a blueprint's property schema under its implementation type,
    /// for property injection into externally-owned instances.
    pub(crate) fn record_blueprint(&mut self, blueprint: Arc<ErasedBlueprint>) {
        self.blueprints.insert(blueprint.impl_id, blueprint);
    }

    pub(crate) fn blueprint_for(&self, impl_id: TypeId) -> Option<Arc<ErasedBlueprint>> {
        self.blueprints.get(&impl_id).cloned()
    }

    /// Freeze for resolution: sort the small vec for lookup locality.
    pub(crate) fn finalize(&mut self) {
        self.small.sort_by(|a, b| a.0.cmp(&b.0));
    }
}
