//! Service key type for registration storage and lookup.

use std::any::TypeId;
use std::fmt;

/// Identity of a registration: the requested service type plus an optional
/// service name.
///
/// A key is built from any `'static` type, including trait objects
/// (`ServiceKey::of::<dyn Logger>()` is valid), so concrete services and
/// trait-bound services share one key space. The default, unnamed
/// registration of a type and its named registrations are distinct keys.
///
/// # Examples
///
/// ```rust
/// use argon_di::ServiceKey;
///
/// let unnamed = ServiceKey::of::<u32>();
/// let named = ServiceKey::named::<u32>("port");
/// assert_ne!(unnamed, named);
/// assert_eq!(named.service_name(), Some("port"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl ServiceKey {
    /// Key for the default (unnamed) registration of `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for the named registration of `T`.
    #[inline(always)]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: Some(name),
        }
    }

    /// The human-readable service type name (`std::any::type_name` output).
    pub fn display_name(&self) -> &'static str {
        self.type_name
    }

    /// The service name for named registrations, `None` for the default one.
    pub fn service_name(&self) -> Option<&'static str> {
        self.name
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} (\"{}\")", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

// Identity is (TypeId, name); the type-name string is carried for
// diagnostics only and never compared.
impl PartialEq for ServiceKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for ServiceKey {}

impl PartialOrd for ServiceKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ServiceKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id).then_with(|| self.name.cmp(&other.name))
    }
}

impl std::hash::Hash for ServiceKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}
