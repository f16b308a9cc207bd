//! # argon-di
//!
//! Plan-compiling dependency injection for Rust, inspired by LightInject.
//!
//! Services are registered against typed keys with one of three lifetimes,
//! then resolved on demand. The first resolution of a key plans the whole
//! dependency subtree (constructor selection, property slots, cycle
//! detection) and compiles it into one reusable creation closure; every
//! later resolution invokes the cached closure, wrapped by its lifetime
//! manager.
//!
//! ## Features
//!
//! - **Declared schemas**: constructor and property dependencies are
//!   declared with typed builders, no runtime reflection
//! - **Lifetimes**: transient, per-container, per-scope, or a custom
//!   [`LifetimeManager`]
//! - **Cycle detection**: recursive chains fail with the full key path,
//!   never a stack overflow
//! - **Ambient scopes**: per-thread scope stack with deterministic
//!   reverse-order disposal
//! - **Deferred dependencies**: factory-of-T slots resolved on demand
//! - **Open generics**: closed instantiations synthesized from a family
//!   template on first use
//!
//! ## Quick start
//!
//! ```rust
//! use argon_di::{Blueprint, Constructor, Lifetime, Resolver, ServiceRegistry};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceRegistry::new();
//! services.register_instance(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.register::<UserService>(
//!     Lifetime::Transient,
//!     Blueprint::new().constructor(
//!         Constructor::new()
//!             .param::<Database>("db")
//!             .build(|args| Ok(UserService { db: args.get(0)? })),
//!     ),
//! );
//!
//! let container = services.build();
//! let users = container.get_instance::<UserService>().unwrap();
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Scoped services
//!
//! ```rust
//! use argon_di::{Lifetime, Resolver, ServiceRegistry};
//! use std::sync::Arc;
//!
//! struct RequestId(u64);
//!
//! let mut services = ServiceRegistry::new();
//! services.register_factory(Lifetime::PerScope, |_| RequestId(7));
//!
//! let container = services.build();
//!
//! let scope = container.begin_scope();
//! let a = container.get_instance::<RequestId>().unwrap();
//! let b = container.get_instance::<RequestId>().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! scope.end().unwrap();
//!
//! // Outside any scope, per-scope resolution is an error.
//! assert!(container.get_instance::<RequestId>().is_err());
//! ```

pub mod blueprint;
pub mod container;
pub mod deferred;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod options;
pub mod scope;
pub mod traits;

mod analyzer;
mod compiler;
mod internal;
mod planner;
mod registration;

pub use blueprint::{Blueprint, Constructor, ConstructorSpec, GenericService, ResolvedArgs};
pub use container::{InjectionContext, ServiceContainer, ServiceRegistry};
pub use deferred::Deferred;
pub use error::{DiError, DiResult, DisposalFailure, DisposeError};
pub use key::ServiceKey;
pub use lifetime::{Lifetime, LifetimeManager, SharedInstance};
pub use options::{ContainerOptions, DisposalTracking};
pub use scope::Scope;
pub use traits::{Dispose, Resolver, ResolverCore};
