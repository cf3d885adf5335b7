//! Tether DI resolves object graphs from the parameters factories declare.
//!
//! Interfaces (trait objects or plain types) are bound to factories under one of three
//! lifetimes:
//! 1. Singleton: built once per [Container], on first use
//! 2. Scoped: built once per [Scope], a scope lives for one resolution pass
//! 3. Transient: built on every resolution
//!
//! When an interface is requested, the container builds it bottom-up, resolving every
//! parameter its factory declares against the same scope.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tether_di::{factory_fn, implements, Container};
//!
//! trait Repository: Send + Sync {
//!     fn next_id(&self) -> u32;
//! }
//!
//! #[derive(Default)]
//! struct MemoryRepository;
//! impl Repository for MemoryRepository {
//!     fn next_id(&self) -> u32 {
//!         1
//!     }
//! }
//! implements!(MemoryRepository: dyn Repository);
//!
//! struct Service {
//!     repository: Arc<dyn Repository>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_scoped::<dyn Repository, _>(factory_fn(MemoryRepository::default))
//!     .unwrap()
//!     .register_scoped::<Service, _>(factory_fn(|repository: Arc<dyn Repository>| Service {
//!         repository,
//!     }))
//!     .unwrap();
//!
//! let (repository, service) = container
//!     .inject(|repository: Arc<dyn Repository>, service: Arc<Service>| (repository, service))
//!     .call()
//!     .unwrap();
//!
//! assert!(Arc::ptr_eq(&repository, &service.repository));
//! ```

/// Invokes `$name!` for every supported parameter count
macro_rules! all_the_tuples {
    ($name:ident) => {
        $name!();
        $name!(A1);
        $name!(A1, A2);
        $name!(A1, A2, A3);
        $name!(A1, A2, A3, A4);
        $name!(A1, A2, A3, A4, A5);
        $name!(A1, A2, A3, A4, A5, A6);
        $name!(A1, A2, A3, A4, A5, A6, A7);
        $name!(A1, A2, A3, A4, A5, A6, A7, A8);
        $name!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
        $name!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
        $name!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
        $name!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);
    };
}

pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub mod inject;
pub mod lifetime;
pub mod registration;
pub mod registry;
mod resolution;
pub mod resolver;
pub mod scope;
pub mod types;

pub use container::Container;
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{ParseLifetimeError, RegisterError, ResolveError};
pub use factories::{factory_fn, DynFactory, FactoryFn, FnFactory, InstanceFactory};
pub use inject::{Inject, Instances, Provide};
pub use lifetime::Lifetime;
pub use registration::Registration;
pub use registry::Binding;
pub use resolver::{value::Value, Argument, Arguments, Resolver};
pub use scope::Scope;
pub use types::{DependencyInfo, DynError, Implements, Injectable, Instance, Interface, TypeInfo};

/// Declares that an implementation satisfies one or more trait object interfaces
///
/// ```rust
/// trait Reader: Send + Sync {}
/// trait Writer: Send + Sync {}
///
/// struct File;
/// impl Reader for File {}
/// impl Writer for File {}
///
/// tether_di::implements!(File: dyn Reader, dyn Writer);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty: $($interface:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$interface> for $implementation {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
                    self
                }
            }
        )+
    };
}
