use std::sync::Arc;

use crate::{
    container::Container,
    errors::RegisterError,
    factories::{Bound, DynFactory, InstanceFactory},
    lifetime::Lifetime,
    types::{Implements, Interface},
};

/// Builder registering one factory under one or more interfaces
///
/// Without any [as_interface](Registration::as_interface) call the product is registered
/// as its own interface. Every interface gets its own binding, a singleton registered
/// under two interfaces is built once per interface.
///
/// ```rust
/// use std::sync::Arc;
/// use tether_di::{factory_fn, implements, Container, Registration};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         42
///     }
/// }
/// implements!(FixedClock: dyn Clock);
///
/// let container = Container::new();
/// Registration::singleton(factory_fn(|| FixedClock))
///     .as_interface::<dyn Clock>()
///     .register(&container)
///     .unwrap();
///
/// assert_eq!(container.provide::<dyn Clock>().unwrap().now(), 42);
/// ```
pub struct Registration<F: InstanceFactory> {
    lifetime: Lifetime,
    factory: Arc<F>,
    /// Bindings for the explicitly named interfaces
    bindings: Vec<Arc<dyn DynFactory>>,
}

impl<F: InstanceFactory> Registration<F> {
    pub fn new(lifetime: Lifetime, factory: F) -> Self {
        Registration {
            lifetime,
            factory: Arc::new(factory),
            bindings: Vec::new(),
        }
    }

    pub fn singleton(factory: F) -> Self {
        Self::new(Lifetime::Singleton, factory)
    }

    pub fn scoped(factory: F) -> Self {
        Self::new(Lifetime::Scoped, factory)
    }

    pub fn transient(factory: F) -> Self {
        Self::new(Lifetime::Transient, factory)
    }

    /// Adds an interface the product is registered under
    pub fn as_interface<I>(mut self) -> Self
    where
        I: ?Sized + Interface,
        F::Provides: Implements<I>,
    {
        self.bindings
            .push(Arc::new(Bound::<I, F>::new(self.factory.clone())));
        self
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Registers all bindings in the container
    pub fn register(self, container: &Container) -> Result<(), RegisterError> {
        let Registration {
            lifetime,
            factory,
            mut bindings,
        } = self;

        if bindings.is_empty() {
            bindings.push(Arc::new(Bound::<F::Provides, F>::new(factory)));
        }

        for binding in bindings {
            container.bind(lifetime, binding)?;
        }
        Ok(())
    }

    /// Registers all bindings in the [global](Container::global) container
    pub fn register_global(self) -> Result<(), RegisterError> {
        self.register(Container::global())
    }
}
