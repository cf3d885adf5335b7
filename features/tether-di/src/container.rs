use std::{
    fmt::Debug,
    sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    dependency_graph::DependencyGraph,
    errors::{RegisterError, ResolveError},
    factories::{Bound, DynFactory, InstanceFactory},
    lifetime::Lifetime,
    registry::{Binding, Registry},
    resolution::Resolution,
    resolver::Arguments,
    scope::Scope,
    types::{DependencyInfo, Implements, Instance, Interface, TypeInfo},
};

/// Container holding all bindings and the singletons built from them
///
/// Cloning is cheap, clones share the same registry.
#[derive(Clone, Default)]
pub struct Container(Arc<ContainerInner>);

#[derive(Default)]
pub struct ContainerInner {
    registry: RwLock<Registry>,
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("Container");
        match self.bindings() {
            Ok(bindings) => {
                for binding in bindings {
                    map.field(binding.interface.type_name, &binding.lifetime.as_str());
                }
            }
            Err(_) => {
                map.field("registry", &"<poisoned>");
            }
        }
        map.finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process wide default container
    ///
    /// Meant for the outermost application wiring only, pass containers explicitly everywhere else.
    pub fn global() -> &'static Container {
        static GLOBAL: OnceLock<Container> = OnceLock::new();
        GLOBAL.get_or_init(Container::new)
    }

    /// Binds `I` to the factory's product, one instance for the whole container
    pub fn register_singleton<I, F>(&self, factory: F) -> Result<&Self, RegisterError>
    where
        I: ?Sized + Interface,
        F: InstanceFactory,
        F::Provides: Implements<I>,
    {
        self.bind(Lifetime::Singleton, Arc::new(Bound::<I, F>::new(Arc::new(factory))))
    }

    /// Binds `I` to the factory's product, one instance per [Scope]
    pub fn register_scoped<I, F>(&self, factory: F) -> Result<&Self, RegisterError>
    where
        I: ?Sized + Interface,
        F: InstanceFactory,
        F::Provides: Implements<I>,
    {
        self.bind(Lifetime::Scoped, Arc::new(Bound::<I, F>::new(Arc::new(factory))))
    }

    /// Binds `I` to the factory's product, a new instance on every resolution
    pub fn register_transient<I, F>(&self, factory: F) -> Result<&Self, RegisterError>
    where
        I: ?Sized + Interface,
        F: InstanceFactory,
        F::Provides: Implements<I>,
    {
        self.bind(Lifetime::Transient, Arc::new(Bound::<I, F>::new(Arc::new(factory))))
    }

    /// Registers an already built singleton instance of `I`
    ///
    /// Replaces an earlier instance of `I`. Fails with [RegisterError::AlreadyBuilt] if a
    /// singleton factory for `I` already produced the instance others hold.
    pub fn register_instance<I: ?Sized + Interface>(
        &self,
        instance: Arc<I>,
    ) -> Result<&Self, RegisterError> {
        self.register_dyn_instance(Instance::new(instance))
    }

    /// Registers a type erased singleton instance under the interface it holds
    pub fn register_dyn_instance(&self, instance: Instance) -> Result<&Self, RegisterError> {
        let interface = instance.info;
        self.write_registry()?.insert_instance(instance)?;
        tracing::debug!("Registered instance of {}", interface);
        Ok(self)
    }

    /// Registers a type erased factory under `interface`
    ///
    /// Fails with [RegisterError::InvalidBinding] if the factory does not produce `interface`.
    pub fn register_dyn(
        &self,
        lifetime: Lifetime,
        interface: TypeInfo,
        factory: Arc<dyn DynFactory>,
    ) -> Result<&Self, RegisterError> {
        if factory.interface() != interface {
            return Err(RegisterError::InvalidBinding {
                interface,
                implementation: factory.implementation(),
            });
        }
        self.bind(lifetime, factory)
    }

    pub(crate) fn bind(
        &self,
        lifetime: Lifetime,
        factory: Arc<dyn DynFactory>,
    ) -> Result<&Self, RegisterError> {
        tracing::debug!(
            "Registered {} for {} as {}",
            factory.implementation(),
            factory.interface(),
            lifetime
        );
        self.write_registry()?.insert(lifetime, factory);
        Ok(self)
    }

    /// Resolves `I` within the given scope
    pub fn resolve<I: ?Sized + Interface>(&self, scope: &mut Scope) -> Result<Arc<I>, ResolveError> {
        let instance = self.resolve_instance(TypeInfo::of::<I>(), scope)?;
        instance
            .downcast()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                required_type: std::any::type_name::<I>(),
                actual_type,
            })
    }

    /// Resolves an interface by its [TypeInfo] within the given scope
    pub fn resolve_instance(
        &self,
        interface: TypeInfo,
        scope: &mut Scope,
    ) -> Result<Instance, ResolveError> {
        Resolution::new(self, scope).resolve(interface)
    }

    /// Resolves an explicit parameter list and passes the arguments to `func`
    ///
    /// Parameters are handled in order: defaulted ones are skipped, ones without a type
    /// fail with [ResolveError::MissingTypeAnnotation], all others are resolved.
    pub fn call_with<R>(
        &self,
        parameters: &[DependencyInfo],
        scope: &mut Scope,
        func: impl FnOnce(Arguments) -> R,
    ) -> Result<R, ResolveError> {
        let arguments = Resolution::new(self, scope).resolve_parameters(
            std::any::type_name_of_val(&func),
            parameters,
            None,
        )?;
        Ok(func(arguments))
    }

    /// All registered bindings
    pub fn bindings(&self) -> Result<Vec<Binding>, ResolveError> {
        Ok(self.read_registry()?.bindings())
    }

    /// Snapshot of the dependency graph of all registered bindings
    pub fn graph(&self) -> Result<DependencyGraph, ResolveError> {
        let registry = self.read_registry()?;
        let mut graph = DependencyGraph::new();
        for binding in registry.bindings() {
            let dependencies = registry
                .winning_factory(&binding.interface)
                .map(|factory| factory.dependencies())
                .unwrap_or_default();
            graph.add(binding.interface, dependencies);
        }
        Ok(graph)
    }

    pub(crate) fn read_registry(&self) -> Result<RwLockReadGuard<'_, Registry>, ResolveError> {
        self.0.registry.read().map_err(|_| ResolveError::Poisoned)
    }

    fn write_registry(&self) -> Result<RwLockWriteGuard<'_, Registry>, RegisterError> {
        self.0.registry.write().map_err(|_| RegisterError::Poisoned)
    }
}
