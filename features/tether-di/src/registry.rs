use std::{any::TypeId, collections::HashMap, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    errors::RegisterError,
    factories::DynFactory,
    lifetime::Lifetime,
    types::{Instance, TypeInfo},
};

/// A registered (interface, implementation, lifetime) record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub interface: TypeInfo,
    pub implementation: TypeInfo,
    pub lifetime: Lifetime,
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.interface, self.implementation, self.lifetime
        )
    }
}

/// A singleton binding together with its lazily built instance
pub(crate) struct SingletonSlot {
    /// None for instances registered directly
    pub(crate) factory: Option<Arc<dyn DynFactory>>,
    pub(crate) instance: OnceCell<Instance>,
}

impl SingletonSlot {
    fn binding(&self, interface: TypeInfo) -> Binding {
        let implementation = match (&self.factory, self.instance.get()) {
            (Some(factory), _) => factory.implementation(),
            (None, Some(instance)) => instance.implementation,
            (None, None) => interface,
        };

        Binding {
            interface,
            implementation,
            lifetime: Lifetime::Singleton,
        }
    }
}

/// The lifetime tables, one map per policy keyed by interface
#[derive(Default)]
pub(crate) struct Registry {
    singletons: HashMap<TypeId, (TypeInfo, Arc<SingletonSlot>)>,
    scoped: HashMap<TypeId, (TypeInfo, Arc<dyn DynFactory>)>,
    transient: HashMap<TypeId, (TypeInfo, Arc<dyn DynFactory>)>,
}

impl Registry {
    pub(crate) fn insert(&mut self, lifetime: Lifetime, factory: Arc<dyn DynFactory>) {
        let interface = factory.interface();
        match lifetime {
            Lifetime::Singleton => {
                // An instance that was already handed out stays the singleton
                let built = self
                    .singletons
                    .get(&interface.type_id)
                    .and_then(|(_, slot)| slot.instance.get().cloned());

                let instance = OnceCell::new();
                if let Some(built) = built {
                    tracing::warn!(
                        "Singleton {} was already built, keeping the existing instance",
                        interface
                    );
                    let _ = instance.set(built);
                }

                let slot = SingletonSlot {
                    factory: Some(factory),
                    instance,
                };
                self.insert_singleton(interface, slot);
            }
            Lifetime::Scoped => {
                if self
                    .scoped
                    .insert(interface.type_id, (interface, factory))
                    .is_some()
                {
                    tracing::warn!("Replaced scoped binding for {}", interface);
                }
            }
            Lifetime::Transient => {
                if self
                    .transient
                    .insert(interface.type_id, (interface, factory))
                    .is_some()
                {
                    tracing::warn!("Replaced transient binding for {}", interface);
                }
            }
        }
    }

    /// Fails if a singleton of the interface was already built from a factory
    pub(crate) fn insert_instance(&mut self, instance: Instance) -> Result<(), RegisterError> {
        let interface = instance.info;
        if let Some((_, existing)) = self.singletons.get(&interface.type_id) {
            if existing.factory.is_some() && existing.instance.get().is_some() {
                return Err(RegisterError::AlreadyBuilt(interface));
            }
        }

        let slot = SingletonSlot {
            factory: None,
            instance: OnceCell::with_value(instance),
        };
        self.insert_singleton(interface, slot);
        Ok(())
    }

    fn insert_singleton(&mut self, interface: TypeInfo, slot: SingletonSlot) {
        if self
            .singletons
            .insert(interface.type_id, (interface, Arc::new(slot)))
            .is_some()
        {
            tracing::warn!("Replaced singleton binding for {}", interface);
        }
    }

    pub(crate) fn singleton(&self, interface: &TypeInfo) -> Option<Arc<SingletonSlot>> {
        self.singletons
            .get(&interface.type_id)
            .map(|(_, slot)| slot.clone())
    }

    pub(crate) fn scoped(&self, interface: &TypeInfo) -> Option<Arc<dyn DynFactory>> {
        self.scoped
            .get(&interface.type_id)
            .map(|(_, factory)| factory.clone())
    }

    pub(crate) fn transient(&self, interface: &TypeInfo) -> Option<Arc<dyn DynFactory>> {
        self.transient
            .get(&interface.type_id)
            .map(|(_, factory)| factory.clone())
    }

    /// All bindings, singletons first, in the order they would win resolution
    pub(crate) fn bindings(&self) -> Vec<Binding> {
        let singletons = self
            .singletons
            .values()
            .map(|(interface, slot)| slot.binding(*interface));

        let scoped = self.scoped.values().map(|(interface, factory)| Binding {
            interface: *interface,
            implementation: factory.implementation(),
            lifetime: Lifetime::Scoped,
        });

        let transient = self.transient.values().map(|(interface, factory)| Binding {
            interface: *interface,
            implementation: factory.implementation(),
            lifetime: Lifetime::Transient,
        });

        singletons.chain(scoped).chain(transient).collect()
    }

    /// The factory that wins resolution for the interface, `None` for plain instances
    pub(crate) fn winning_factory(&self, interface: &TypeInfo) -> Option<Arc<dyn DynFactory>> {
        if let Some((_, slot)) = self.singletons.get(&interface.type_id) {
            return slot.factory.clone();
        }
        self.scoped(interface).or_else(|| self.transient(interface))
    }
}
