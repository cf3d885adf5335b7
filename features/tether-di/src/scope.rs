use std::{any::TypeId, collections::HashMap, sync::Arc};

use crate::types::{Instance, Interface, TypeInfo};

/// Cache of scoped instances for a single resolution pass, e.g. one request
///
/// Every entry point creates a fresh scope unless one is passed in. Dropping the scope
/// drops its instances, scopes never see each other's entries.
#[derive(Default)]
pub struct Scope {
    instances: HashMap<TypeId, Instance>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance cached for the interface
    pub fn get(&self, interface: &TypeInfo) -> Option<Instance> {
        self.instances.get(&interface.type_id).cloned()
    }

    /// Caches an instance for the interface, replacing any previous one
    pub fn put(&mut self, interface: TypeInfo, instance: Instance) {
        tracing::trace!("Scope now holds {}", interface.type_name);
        self.instances.insert(interface.type_id, instance);
    }

    /// Seeds the scope with an instance of `I`
    ///
    /// Scoped bindings for `I` resolved in this scope will return it instead of building one.
    pub fn insert<I: ?Sized + Interface>(&mut self, instance: Arc<I>) {
        self.put(TypeInfo::of::<I>(), Instance::new(instance));
    }

    pub fn contains(&self, interface: &TypeInfo) -> bool {
        self.instances.contains_key(&interface.type_id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.instances.values().map(|instance| instance.info.type_name))
            .finish()
    }
}
