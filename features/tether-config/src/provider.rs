use std::{any::TypeId, collections::HashMap, sync::Arc};

use tether_di::{Container, Instance, RegisterError, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type.
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, Instance>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// Returns `None` if no config of this type was added
    pub fn get_config<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|instance| instance.downcast().ok())
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return a
    /// [`ConfigError`] runtime error
    pub fn add_config<T: Send + Sync + 'static>(
        &mut self,
        config: T,
    ) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();

        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!("Added config {}", info);
        self.configs
            .insert(info.type_id, Instance::new(Arc::new(config)));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Send + Sync + 'static>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    /// Names of all registered config types
    pub fn config_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .configs
            .values()
            .map(|instance| instance.info.type_name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Registers every config as a singleton instance of its own type, making
    /// [Config](crate::config::Config) parameters resolvable and visible to the dependency
    /// graph. The provider itself is registered too.
    pub fn register(self, container: &Container) -> Result<(), RegisterError> {
        for instance in self.configs.values() {
            container.register_dyn_instance(instance.clone())?;
        }
        container.register_instance(Arc::new(self))?;
        Ok(())
    }
}
