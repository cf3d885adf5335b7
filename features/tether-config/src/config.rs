use std::{ops::Deref, sync::Arc};

use tether_di::{Argument, DependencyInfo, ResolveError, Resolver};

/// A wrapper type to allow for config injections
///
/// This provides a simple way to retrieve configs from the config registry,
/// and inject them on a factory as a dependency
///
/// # Example
/// ```rust
/// use tether_config::{Config, ConfigProvider};
/// use tether_di::{factory_fn, Container};
///
/// #[derive(Clone)]
/// pub struct MyModuleConfig {
///     enabled: bool,
/// }
///
/// struct MyModule {
///     enabled: bool,
/// }
///
/// let container = Container::new();
/// let mut config_provider = ConfigProvider::new();
/// config_provider
///     .add_config(MyModuleConfig { enabled: true })
///     .unwrap();
/// config_provider.register(&container).unwrap();
///
/// container
///     .register_singleton::<MyModule, _>(factory_fn(|config: Config<MyModuleConfig>| MyModule {
///         enabled: config.enabled,
///     }))
///     .unwrap();
///
/// assert!(container.provide::<MyModule>().unwrap().enabled);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Resolver for Config<T> {
    /// Configs are registered as instances of their own type by
    /// [ConfigProvider::register](crate::ConfigProvider::register)
    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required::<T>()
    }

    fn resolve(argument: Argument) -> Result<Self, ResolveError> {
        let inner = Arc::<T>::resolve(argument)?;
        Ok(Config { inner })
    }
}
