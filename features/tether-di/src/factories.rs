use std::{any::type_name, marker::PhantomData, sync::Arc};

use crate::{
    errors::ResolveError,
    resolver::{Arguments, Resolver},
    types::{DependencyInfo, DynError, Implements, Injectable, Instance, Interface, TypeInfo},
};

/// A Factory providing instances of a given type
///
/// # Example
/// ```rust
/// use tether_di::{Arguments, DependencyInfo, InstanceFactory};
/// use std::sync::Arc;
///
/// struct Greeting(String);
/// struct GreetingFactory;
///
/// impl InstanceFactory for GreetingFactory {
///     type Provides = Greeting;
///
///     fn get_dependencies() -> Vec<DependencyInfo> {
///         vec![DependencyInfo::required::<String>().named("name")]
///     }
///
///     fn construct(
///         &self,
///         mut args: Arguments,
///     ) -> Result<Self::Provides, impl Into<tether_di::DynError>> {
///         let name: Arc<String> = args.take()?;
///         Ok::<_, tether_di::ResolveError>(Greeting(format!("hello {name}")))
///     }
/// }
/// ```
pub trait InstanceFactory: Send + Sync + 'static {
    type Provides: Injectable;

    /// Returns the typeinfo about the factory's provided type
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Provides>()
    }

    /// Returns the parameters the factory requires, in the order `construct` takes them
    fn get_dependencies() -> Vec<DependencyInfo>;

    /// Constructs a new instance of the factory's provided type
    ///
    /// Returns the constructed instance, or an error if the Instantiation failed
    fn construct(&self, args: Arguments) -> Result<Self::Provides, impl Into<DynError>>;
}

/// Type erased factory bound to the interface it produces instances for
///
/// Implemented for every typed registration. Can be implemented by hand to register
/// factories described at runtime through [Container::register_dyn](crate::Container::register_dyn).
pub trait DynFactory: Send + Sync {
    /// The interface the produced instances are stored under
    fn interface(&self) -> TypeInfo;

    /// The concrete type being built
    fn implementation(&self) -> TypeInfo;

    /// Returns a list of parameters for the factory
    fn dependencies(&self) -> Vec<DependencyInfo>;

    /// Constructs a new instance from the resolved arguments
    fn construct(&self, args: Arguments) -> Result<Instance, ResolveError>;
}

/// A typed factory bound to one of the interfaces its product implements
pub(crate) struct Bound<I: ?Sized, F> {
    factory: Arc<F>,
    _interface: PhantomData<fn() -> Arc<I>>,
}

impl<I: ?Sized, F> Bound<I, F> {
    pub(crate) fn new(factory: Arc<F>) -> Self {
        Bound {
            factory,
            _interface: PhantomData,
        }
    }
}

impl<I, F> DynFactory for Bound<I, F>
where
    I: ?Sized + Interface,
    F: InstanceFactory,
    F::Provides: Implements<I>,
{
    fn interface(&self) -> TypeInfo {
        TypeInfo::of::<I>()
    }

    fn implementation(&self) -> TypeInfo {
        F::supplies()
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        F::get_dependencies()
    }

    fn construct(&self, args: Arguments) -> Result<Instance, ResolveError> {
        match self.factory.construct(args) {
            Ok(product) => Ok(Instance::of_implementation::<I, F::Provides>(product)),
            Err(err) => {
                let err: DynError = err.into();
                // Errors from resolving the arguments keep their original kind
                match err.downcast::<ResolveError>() {
                    Ok(resolve_error) => Err(*resolve_error),
                    Err(err) => Err(ResolveError::FactoryFailed {
                        product: F::supplies(),
                        error: Arc::new(err),
                    }),
                }
            }
        }
    }
}

/// A function whose parameters can all be supplied by the container
///
/// Implemented for functions and closures of up to 12 parameters, where each parameter
/// is a [Resolver], e.g. `Arc<dyn Trait>`, `Option<Arc<T>>` or [Value](crate::Value).
pub trait FactoryFn<Args> {
    type Output;

    /// The function's parameters in declaration order
    fn parameters() -> Vec<DependencyInfo>;

    /// Calls the function with the resolved arguments
    fn invoke(&self, args: &mut Arguments) -> Result<Self::Output, ResolveError>;
}

macro_rules! impl_factory_fn {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<Func, Out, $($arg),*> FactoryFn<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
            $($arg: Resolver,)*
        {
            type Output = Out;

            fn parameters() -> Vec<DependencyInfo> {
                vec![$($arg::dependency_info()),*]
            }

            fn invoke(&self, args: &mut Arguments) -> Result<Out, ResolveError> {
                $(let $arg = args.take::<$arg>()?;)*
                Ok(self($($arg),*))
            }
        }
    };
}
all_the_tuples!(impl_factory_fn);

/// Adapts a plain function or closure into an [InstanceFactory]
///
/// Created by [factory_fn].
pub struct FnFactory<F, Args> {
    func: F,
    _args: PhantomData<fn() -> Args>,
}

/// Turns a function whose parameters are injectable into a factory
///
/// ```rust
/// use std::sync::Arc;
/// use tether_di::{factory_fn, Container};
///
/// struct Port(u16);
/// struct Address(String);
///
/// let container = Container::new();
/// container.register_singleton::<Port, _>(factory_fn(|| Port(8080))).unwrap();
/// container
///     .register_transient::<Address, _>(factory_fn(|port: Arc<Port>| {
///         Address(format!("127.0.0.1:{}", port.0))
///     }))
///     .unwrap();
///
/// assert_eq!(container.provide::<Address>().unwrap().0, "127.0.0.1:8080");
/// ```
pub fn factory_fn<F, Args>(func: F) -> FnFactory<F, Args>
where
    F: FactoryFn<Args>,
{
    FnFactory {
        func,
        _args: PhantomData,
    }
}

impl<F, Args> InstanceFactory for FnFactory<F, Args>
where
    F: FactoryFn<Args> + Send + Sync + 'static,
    F::Output: Injectable,
    Args: 'static,
{
    type Provides = F::Output;

    fn get_dependencies() -> Vec<DependencyInfo> {
        F::parameters()
    }

    fn construct(&self, mut args: Arguments) -> Result<Self::Provides, impl Into<DynError>> {
        self.func.invoke(&mut args)
    }
}

impl<F, Args> std::fmt::Debug for FnFactory<F, Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FnFactory").field(&type_name::<F>()).finish()
    }
}
