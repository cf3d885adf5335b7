use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    container::Container,
    errors::ResolveError,
    factories::FactoryFn,
    resolution::{Overrides, Resolution},
    resolver::{Arguments, Resolver},
    scope::Scope,
    types::{DependencyInfo, Instance, Interface, TypeInfo},
};

/// A function wrapped for injection, created by [Container::inject]
///
/// Every call resolves the function's parameters and invokes it. Arguments supplied
/// with [Inject::with_argument] win over injected ones.
pub struct Inject<F, Args> {
    container: Container,
    func: F,
    arguments: Overrides,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> Inject<F, Args>
where
    F: FactoryFn<Args>,
{
    /// Supplies the argument for every parameter of type `Arc<I>` instead of resolving it
    ///
    /// Also fills `Option<Arc<I>>` and `Value<I>` parameters.
    pub fn with_argument<I: ?Sized + Interface>(mut self, argument: Arc<I>) -> Self {
        self.arguments
            .insert(TypeId::of::<I>(), Instance::new(argument));
        self
    }

    /// Calls the function within a fresh scope
    pub fn call(&self) -> Result<F::Output, ResolveError> {
        self.call_in(&mut Scope::new())
    }

    /// Calls the function within the given scope
    ///
    /// Fails with [ResolveError::UnmatchedArgument] if an explicit argument fits none of
    /// the function's parameters.
    pub fn call_in(&self, scope: &mut Scope) -> Result<F::Output, ResolveError> {
        let parameters = F::parameters();

        let unmatched = self.arguments.values().find(|argument| {
            !parameters
                .iter()
                .any(|parameter| parameter.type_info == Some(argument.info))
        });
        if let Some(argument) = unmatched {
            return Err(ResolveError::UnmatchedArgument {
                argument: argument.info,
                required_by: type_name::<F>(),
            });
        }

        let mut args = Resolution::new(&self.container, scope).resolve_parameters(
            type_name::<F>(),
            &parameters,
            Some(&self.arguments),
        )?;
        self.func.invoke(&mut args)
    }

    /// The parameters that will be resolved on every call
    pub fn parameters(&self) -> Vec<DependencyInfo> {
        F::parameters()
    }
}

/// A set of dependencies which can be provided together, sharing one scope
///
/// Implemented for tuples of [Resolver]s, e.g. `(Arc<dyn Repository>, Arc<dyn Service>)`.
pub trait Provide: Sized {
    fn parameters() -> Vec<DependencyInfo>;

    fn from_arguments(args: &mut Arguments) -> Result<Self, ResolveError>;
}

macro_rules! impl_provide {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($arg),*> Provide for ($($arg,)*)
        where
            $($arg: Resolver,)*
        {
            fn parameters() -> Vec<DependencyInfo> {
                vec![$($arg::dependency_info()),*]
            }

            fn from_arguments(args: &mut Arguments) -> Result<Self, ResolveError> {
                $(let $arg = args.take::<$arg>()?;)*
                Ok(($($arg,)*))
            }
        }
    };
}
all_the_tuples!(impl_provide);

/// Instances provided for a list of interfaces, see [Container::provide_instances]
#[derive(Debug, Default, Clone)]
pub struct Instances {
    instances: HashMap<TypeId, Instance>,
}

impl Instances {
    /// The instance provided for `I`
    pub fn get<I: ?Sized + Interface>(&self) -> Option<Arc<I>> {
        self.instances
            .get(&TypeId::of::<I>())
            .and_then(|instance| instance.downcast().ok())
    }

    pub fn get_instance(&self, interface: &TypeInfo) -> Option<&Instance> {
        self.instances.get(&interface.type_id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.values()
    }
}

impl Container {
    /// Wraps a function so that its parameters are supplied by the container on every call
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use tether_di::{factory_fn, Container};
    ///
    /// struct Counter(u32);
    ///
    /// let container = Container::new();
    /// container.register_scoped::<Counter, _>(factory_fn(|| Counter(3))).unwrap();
    ///
    /// let handler = container.inject(|counter: Arc<Counter>| counter.0 * 2);
    /// assert_eq!(handler.call().unwrap(), 6);
    /// ```
    pub fn inject<F, Args>(&self, func: F) -> Inject<F, Args>
    where
        F: FactoryFn<Args>,
    {
        Inject {
            container: self.clone(),
            func,
            arguments: HashMap::new(),
            _args: PhantomData,
        }
    }

    /// Provides a single instance of `I` from a fresh scope
    pub fn provide<I: ?Sized + Interface>(&self) -> Result<Arc<I>, ResolveError> {
        self.provide_in::<I>(&mut Scope::new())
    }

    /// Provides a single instance of `I` from the given scope
    pub fn provide_in<I: ?Sized + Interface>(
        &self,
        scope: &mut Scope,
    ) -> Result<Arc<I>, ResolveError> {
        self.resolve::<I>(scope)
    }

    /// Provides several dependencies at once from a fresh scope, in order
    pub fn provide_all<P: Provide>(&self) -> Result<P, ResolveError> {
        self.provide_all_in(&mut Scope::new())
    }

    /// Provides several dependencies at once from the given scope, in order
    pub fn provide_all_in<P: Provide>(&self, scope: &mut Scope) -> Result<P, ResolveError> {
        let mut args =
            Resolution::new(self, scope).resolve_parameters(type_name::<P>(), &P::parameters(), None)?;
        P::from_arguments(&mut args)
    }

    /// Provides an instance for every interface in the list, keyed by interface
    pub fn provide_instances(
        &self,
        interfaces: &[TypeInfo],
        scope: &mut Scope,
    ) -> Result<Instances, ResolveError> {
        let mut resolution = Resolution::new(self, scope);
        let instances = interfaces
            .iter()
            .map(|interface| Ok((interface.type_id, resolution.resolve(*interface)?)))
            .collect::<Result<HashMap<_, _>, ResolveError>>()?;

        Ok(Instances { instances })
    }
}
