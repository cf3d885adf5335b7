use std::{any::type_name, sync::Arc};

use crate::{
    errors::ResolveError,
    resolver::{Argument, Resolver},
    types::{DependencyInfo, Interface, TypeInfo},
};

impl<T: ?Sized + Interface> Resolver for Arc<T> {
    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required::<T>()
    }

    fn resolve(argument: Argument) -> Result<Self, ResolveError> {
        let instance = argument
            .value
            .ok_or(ResolveError::UnregisteredInterface(TypeInfo::of::<T>()))?;

        instance
            .downcast::<T>()
            .map_err(|actual_type| ResolveError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }
}

impl<Resolvable: Resolver> Resolver for Option<Resolvable> {
    fn dependency_info() -> DependencyInfo {
        let original = Resolvable::dependency_info();
        DependencyInfo {
            optional: true,
            ..original
        }
    }

    fn resolve(argument: Argument) -> Result<Self, ResolveError> {
        // The container leaves optional arguments empty if the type is not registered
        match argument.value {
            Some(_) => Resolvable::resolve(argument).map(Some),
            None => Ok(None),
        }
    }
}
