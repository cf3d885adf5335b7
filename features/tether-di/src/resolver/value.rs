use std::{
    any::type_name,
    ops::{Deref, DerefMut},
};

use crate::{
    errors::ResolveError,
    resolver::{Argument, Resolver},
    types::DependencyInfo,
};

/// A plain value parameter which is never injected
///
/// The container skips it during resolution and the parameter receives `T::default()`,
/// unless the caller supplied an explicit `Arc<T>` with
/// [Inject::with_argument](crate::Inject::with_argument), which is cloned out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Value<T>(pub T);

impl<T> Value<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Value<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Value<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Resolver for Value<T> {
    fn dependency_info() -> DependencyInfo {
        DependencyInfo::with_default::<T>()
    }

    fn resolve(argument: Argument) -> Result<Self, ResolveError> {
        let Some(explicit) = argument.value else {
            return Ok(Value(T::default()));
        };

        explicit
            .downcast::<T>()
            .map(|value| Value(T::clone(&value)))
            .map_err(|actual_type| ResolveError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }
}
