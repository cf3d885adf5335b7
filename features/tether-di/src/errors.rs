use std::sync::Arc;

use thiserror::Error;

use crate::types::{DynError, TypeInfo};

/// Errors when trying to resolve a certain type
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No lifetime table holds a binding for the type
    #[error("Interface or type '{0}' is not registered")]
    UnregisteredInterface(TypeInfo),

    /// A parameter which needs injection was declared without a type
    #[error("Type of parameter {position} ('{parameter}') of '{required_by}' is not specified")]
    MissingTypeAnnotation {
        parameter: &'static str,
        position: usize,
        required_by: &'static str,
    },

    /// The type is already being constructed further up the dependency chain
    #[error("Dependency cycle on '{interface}' through {}", display_chain(.chain))]
    UnboundRecursion {
        interface: TypeInfo,
        chain: Vec<TypeInfo>,
    },

    /// A Factory failed to build
    #[error("Factory for '{product}' failed - error: {error}")]
    FactoryFailed {
        product: TypeInfo,
        error: Arc<DynError>,
    },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// An explicit argument was supplied for a type no parameter declares
    #[error("'{required_by}' has no parameter of type '{argument}'")]
    UnmatchedArgument {
        argument: TypeInfo,
        required_by: &'static str,
    },

    /// A factory took more arguments than it declared
    #[error("'{required_by}' has no argument at position {position}")]
    MissingArgument {
        position: usize,
        required_by: &'static str,
    },

    /// Another thread panicked while holding the registry
    #[error("The container registry is poisoned")]
    Poisoned,
}

/// Errors when trying to register a binding
#[derive(Error, Debug, Clone)]
pub enum RegisterError {
    /// The implementation does not provide the interface it is bound to
    #[error("'{implementation}' can not be bound to '{interface}'")]
    InvalidBinding {
        interface: TypeInfo,
        implementation: TypeInfo,
    },

    /// The singleton was already built and handed out, the new instance would be ignored
    #[error("Singleton '{0}' was already built")]
    AlreadyBuilt(TypeInfo),

    /// Another thread panicked while holding the registry
    #[error("The container registry is poisoned")]
    Poisoned,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown lifetime '{0}', expected singleton, scoped or transient")]
pub struct ParseLifetimeError(pub String);

pub(crate) fn display_chain(chain: &[TypeInfo]) -> String {
    chain
        .iter()
        .map(|info| info.type_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}
