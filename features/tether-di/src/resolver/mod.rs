use std::collections::VecDeque;

use crate::{
    errors::ResolveError,
    types::{DependencyInfo, Instance},
};

pub mod arc;
pub mod value;

/// A parameter type the container knows how to supply
///
/// The container resolves the declared [DependencyInfo] and hands the outcome over as an
/// [Argument], the resolver then turns it into the parameter's value.
pub trait Resolver: Sized {
    /// Describes the parameter to the container
    fn dependency_info() -> DependencyInfo;

    /// Builds the parameter from the resolved argument
    fn resolve(argument: Argument) -> Result<Self, ResolveError>;
}

/// A resolved parameter
#[derive(Debug, Clone)]
pub struct Argument {
    /// The parameter this argument was resolved for
    pub info: DependencyInfo,
    /// Position in the parameter list
    pub position: usize,
    /// `None` for defaulted parameters and for optional ones whose type is not registered
    pub value: Option<Instance>,
}

/// Ordered arguments for a factory or injected function
#[derive(Debug)]
pub struct Arguments {
    required_by: &'static str,
    values: VecDeque<Argument>,
    taken: usize,
}

impl Arguments {
    pub(crate) fn new(required_by: &'static str, values: VecDeque<Argument>) -> Self {
        Arguments {
            required_by,
            values,
            taken: 0,
        }
    }

    /// Takes the next argument in declaration order as `R`
    pub fn take<R: Resolver>(&mut self) -> Result<R, ResolveError> {
        let argument = self.take_argument()?;
        R::resolve(argument)
    }

    /// Takes the next argument in declaration order without converting it
    pub fn take_argument(&mut self) -> Result<Argument, ResolveError> {
        let argument = self.values.pop_front().ok_or(ResolveError::MissingArgument {
            position: self.taken,
            required_by: self.required_by,
        })?;
        self.taken += 1;
        Ok(argument)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.values.iter()
    }
}
