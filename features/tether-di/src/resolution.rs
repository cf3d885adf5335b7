use std::{
    any::TypeId,
    cell::RefCell,
    collections::{HashMap, VecDeque},
};

use crate::{
    container::Container,
    errors::ResolveError,
    factories::DynFactory,
    registry::SingletonSlot,
    resolver::{Argument, Arguments},
    scope::Scope,
    types::{DependencyInfo, Instance, TypeInfo},
};

/// Explicitly supplied arguments, keyed by the interface they stand in for
pub(crate) type Overrides = HashMap<TypeId, Instance>;

thread_local! {
    /// Interfaces under construction on this thread, outermost first
    ///
    /// Shared by every pass on the thread, so a factory that resolves from its own
    /// container again still hits the cycle check.
    static CONSTRUCTING: RefCell<Vec<TypeInfo>> = const { RefCell::new(Vec::new()) };
}

/// Marks an interface as under construction until dropped
struct ConstructionGuard;

impl ConstructionGuard {
    fn enter(interface: TypeInfo) -> Self {
        CONSTRUCTING.with(|chain| chain.borrow_mut().push(interface));
        ConstructionGuard
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        CONSTRUCTING.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// The current chain with `interface` appended, if `interface` is already on it
fn cycle_through(interface: TypeInfo) -> Option<Vec<TypeInfo>> {
    CONSTRUCTING.with(|chain| {
        let chain = chain.borrow();
        let start = chain.iter().position(|info| *info == interface)?;
        let mut cycle = chain[start..].to_vec();
        cycle.push(interface); // Add current so chain is complete
        Some(cycle)
    })
}

/// A single resolution pass against one [Scope]
pub(crate) struct Resolution<'a> {
    container: &'a Container,
    scope: &'a mut Scope,
}

impl<'a> Resolution<'a> {
    pub(crate) fn new(container: &'a Container, scope: &'a mut Scope) -> Self {
        Resolution { container, scope }
    }

    /// Produces an instance of the interface
    ///
    /// Lookup order: built singleton, singleton binding, scope cache, scoped binding,
    /// transient binding. The order does not depend on the order of registration.
    pub(crate) fn resolve(&mut self, interface: TypeInfo) -> Result<Instance, ResolveError> {
        // Checked before the singleton cell, re-entering it would block forever
        if let Some(chain) = cycle_through(interface) {
            return Err(ResolveError::UnboundRecursion { interface, chain });
        }

        // Registry guards are dropped before anything gets built
        let singleton = self.container.read_registry()?.singleton(&interface);
        if let Some(slot) = singleton {
            return self.resolve_singleton(interface, &slot);
        }

        if let Some(instance) = self.scope.get(&interface) {
            tracing::trace!("Reusing scoped instance of {}", interface);
            return Ok(instance);
        }

        let scoped = self.container.read_registry()?.scoped(&interface);
        if let Some(factory) = scoped {
            let instance = self.instantiate(interface, factory.as_ref())?;
            self.scope.put(interface, instance.clone());
            return Ok(instance);
        }

        let transient = self.container.read_registry()?.transient(&interface);
        if let Some(factory) = transient {
            return self.instantiate(interface, factory.as_ref());
        }

        Err(ResolveError::UnregisteredInterface(interface))
    }

    fn resolve_singleton(
        &mut self,
        interface: TypeInfo,
        slot: &SingletonSlot,
    ) -> Result<Instance, ResolveError> {
        if let Some(instance) = slot.instance.get() {
            tracing::trace!("Reusing singleton instance of {}", interface);
            return Ok(instance.clone());
        }

        let Some(factory) = &slot.factory else {
            // Instance slots are always filled on registration
            return Err(ResolveError::UnregisteredInterface(interface));
        };

        // The cell makes sure concurrent first resolutions build only once
        slot.instance
            .get_or_try_init(|| self.instantiate(interface, factory.as_ref()))
            .cloned()
    }

    /// Builds an implementation, resolving its declared parameters first
    fn instantiate(
        &mut self,
        interface: TypeInfo,
        factory: &dyn DynFactory,
    ) -> Result<Instance, ResolveError> {
        let implementation = factory.implementation();
        tracing::trace!("Building {} for {}", implementation, interface);

        let result = {
            let _guard = ConstructionGuard::enter(interface);
            self.resolve_parameters(implementation.type_name, &factory.dependencies(), None)
                .and_then(|args| factory.construct(args))
        };

        match result {
            Ok(instance) if instance.info != interface => Err(ResolveError::DowncastFailed {
                required_type: interface.type_name,
                actual_type: instance.info.type_name,
            }),
            Ok(instance) => {
                tracing::debug!("Constructed instance of {} for {}", implementation, interface);
                Ok(instance)
            }
            Err(err) => {
                // Only log where the failure originated, not for every dependent
                if matches!(&err, ResolveError::FactoryFailed { product, .. } if *product == implementation)
                {
                    tracing::error!("{}", err);
                }
                Err(err)
            }
        }
    }

    /// Resolves a parameter list in declaration order
    ///
    /// Explicit arguments in `overrides` win over everything else. Otherwise defaulted
    /// parameters are skipped, parameters without a type fail, optional ones stay empty
    /// if their own type is not registered.
    pub(crate) fn resolve_parameters(
        &mut self,
        required_by: &'static str,
        parameters: &[DependencyInfo],
        overrides: Option<&Overrides>,
    ) -> Result<Arguments, ResolveError> {
        let mut values = VecDeque::with_capacity(parameters.len());

        for (position, info) in parameters.iter().enumerate() {
            let explicit = info.type_info.and_then(|type_info| {
                overrides.and_then(|overrides| overrides.get(&type_info.type_id))
            });

            let value = match (explicit, info.type_info) {
                (Some(explicit), _) => Some(explicit.clone()),
                (None, _) if info.has_default => None,
                (None, None) => {
                    return Err(ResolveError::MissingTypeAnnotation {
                        parameter: info.name,
                        position,
                        required_by,
                    })
                }
                (None, Some(type_info)) => match self.resolve(type_info) {
                    Ok(instance) => Some(instance),
                    Err(ResolveError::UnregisteredInterface(missing))
                        if info.optional && missing == type_info =>
                    {
                        None
                    }
                    Err(err) => return Err(err),
                },
            };

            values.push_back(Argument {
                info: *info,
                position,
                value,
            });
        }

        Ok(Arguments::new(required_by, values))
    }
}
