use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// All factory errors are boxed so they can cross threads
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Concrete types the container can build.
///
/// Instances are shared between threads behind an `Arc`, so anything injectable needs to be
/// Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Anything that can be requested from the container, trait objects included.
///
/// For a trait to be usable as an interface, `dyn Trait` must be Send + Sync -
/// declare the trait as `trait Repository: Send + Sync`.
pub trait Interface: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Interface for T {}

/// Marks an implementation as satisfying an interface.
///
/// Every injectable type implements its own interface. Implementations of trait objects
/// are declared with [`implements!`](crate::implements).
pub trait Implements<I: ?Sized + Interface>: Injectable {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}
impl<T: Injectable> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// An instance produced for an interface
///
/// Holds an `Arc<I>` where `I` is the interface it was produced for, cloning an
/// [Instance] never clones the underlying value.
#[derive(Clone)]
pub struct Instance {
    /// The interface this instance was produced for
    pub info: TypeInfo,
    /// The concrete type behind the interface
    pub implementation: TypeInfo,
    handle: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wraps an already shared instance of an interface
    pub fn new<I: ?Sized + Interface>(instance: Arc<I>) -> Self {
        Instance {
            info: TypeInfo::of::<I>(),
            implementation: TypeInfo::of::<I>(),
            handle: Arc::new(instance),
        }
    }

    /// Wraps a freshly constructed implementation as an instance of `I`
    pub fn of_implementation<I: ?Sized + Interface, T: Implements<I>>(implementation: T) -> Self {
        Instance {
            info: TypeInfo::of::<I>(),
            implementation: TypeInfo::of::<T>(),
            handle: Arc::new(<T as Implements<I>>::upcast(Arc::new(implementation))),
        }
    }

    /// Returns the instance as the interface it was produced for
    ///
    /// On failure the name of the interface actually held is returned.
    pub fn downcast<I: ?Sized + Interface>(&self) -> Result<Arc<I>, &'static str> {
        self.handle
            .downcast_ref::<Arc<I>>()
            .cloned()
            .ok_or(self.info.type_name)
    }

    /// Whether both point to the same constructed value
    pub fn same_as(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("interface", &self.info.type_name)
            .field("implementation", &self.implementation.type_name)
            .finish()
    }
}

/// A single declared parameter of a factory or injected function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyInfo {
    /// Parameter name, empty if unknown
    pub name: &'static str,
    /// The declared type - `None` if the parameter was declared without one
    pub type_info: Option<TypeInfo>,
    /// If it is optional or required
    pub optional: bool,
    /// If the parameter brings its own default and is never injected
    pub has_default: bool,
}

impl DependencyInfo {
    /// A required dependency on `I`
    pub fn required<I: ?Sized + Interface>() -> Self {
        DependencyInfo {
            name: "",
            type_info: Some(TypeInfo::of::<I>()),
            optional: false,
            has_default: false,
        }
    }

    /// A dependency on `I` which resolves to nothing when `I` is not registered
    pub fn optional<I: ?Sized + Interface>() -> Self {
        DependencyInfo {
            optional: true,
            ..Self::required::<I>()
        }
    }

    /// A plain value of type `T` which is filled in by the factory itself
    pub fn with_default<T: ?Sized + 'static>() -> Self {
        DependencyInfo {
            name: "",
            type_info: Some(TypeInfo::of::<T>()),
            optional: false,
            has_default: true,
        }
    }

    /// A parameter without a declared type, it can never be injected
    pub fn untyped(name: &'static str) -> Self {
        DependencyInfo {
            name,
            type_info: None,
            optional: false,
            has_default: false,
        }
    }

    pub fn named(self, name: &'static str) -> Self {
        DependencyInfo { name, ..self }
    }

    /// Whether the container has to supply this parameter
    pub fn is_injected(&self) -> bool {
        !self.has_default
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}
