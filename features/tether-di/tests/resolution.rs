use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use tether_di::{
    factory_fn, Arguments, Container, DependencyGraphError, DependencyInfo, DynError, DynFactory,
    Instance, InstanceFactory, Lifetime, RegisterError, Registration, ResolveError, Scope,
    TypeInfo, Value,
};

struct Port(u16);
struct Host(String);

struct Address {
    host: Arc<Host>,
    port: Arc<Port>,
}

fn address(host: Arc<Host>, port: Arc<Port>) -> Address {
    Address { host, port }
}

#[test]
fn unregistered_interface_fails() {
    let container = Container::new();

    let err = container.provide::<Port>().err().unwrap();
    assert!(matches!(err, ResolveError::UnregisteredInterface(info) if info == TypeInfo::of::<Port>()));
}

#[test]
fn missing_dependency_aborts_the_dependent() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(80)))
        .unwrap()
        .register_singleton::<Address, _>(factory_fn(address))
        .unwrap();

    let err = container.provide::<Address>().err().unwrap();
    assert!(matches!(err, ResolveError::UnregisteredInterface(info) if info == TypeInfo::of::<Host>()));

    // Nothing was cached for the failed singleton
    container
        .register_instance(Arc::new(Host("localhost".to_string())))
        .unwrap();
    let address = container.provide::<Address>().unwrap();
    assert_eq!(address.host.0, "localhost");
    assert_eq!(address.port.0, 80);
}

#[test]
fn singleton_wins_over_transient_regardless_of_order() {
    let built = Arc::new(AtomicUsize::new(0));
    let container = Container::new();

    let counter = built.clone();
    container
        .register_transient::<Port, _>(factory_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Port(1)
        }))
        .unwrap();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(2)))
        .unwrap();

    let first = container.provide::<Port>().unwrap();
    let second = container.provide::<Port>().unwrap();

    assert_eq!(first.0, 2);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn scoped_instance_in_scope_wins_over_transient() {
    let container = Container::new();
    container
        .register_transient::<Port, _>(factory_fn(|| Port(1)))
        .unwrap();

    let mut scope = Scope::new();
    scope.insert(Arc::new(Port(9)));

    assert_eq!(container.provide_in::<Port>(&mut scope).unwrap().0, 9);
    assert_eq!(container.provide::<Port>().unwrap().0, 1);
}

#[test]
fn cycles_fail_with_the_chain() {
    struct Chicken(#[allow(dead_code)] Arc<Egg>);
    struct Egg(#[allow(dead_code)] Arc<Chicken>);

    let container = Container::new();
    container
        .register_scoped::<Chicken, _>(factory_fn(|egg: Arc<Egg>| Chicken(egg)))
        .unwrap()
        .register_scoped::<Egg, _>(factory_fn(|chicken: Arc<Chicken>| Egg(chicken)))
        .unwrap();

    let err = container.provide::<Chicken>().err().unwrap();
    match err {
        ResolveError::UnboundRecursion { interface, chain } => {
            assert_eq!(interface, TypeInfo::of::<Chicken>());
            assert_eq!(
                chain,
                vec![
                    TypeInfo::of::<Chicken>(),
                    TypeInfo::of::<Egg>(),
                    TypeInfo::of::<Chicken>()
                ]
            );
        }
        other => panic!("expected a cycle error, got {other}"),
    }

    let errors = container.graph().unwrap().check().unwrap_err().errors;
    assert!(errors
        .iter()
        .any(|error| matches!(error, DependencyGraphError::CircularDependency { .. })));
}

#[test]
fn self_dependency_is_a_cycle() {
    struct Node;

    let container = Container::new();
    container
        .register_singleton::<Node, _>(factory_fn(|_node: Arc<Node>| Node))
        .unwrap();

    assert!(matches!(
        container.provide::<Node>(),
        Err(ResolveError::UnboundRecursion { .. })
    ));
}

#[test]
fn optional_and_defaulted_parameters() {
    struct Settings {
        port: Option<Arc<Port>>,
        retries: u32,
    }

    let container = Container::new();
    container
        .register_transient::<Settings, _>(factory_fn(
            |port: Option<Arc<Port>>, retries: Value<u32>| Settings {
                port,
                retries: retries.into_inner(),
            },
        ))
        .unwrap();

    let settings = container.provide::<Settings>().unwrap();
    assert!(settings.port.is_none());
    assert_eq!(settings.retries, 0);

    container
        .register_singleton::<Port, _>(factory_fn(|| Port(443)))
        .unwrap();
    let settings = container.provide::<Settings>().unwrap();
    assert_eq!(settings.port.as_ref().map(|port| port.0), Some(443));
}

#[test]
fn optional_parameter_still_fails_on_nested_errors() {
    let container = Container::new();
    container
        .register_transient::<Address, _>(factory_fn(address))
        .unwrap();

    let err = container
        .inject(|address: Option<Arc<Address>>| address.is_some())
        .call()
        .err()
        .unwrap();

    assert!(matches!(err, ResolveError::UnregisteredInterface(info) if info == TypeInfo::of::<Host>()));
}

#[test]
fn explicit_arguments_take_precedence() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let container = Container::new();
    container
        .register_scoped::<Port, _>(factory_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Port(80)
        }))
        .unwrap()
        .register_instance(Arc::new(Host("example.org".to_string())))
        .unwrap();

    let render = container
        .inject(|host: Arc<Host>, port: Arc<Port>| format!("{}:{}", host.0, port.0))
        .with_argument(Arc::new(Port(8443)));

    assert_eq!(render.call().unwrap(), "example.org:8443");
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn explicit_arguments_fill_value_parameters() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(80)))
        .unwrap();

    let connect = container
        .inject(|retries: Value<u32>, port: Arc<Port>| (retries.into_inner(), port.0));

    assert_eq!(connect.call().unwrap(), (0, 80));

    let connect = connect.with_argument(Arc::new(5_u32));
    assert_eq!(connect.call().unwrap(), (5, 80));
}

#[test]
fn explicit_argument_without_matching_parameter_fails() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(80)))
        .unwrap();

    let err = container
        .inject(|port: Arc<Port>| port.0)
        .with_argument(Arc::new("localhost".to_string()))
        .call()
        .err()
        .unwrap();

    assert!(matches!(
        err,
        ResolveError::UnmatchedArgument { argument, .. } if argument == TypeInfo::of::<String>()
    ));
}

#[test]
fn provide_many_shares_one_scope() {
    let container = Container::new();
    container
        .register_scoped::<Port, _>(factory_fn(|| Port(80)))
        .unwrap()
        .register_instance(Arc::new(Host("localhost".to_string())))
        .unwrap()
        .register_transient::<Address, _>(factory_fn(address))
        .unwrap();

    let (port, address) = container.provide_all::<(Arc<Port>, Arc<Address>)>().unwrap();
    assert!(Arc::ptr_eq(&port, &address.port));

    let mut scope = Scope::new();
    let instances = container
        .provide_instances(
            &[TypeInfo::of::<Port>(), TypeInfo::of::<Address>()],
            &mut scope,
        )
        .unwrap();
    assert_eq!(instances.len(), 2);
    let port = instances.get::<Port>().unwrap();
    let address = instances.get::<Address>().unwrap();
    assert!(Arc::ptr_eq(&port, &address.port));
    assert!(instances.get::<Host>().is_none());
}

/// A factory described at runtime, its parameters are not known to the compiler
struct LegacyFactory {
    interface: TypeInfo,
    parameters: Vec<DependencyInfo>,
}

impl DynFactory for LegacyFactory {
    fn interface(&self) -> TypeInfo {
        self.interface
    }

    fn implementation(&self) -> TypeInfo {
        TypeInfo::of::<Host>()
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        self.parameters.clone()
    }

    fn construct(&self, _args: Arguments) -> Result<Instance, ResolveError> {
        Ok(Instance::new(Arc::new(Host("legacy".to_string()))))
    }
}

#[test]
fn register_dyn_checks_the_interface() {
    let container = Container::new();

    let err = container
        .register_dyn(
            Lifetime::Transient,
            TypeInfo::of::<Port>(),
            Arc::new(LegacyFactory {
                interface: TypeInfo::of::<Host>(),
                parameters: vec![],
            }),
        )
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RegisterError::InvalidBinding { interface, implementation }
            if interface == TypeInfo::of::<Port>() && implementation == TypeInfo::of::<Host>()
    ));

    container
        .register_dyn(
            Lifetime::Transient,
            TypeInfo::of::<Host>(),
            Arc::new(LegacyFactory {
                interface: TypeInfo::of::<Host>(),
                parameters: vec![DependencyInfo::with_default::<u32>().named("retries")],
            }),
        )
        .unwrap();
    assert_eq!(container.provide::<Host>().unwrap().0, "legacy");
}

#[test]
fn untyped_constructor_parameter_fails() {
    let container = Container::new();
    container
        .register_dyn(
            Lifetime::Scoped,
            TypeInfo::of::<Host>(),
            Arc::new(LegacyFactory {
                interface: TypeInfo::of::<Host>(),
                parameters: vec![DependencyInfo::untyped("name")],
            }),
        )
        .unwrap();

    let err = container.provide::<Host>().err().unwrap();
    assert!(matches!(
        err,
        ResolveError::MissingTypeAnnotation { parameter: "name", position: 0, .. }
    ));
}

#[test]
fn untyped_function_parameter_fails() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(80)))
        .unwrap();

    let parameters = [
        DependencyInfo::required::<Port>().named("port"),
        DependencyInfo::untyped("host"),
    ];
    let err = container
        .call_with(&parameters, &mut Scope::new(), |_args| ())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        ResolveError::MissingTypeAnnotation { parameter: "host", position: 1, .. }
    ));

    let port = container
        .call_with(&parameters[..1], &mut Scope::new(), |mut args| {
            args.take::<Arc<Port>>()
        })
        .unwrap()
        .unwrap();
    assert_eq!(port.0, 80);
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
struct ConnectionRefused;

struct Connection;
struct ConnectionFactory;

impl InstanceFactory for ConnectionFactory {
    type Provides = Connection;

    fn get_dependencies() -> Vec<DependencyInfo> {
        vec![]
    }

    fn construct(&self, _args: Arguments) -> Result<Self::Provides, impl Into<DynError>> {
        Err::<Connection, _>(ConnectionRefused)
    }
}

#[test]
fn factory_errors_propagate_to_dependents() {
    struct Pool(#[allow(dead_code)] Arc<Connection>);

    let container = Container::new();
    container
        .register_singleton::<Connection, _>(ConnectionFactory)
        .unwrap()
        .register_scoped::<Pool, _>(factory_fn(|connection: Arc<Connection>| Pool(connection)))
        .unwrap();

    let err = container.provide::<Pool>().err().unwrap();
    match err {
        ResolveError::FactoryFailed { product, error } => {
            assert_eq!(product, TypeInfo::of::<Connection>());
            assert_eq!(error.to_string(), "connection refused");
        }
        other => panic!("expected a factory failure, got {other}"),
    }
}

#[test]
fn manual_factory_receives_declared_dependencies() {
    struct Greeting(String);
    struct GreetingFactory;

    impl InstanceFactory for GreetingFactory {
        type Provides = Greeting;

        fn get_dependencies() -> Vec<DependencyInfo> {
            vec![DependencyInfo::required::<Host>().named("host")]
        }

        fn construct(&self, mut args: Arguments) -> Result<Self::Provides, impl Into<DynError>> {
            args.take::<Arc<Host>>()
                .map(|host| Greeting(format!("hello {}", host.0)))
        }
    }

    let container = Container::new();
    container
        .register_instance(Arc::new(Host("world".to_string())))
        .unwrap()
        .register_transient::<Greeting, _>(GreetingFactory)
        .unwrap();

    assert_eq!(container.provide::<Greeting>().unwrap().0, "hello world");
}

#[test]
fn concurrent_first_resolution_builds_singleton_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(10));
            Port(80)
        }))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let container = container.clone();
            thread::spawn(move || container.provide::<Port>().unwrap())
        })
        .collect();
    let ports: Vec<Arc<Port>> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(ports.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn async_functions_are_injected_before_polling() {
    let container = Container::new();
    container
        .register_instance(Arc::new(Host("async".to_string())))
        .unwrap();

    let future = container
        .inject(|host: Arc<Host>| async move { host.0.len() })
        .call()
        .unwrap();

    assert_eq!(futures::executor::block_on(future), 5);
}

#[test]
fn graph_lists_bindings_and_missing_dependencies() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(80)))
        .unwrap()
        .register_transient::<Address, _>(factory_fn(address))
        .unwrap();

    let graph = container.graph().unwrap();
    assert_eq!(graph.len(), 2);
    assert!(graph.contains(&TypeInfo::of::<Address>()));

    let errors = graph.check().unwrap_err().errors;
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        DependencyGraphError::MissingDependency { dependency, .. } if dependency == TypeInfo::of::<Host>()
    ));
}

#[test]
fn global_container_accepts_registrations() {
    struct GlobalMarker;

    Registration::singleton(factory_fn(|| GlobalMarker))
        .register_global()
        .unwrap();

    let first = Container::global().provide::<GlobalMarker>().unwrap();
    let second = Container::global().provide::<GlobalMarker>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn later_transient_registration_replaces_the_earlier_one() {
    let container = Container::new();
    container
        .register_transient::<Port, _>(factory_fn(|| Port(1)))
        .unwrap()
        .register_transient::<Port, _>(factory_fn(|| Port(2)))
        .unwrap();

    assert_eq!(container.provide::<Port>().unwrap().0, 2);
    assert_eq!(container.bindings().unwrap().len(), 1);
}

#[test]
fn built_singleton_survives_re_registration() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(3)))
        .unwrap();
    let before = container.provide::<Port>().unwrap();

    container
        .register_singleton::<Port, _>(factory_fn(|| Port(4)))
        .unwrap();
    let after = container.provide::<Port>().unwrap();

    assert_eq!(after.0, 3);
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn unbuilt_singleton_is_replaced_by_re_registration() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(3)))
        .unwrap()
        .register_singleton::<Port, _>(factory_fn(|| Port(4)))
        .unwrap();

    assert_eq!(container.provide::<Port>().unwrap().0, 4);
}

#[test]
fn instance_for_built_singleton_is_rejected() {
    let container = Container::new();
    container
        .register_singleton::<Port, _>(factory_fn(|| Port(3)))
        .unwrap();
    let built = container.provide::<Port>().unwrap();

    let err = container.register_instance(Arc::new(Port(9))).err().unwrap();
    assert!(matches!(err, RegisterError::AlreadyBuilt(info) if info == TypeInfo::of::<Port>()));

    let after = container.provide::<Port>().unwrap();
    assert!(Arc::ptr_eq(&built, &after));
}

#[test]
fn instance_replaces_earlier_instance() {
    let container = Container::new();
    container
        .register_instance(Arc::new(Host("first".to_string())))
        .unwrap()
        .register_instance(Arc::new(Host("second".to_string())))
        .unwrap();

    assert_eq!(container.provide::<Host>().unwrap().0, "second");
}

struct Reentrant;

/// Resolves its own product from the container while constructing it
struct ReentrantFactory(Container);

impl InstanceFactory for ReentrantFactory {
    type Provides = Reentrant;

    fn get_dependencies() -> Vec<DependencyInfo> {
        vec![]
    }

    fn construct(&self, _args: Arguments) -> Result<Self::Provides, impl Into<DynError>> {
        self.0.provide::<Reentrant>().map(|_| Reentrant)
    }
}

#[test]
fn factory_resolving_itself_is_a_cycle() {
    for lifetime in [Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient] {
        let container = Container::new();
        Registration::new(lifetime, ReentrantFactory(container.clone()))
            .register(&container)
            .unwrap();

        let err = container.provide::<Reentrant>().err().unwrap();
        match err {
            ResolveError::UnboundRecursion { interface, chain } => {
                assert_eq!(interface, TypeInfo::of::<Reentrant>());
                assert_eq!(
                    chain,
                    vec![TypeInfo::of::<Reentrant>(), TypeInfo::of::<Reentrant>()]
                );
            }
            other => panic!("expected a cycle error for {lifetime}, got {other}"),
        }

    }

    // Nothing stays marked as under construction on this thread
    let container = Container::new();
    container
        .register_transient::<Reentrant, _>(factory_fn(|| Reentrant))
        .unwrap();
    assert!(container.provide::<Reentrant>().is_ok());
}
