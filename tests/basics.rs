use argon_di::{Blueprint, Constructor, DiError, Lifetime, Resolver, ServiceRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn instance_registration_returns_same_value() {
    let mut services = ServiceRegistry::new();
    services.register_instance(42usize);
    services.register_instance("hello".to_string());

    let container = services.build();

    let num1 = container.get_instance::<usize>().unwrap();
    let num2 = container.get_instance::<usize>().unwrap();
    let text = container.get_instance::<String>().unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(*text, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
}

#[test]
fn factory_resolves_dependencies_through_context() {
    struct Config {
        port: u16,
    }
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut services = ServiceRegistry::new();
    services.register_instance(Config { port: 8080 });
    services.register_factory(Lifetime::PerContainer, |ctx| Server {
        config: ctx.get_instance::<Config>().unwrap(),
        name: "main".to_string(),
    });

    let container = services.build();
    let server = container.get_instance::<Server>().unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "main");
}

#[test]
fn named_registrations_are_distinct() {
    let mut services = ServiceRegistry::new();
    services.register_instance(1u32);
    services.register_named_instance("low", 2u32);
    services.register_named_instance("high", 3u32);

    let container = services.build();

    assert_eq!(*container.get_instance::<u32>().unwrap(), 1);
    assert_eq!(*container.get_named_instance::<u32>("low").unwrap(), 2);
    assert_eq!(*container.get_named_instance::<u32>("high").unwrap(), 3);
    assert!(matches!(
        container.get_named_instance::<u32>("missing"),
        Err(DiError::UnableToResolve(_))
    ));
}

#[test]
fn trait_registration_resolves_implementation() {
    trait Logger: Send + Sync {
        fn tag(&self) -> &'static str;
    }

    struct ConsoleLogger;
    impl Logger for ConsoleLogger {
        fn tag(&self) -> &'static str {
            "console"
        }
    }

    let mut services = ServiceRegistry::new();
    services.register_trait::<dyn Logger, _, _>(
        Lifetime::PerContainer,
        Blueprint::new().constructor(Constructor::new().build(|_| Ok(ConsoleLogger))),
        |logger| logger as Arc<dyn Logger>,
    );

    let container = services.build();
    let logger = container.get_trait_instance::<dyn Logger>().unwrap();
    assert_eq!(logger.tag(), "console");
}

#[test]
fn trait_instance_registration() {
    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);
    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    let mut services = ServiceRegistry::new();
    services.register_trait_instance::<dyn Clock>(Arc::new(FixedClock(99)));

    let container = services.build();
    let a = container.get_trait_instance::<dyn Clock>().unwrap();
    let b = container.get_trait_instance::<dyn Clock>().unwrap();

    assert_eq!(a.now(), 99);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn reregistering_a_key_replaces_the_registration() {
    let mut services = ServiceRegistry::new();
    services.register_instance(1u64);
    services.register_instance(2u64);

    let container = services.build();
    assert_eq!(*container.get_instance::<u64>().unwrap(), 2);
}

#[test]
fn unregistered_service_fails_with_unable_to_resolve() {
    struct Missing;

    let container = ServiceRegistry::new().build();
    match container.get_instance::<Missing>() {
        Err(DiError::UnableToResolve(key)) => {
            assert!(key.display_name().contains("Missing"));
            assert_eq!(key.service_name(), None);
        }
        _ => panic!("expected UnableToResolve"),
    }
}

#[test]
fn compiled_factory_is_reused_after_first_resolution() {
    // The factory body runs per transient resolution, but the blueprint
    // assembly only re-runs the constructor closure; repeated resolutions
    // go through the cached compiled factory, so results stay consistent
    // and cheap.
    let built = Arc::new(AtomicUsize::new(0));
    let seen = built.clone();

    struct Widget(usize);

    let mut services = ServiceRegistry::new();
    services.register::<Widget>(
        Lifetime::Transient,
        Blueprint::new().constructor(Constructor::new().build(move |_| {
            Ok(Widget(seen.fetch_add(1, Ordering::SeqCst) + 1))
        })),
    );

    let container = services.build();
    for expected in 1..=5 {
        let widget = container.get_instance::<Widget>().unwrap();
        assert_eq!(widget.0, expected);
    }
    assert_eq!(built.load(Ordering::SeqCst), 5);
}

#[test]
fn blueprint_with_named_and_trait_params() {
    trait Backend: Send + Sync {
        fn id(&self) -> u8;
    }
    struct Primary;
    impl Backend for Primary {
        fn id(&self) -> u8 {
            7
        }
    }

    struct Gateway {
        backend: Arc<dyn Backend>,
        retries: Arc<u32>,
    }

    let mut services = ServiceRegistry::new();
    services.register_trait_instance::<dyn Backend>(Arc::new(Primary));
    services.register_named_instance("retries", 3u32);
    services.register::<Gateway>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .param::<dyn Backend>("backend")
                .named_param::<u32>("retries", "retries")
                .build(|args| {
                    Ok(Gateway { backend: args.get_trait(0)?, retries: args.get(1)? })
                }),
        ),
    );

    let container = services.build();
    let gateway = container.get_instance::<Gateway>().unwrap();
    assert_eq!(gateway.backend.id(), 7);
    assert_eq!(*gateway.retries, 3);
}
