use argon_di::{Blueprint, Constructor, DiError, Lifetime, Resolver, ServiceRegistry};
use std::sync::Arc;

struct DepA;
struct DepB;

struct Widget {
    used: &'static str,
}

#[test]
fn fully_resolvable_constructor_with_most_parameters_wins() {
    let mut services = ServiceRegistry::new();
    services.register_instance(DepA);
    services.register_instance(DepB);
    services.register::<Widget>(
        Lifetime::Transient,
        Blueprint::new()
            .constructor(Constructor::new().build(|_| Ok(Widget { used: "zero" })))
            .constructor(
                Constructor::new()
                    .param::<DepA>("a")
                    .build(|args| {
                        let _: Arc<DepA> = args.get(0)?;
                        Ok(Widget { used: "one" })
                    }),
            )
            .constructor(
                Constructor::new()
                    .param::<DepA>("a")
                    .param::<DepB>("b")
                    .build(|args| {
                        let _: Arc<DepA> = args.get(0)?;
                        let _: Arc<DepB> = args.get(1)?;
                        Ok(Widget { used: "two" })
                    }),
            ),
    );

    let container = services.build();
    assert_eq!(container.get_instance::<Widget>().unwrap().used, "two");
}

#[test]
fn unresolvable_candidates_are_skipped() {
    struct Unregistered;

    let mut services = ServiceRegistry::new();
    services.register_instance(DepA);
    services.register::<Widget>(
        Lifetime::Transient,
        Blueprint::new()
            .constructor(
                Constructor::new()
                    .param::<DepA>("a")
                    .param::<Unregistered>("missing")
                    .build(|_| Ok(Widget { used: "greedy" })),
            )
            .constructor(
                Constructor::new()
                    .param::<DepA>("a")
                    .build(|args| {
                        let _: Arc<DepA> = args.get(0)?;
                        Ok(Widget { used: "resolvable" })
                    }),
            ),
    );

    let container = services.build();
    assert_eq!(container.get_instance::<Widget>().unwrap().used, "resolvable");
}

#[test]
fn declaration_order_breaks_ties() {
    let mut services = ServiceRegistry::new();
    services.register_instance(DepA);
    services.register_instance(DepB);
    services.register::<Widget>(
        Lifetime::Transient,
        Blueprint::new()
            .constructor(
                Constructor::new()
                    .param::<DepA>("a")
                    .build(|_| Ok(Widget { used: "first" })),
            )
            .constructor(
                Constructor::new()
                    .param::<DepB>("b")
                    .build(|_| Ok(Widget { used: "second" })),
            ),
    );

    let container = services.build();
    assert_eq!(container.get_instance::<Widget>().unwrap().used, "first");
}

#[test]
fn fallback_selects_fewest_parameters_and_fails_on_the_missing_one() {
    struct MissingOne;
    struct MissingTwo;

    let mut services = ServiceRegistry::new();
    services.register::<Widget>(
        Lifetime::Transient,
        Blueprint::new()
            .constructor(
                Constructor::new()
                    .param::<MissingOne>("first")
                    .param::<MissingTwo>("second")
                    .build(|_| Ok(Widget { used: "wide" })),
            )
            .constructor(
                Constructor::new()
                    .param::<MissingOne>("only")
                    .build(|_| Ok(Widget { used: "narrow" })),
            ),
    );

    let container = services.build();
    match container.get_instance::<Widget>() {
        Err(DiError::UnresolvedDependency { target, parameter, requested }) => {
            assert!(target.contains("Widget"));
            assert_eq!(parameter, "only");
            assert!(requested.display_name().contains("MissingOne"));
        }
        _ => panic!("expected UnresolvedDependency"),
    }
}

#[test]
fn default_value_is_used_when_dependency_is_unregistered() {
    struct Port(u16);

    let mut services = ServiceRegistry::new();
    services.register::<Port>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .default_param("port", 8080u16)
                .build(|args| Ok(Port(*args.get::<u16>(0)?))),
        ),
    );

    let container = services.build();
    assert_eq!(container.get_instance::<Port>().unwrap().0, 8080);
}

#[test]
fn registration_overrides_the_default_value() {
    struct Port(u16);

    let mut services = ServiceRegistry::new();
    services.register_instance(9090u16);
    services.register::<Port>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .default_param("port", 8080u16)
                .build(|args| Ok(Port(*args.get::<u16>(0)?))),
        ),
    );

    let container = services.build();
    assert_eq!(container.get_instance::<Port>().unwrap().0, 9090);
}

#[test]
fn unresolved_error_names_target_parameter_and_requested_key() {
    struct Engine;
    struct Car {
        _engine: Arc<Engine>,
    }

    let mut services = ServiceRegistry::new();
    services.register::<Car>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .param::<Engine>("engine")
                .build(|args| Ok(Car { _engine: args.get(0)? })),
        ),
    );

    let container = services.build();
    match container.get_instance::<Car>() {
        Err(error @ DiError::UnresolvedDependency { .. }) => {
            let message = error.to_string();
            assert!(message.contains("Car"));
            assert!(message.contains("engine"));
            assert!(message.contains("Engine"));
        }
        _ => panic!("expected UnresolvedDependency"),
    }
}
