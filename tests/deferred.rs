use argon_di::{
    Blueprint, Constructor, Deferred, DiError, Lifetime, Resolver, ServiceRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Heavy;

struct Consumer {
    heavy: Deferred<Heavy>,
}

#[test]
fn deferred_param_does_not_resolve_eagerly() {
    let created = Arc::new(AtomicUsize::new(0));
    let seen = created.clone();

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::Transient, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Heavy
    });
    services.register::<Consumer>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .deferred_param::<Heavy>("heavy")
                .build(|args| Ok(Consumer { heavy: args.deferred(0)? })),
        ),
    );

    let container = services.build();
    let consumer = container.get_instance::<Consumer>().unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 0);

    let first = consumer.heavy.resolve().unwrap();
    let second = consumer.heavy.resolve().unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn deferred_resolution_honors_the_target_lifetime() {
    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::PerContainer, |_| Heavy);
    services.register::<Consumer>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .deferred_param::<Heavy>("heavy")
                .build(|args| Ok(Consumer { heavy: args.deferred(0)? })),
        ),
    );

    let container = services.build();
    let consumer = container.get_instance::<Consumer>().unwrap();

    let through_handle = consumer.heavy.resolve().unwrap();
    let through_container = container.get_instance::<Heavy>().unwrap();
    assert!(Arc::ptr_eq(&through_handle, &through_container));
}

#[test]
fn deferred_slot_for_an_unregistered_service_fails_only_on_resolve() {
    let mut services = ServiceRegistry::new();
    services.register::<Consumer>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .deferred_param::<Heavy>("heavy")
                .build(|args| Ok(Consumer { heavy: args.deferred(0)? })),
        ),
    );

    // Planning succeeds: the slot defers, it does not require a registration.
    let container = services.build();
    let consumer = container.get_instance::<Consumer>().unwrap();

    assert!(matches!(
        consumer.heavy.resolve(),
        Err(DiError::UnableToResolve(_))
    ));
}

#[test]
fn deferred_handle_outliving_the_container_reports_release() {
    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::Transient, |_| Heavy);
    services.register::<Consumer>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .deferred_param::<Heavy>("heavy")
                .build(|args| Ok(Consumer { heavy: args.deferred(0)? })),
        ),
    );

    let container = services.build();
    let consumer = container.get_instance::<Consumer>().unwrap();
    drop(container);

    assert!(matches!(
        consumer.heavy.resolve(),
        Err(DiError::ContainerReleased(_))
    ));
}

#[test]
fn factories_can_mint_deferred_handles_from_the_context() {
    struct Lazy {
        heavy: Deferred<Heavy>,
    }

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::Transient, |_| Heavy);
    services.register_factory(Lifetime::Transient, |ctx| Lazy { heavy: ctx.deferred() });

    let container = services.build();
    let lazy = container.get_instance::<Lazy>().unwrap();
    assert!(lazy.heavy.resolve().is_ok());
}

#[test]
fn deferred_property_receives_a_handle() {
    struct Holder {
        heavy: Option<Deferred<Heavy>>,
    }

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::Transient, |_| Heavy);
    services.register::<Holder>(
        Lifetime::Transient,
        Blueprint::new()
            .constructor(Constructor::new().build(|_| Ok(Holder { heavy: None })))
            .deferred_property("heavy", |holder, heavy: Deferred<Heavy>| {
                holder.heavy = Some(heavy)
            }),
    );

    let container = services.build();
    let holder = container.get_instance::<Holder>().unwrap();
    assert!(holder.heavy.as_ref().unwrap().resolve().is_ok());
}
