use argon_di::{DiError, Lifetime, Resolver, ServiceRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct RequestContext {
    id: usize,
}

fn registry_with_counter() -> (ServiceRegistry, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::PerScope, move |_| RequestContext {
        id: seen.fetch_add(1, Ordering::SeqCst) + 1,
    });
    (services, counter)
}

#[test]
fn per_scope_is_cached_within_one_scope() {
    let (services, counter) = registry_with_counter();
    let container = services.build();

    let scope = container.begin_scope();
    let a = container.get_instance::<RequestContext>().unwrap();
    let b = container.get_instance::<RequestContext>().unwrap();
    scope.end().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn separate_scopes_get_separate_instances() {
    let (services, _) = registry_with_counter();
    let container = services.build();

    let scope1 = container.begin_scope();
    let first = container.get_instance::<RequestContext>().unwrap();
    scope1.end().unwrap();

    let scope2 = container.begin_scope();
    let second = container.get_instance::<RequestContext>().unwrap();
    scope2.end().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_ne!(first.id, second.id);
}

#[test]
fn per_scope_outside_scope_is_an_error() {
    let (services, _) = registry_with_counter();
    let container = services.build();

    match container.get_instance::<RequestContext>() {
        Err(DiError::OutsideScope(key)) => {
            assert!(key.display_name().contains("RequestContext"));
        }
        _ => panic!("expected OutsideScope"),
    }
}

#[test]
fn nested_scope_gets_its_own_instance() {
    let (services, _) = registry_with_counter();
    let container = services.build();

    let outer = container.begin_scope();
    let outer_ctx = container.get_instance::<RequestContext>().unwrap();

    {
        let inner = container.begin_scope();
        let inner_ctx = container.get_instance::<RequestContext>().unwrap();
        assert!(!Arc::ptr_eq(&outer_ctx, &inner_ctx));
        inner.end().unwrap();
    }

    // Back in the outer scope, the outer instance is still current.
    let again = container.get_instance::<RequestContext>().unwrap();
    assert!(Arc::ptr_eq(&outer_ctx, &again));
    outer.end().unwrap();
}

#[test]
fn dropping_the_guard_ends_the_scope() {
    let (services, _) = registry_with_counter();
    let container = services.build();

    {
        let _scope = container.begin_scope();
        let _ = container.get_instance::<RequestContext>().unwrap();
    }

    assert!(matches!(
        container.get_instance::<RequestContext>(),
        Err(DiError::OutsideScope(_))
    ));
}

#[test]
fn scope_state_is_confined_to_its_thread() {
    let (services, _) = registry_with_counter();
    let container = services.build();

    let scope = container.begin_scope();
    let here = container.get_instance::<RequestContext>().unwrap();

    let elsewhere = std::thread::scope(|s| {
        s.spawn(|| {
            // No scope is active on this thread.
            assert!(matches!(
                container.get_instance::<RequestContext>(),
                Err(DiError::OutsideScope(_))
            ));

            let scope = container.begin_scope();
            let ctx = container.get_instance::<RequestContext>().unwrap();
            scope.end().unwrap();
            ctx.id
        })
        .join()
        .unwrap()
    });

    assert_ne!(here.id, elsewhere);
    scope.end().unwrap();
}

#[test]
fn transient_services_resolve_inside_scopes_too() {
    struct Job;

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::Transient, |_| Job);

    let container = services.build();
    let scope = container.begin_scope();
    let a = container.get_instance::<Job>().unwrap();
    let b = container.get_instance::<Job>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    scope.end().unwrap();
}
