//! Concurrent access tests: singleton consistency and compile-once
//! visibility under simultaneous first access.

use argon_di::{Blueprint, Constructor, Lifetime, Resolver, ServiceRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

#[test]
fn concurrent_first_access_constructs_one_singleton() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let seen = constructions.clone();

    struct Shared;

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::PerContainer, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Shared
    });

    let container = services.build();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let instances: Vec<Arc<Shared>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = barrier.clone();
                let container = container.clone();
                s.spawn(move |_| {
                    barrier.wait();
                    container.get_instance::<Shared>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[test]
fn concurrent_compilation_yields_one_visible_factory() {
    // Losers of the compilation race discard their factory in favor of the
    // winner's; with a per-container dependency that is observable as a
    // single shared instance, no matter which thread compiled first.
    struct Leaf;
    struct Branch {
        leaf: Arc<Leaf>,
    }

    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::PerContainer, |_| Leaf);
    services.register::<Branch>(
        Lifetime::Transient,
        Blueprint::new().constructor(
            Constructor::new()
                .param::<Leaf>("leaf")
                .build(|args| Ok(Branch { leaf: args.get(0)? })),
        ),
    );

    let container = services.build();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let branches: Vec<Arc<Branch>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let barrier = barrier.clone();
                let container = container.clone();
                s.spawn(move |_| {
                    barrier.wait();
                    container.get_instance::<Branch>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    for pair in branches.windows(2) {
        assert!(!Arc::ptr_eq(&pair[0], &pair[1]));
        assert!(Arc::ptr_eq(&pair[0].leaf, &pair[1].leaf));
    }
}

#[test]
fn resolution_is_thread_safe_across_distinct_keys() {
    let mut services = ServiceRegistry::new();
    services.register_factory(Lifetime::PerContainer, |_| 1u8);
    services.register_factory(Lifetime::PerContainer, |_| 2u16);
    services.register_factory(Lifetime::PerContainer, |_| 3u32);
    services.register_factory(Lifetime::Transient, |_| 4u64);

    let container = services.build();

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..4 {
            let container = container.clone();
            s.spawn(move |_| {
                for _ in 0..100 {
                    assert_eq!(*container.get_instance::<u8>().unwrap(), 1);
                    assert_eq!(*container.get_instance::<u16>().unwrap(), 2);
                    assert_eq!(*container.get_instance::<u32>().unwrap(), 3);
                    assert_eq!(*container.get_instance::<u64>().unwrap(), 4);
                }
            });
        }
    })
    .unwrap();
}
