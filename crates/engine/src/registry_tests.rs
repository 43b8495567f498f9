// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn id(value: &str) -> JobId {
    JobId::parse(value).unwrap()
}

#[test]
fn registration_is_active_until_dropped() {
    let registry = JobRegistry::new();
    let guard = registry.register(&id("job-1")).unwrap();

    assert!(registry.is_active(&id("job-1")));
    assert_eq!(registry.active_count(), 1);
    assert_eq!(guard.id(), &id("job-1"));

    drop(guard);
    assert!(!registry.is_active(&id("job-1")));
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn double_registration_is_rejected() {
    let registry = JobRegistry::new();
    let _guard = registry.register(&id("job-1")).unwrap();

    let err = registry.register(&id("job-1")).unwrap_err();
    assert_eq!(err, RegistryError::Occupied(id("job-1")));
}

#[test]
fn explicit_unregister_then_drop_is_harmless() {
    let registry = JobRegistry::new();
    let guard = registry.register(&id("job-1")).unwrap();

    assert!(registry.unregister(&id("job-1")));
    assert!(!registry.unregister(&id("job-1")));
    drop(guard);
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn lease_blocks_registration() {
    let registry = JobRegistry::new();
    let lease = registry.lease_for_purge(&id("job-1")).unwrap();

    assert_eq!(
        registry.register(&id("job-1")).unwrap_err(),
        RegistryError::Purging(id("job-1"))
    );
    assert!(!registry.is_active(&id("job-1")));
    assert_eq!(registry.active_count(), 0);

    drop(lease);
    assert!(registry.register(&id("job-1")).is_ok());
}

#[test]
fn active_job_blocks_lease() {
    let registry = JobRegistry::new();
    let _guard = registry.register(&id("job-1")).unwrap();

    assert!(registry.lease_for_purge(&id("job-1")).is_none());
    assert!(registry.lease_for_purge(&id("job-2")).is_some());
}

#[test]
fn unregister_does_not_release_a_lease() {
    let registry = JobRegistry::new();
    let _lease = registry.lease_for_purge(&id("job-1")).unwrap();

    assert!(!registry.unregister(&id("job-1")));
    assert!(registry.register(&id("job-1")).is_err());
}

#[test]
fn concurrent_register_and_unregister_lose_nothing() {
    let registry = JobRegistry::new();
    let handles: Vec<_> = (0..16)
        .map(|t| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let mut kept = Vec::new();
                for n in 0..100 {
                    let guard = registry.register(&id(&format!("t{}-{}", t, n))).unwrap();
                    if n % 2 == 0 {
                        kept.push(guard);
                    }
                }
                kept
            })
        })
        .collect();

    let kept: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(registry.active_count(), 16 * 50);
    drop(kept);
    assert_eq!(registry.active_count(), 0);
}
