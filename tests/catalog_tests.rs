//! Catalog navigation and error-taxonomy tests across backends.
//!
//! Run with:
//! ```bash
//! cargo test -p wavetap --test catalog_tests
//! ```

#![cfg(feature = "capture")]

use std::sync::Arc;
use std::thread;
use wavetap::prelude::*;

/// Unknown paths yield empty listings everywhere, never errors.
#[test]
fn test_invalid_paths_are_empty_not_errors() {
    let mut engine = TapEngine::new();

    for path in [
        "/no-such-backend",
        "/generator/nonsense",
        "/generator/available/noise",
        "/cpal/bogus/branch/deep",
    ] {
        assert!(
            engine.children_names(&TreePath::parse(path)).is_empty(),
            "expected empty listing for {path}"
        );
        assert!(
            engine.metadata(&TreePath::parse(path)).is_empty(),
            "expected empty metadata for {path}"
        );
    }

    engine.dispose();
}

/// Every registered backend exposes the two fixed branches.
#[test]
fn test_backends_expose_two_branch_namespace() {
    let mut engine = TapEngine::new();

    for name in engine.backend_names() {
        let catalog = engine.backend(name).unwrap();
        let children = catalog.children_names(&TreePath::parse("/"));
        assert_eq!(
            children,
            vec!["available", "opened"],
            "backend '{name}' root listing"
        );
    }

    engine.dispose();
}

/// Open failures carry the taxonomy, and a failed backend leaves the others
/// untouched.
#[test]
fn test_open_failures_are_isolated() {
    let mut engine = TapEngine::new();

    let err = engine
        .open(&TreePath::parse("/no-such-backend/available/x/0"), &OpenParams::new())
        .unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable(_)));

    let err = engine
        .open(&TreePath::parse("/generator/available/noise/0"), &OpenParams::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));

    // The generator still works after the failures above.
    let tap = engine
        .open(&TreePath::parse("/generator/available/sine/0"), &OpenParams::new())
        .expect("generator survives unrelated failures");
    assert_eq!(tap.sample_rate(), 48000);

    engine.dispose();
}

/// Config keys: unknown ignored, recognized applied, invalid rejected.
#[test]
fn test_open_config_handling() {
    let mut engine = TapEngine::new();

    let mut params = OpenParams::new();
    params.insert("sample-rate".to_string(), Value::from(22050));
    params.insert("num-channels".to_string(), Value::from(1));
    params.insert("definitely-unknown".to_string(), Value::from(true));

    let tap = engine
        .open(&TreePath::parse("/generator/available/sine/0"), &params)
        .expect("unknown keys must be ignored");
    assert_eq!(tap.sample_rate(), 22050);

    let mut bad = OpenParams::new();
    bad.insert("sample-rate".to_string(), Value::from(1));
    let err = engine
        .open(&TreePath::parse("/generator/available/square/0"), &bad)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    engine.dispose();
}

/// Concurrent opens on one key race to a single cached device.
#[test]
fn test_concurrent_opens_resolve_to_one_device() {
    let engine = Arc::new(TapEngine::new());

    let taps: Vec<TapHandle> = {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    engine
                        .open(
                            &TreePath::parse("/generator/available/triangle/0"),
                            &OpenParams::new(),
                        )
                        .expect("open")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    };

    // One opened device, and all handles share its channel ring: only one
    // of them can hold the advisory lock at a time.
    assert_eq!(
        engine.children_names(&TreePath::parse("/generator/opened")),
        vec!["triangle"]
    );
    assert!(taps[0].try_lock());
    for tap in &taps[1..] {
        assert!(!tap.try_lock());
    }
    taps[0].unlock();
}
