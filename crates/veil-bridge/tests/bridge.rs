//! End-to-end tests against the fixture engine modules.
//!
//! The loader and error channel are process-wide, so every test here is
//! `#[serial]` and starts from the unloaded state.

mod common;

use serial_test::serial;
use veil_bridge::raw::{self, RawFactory, RawSession};
use veil_bridge::{
    is_loaded, last_error, load, unload, BridgeError, Config, Factory, RawBuffer,
};

#[test]
#[serial]
fn full_round_trip_through_the_engine() {
    unload();
    common::ensure_master_key();

    load(&common::full_module()).unwrap();
    assert!(is_loaded());

    let factory = Factory::from_env().unwrap();
    let session = factory.session("partition-1").unwrap();

    let sealed = session.encrypt(b"secret").unwrap();
    assert!(!sealed.is_empty());
    assert_ne!(sealed.as_bytes(), b"secret");

    let opened = session.decrypt(&sealed).unwrap();
    assert_eq!(opened.as_bytes(), b"secret");

    drop(opened);
    drop(sealed);
    session.free();
    factory.free();
    unload();
    assert!(!is_loaded());
}

#[test]
#[serial]
fn load_is_idempotent_and_does_not_switch_modules() {
    unload();
    load(&common::full_module()).unwrap();

    // Second load succeeds immediately, even with a nonsense path: the
    // loaded module stays in place until an explicit unload.
    load("/nonexistent/other_engine.so").unwrap();
    load("").unwrap();
    assert!(is_loaded());
    unload();
}

#[test]
#[serial]
fn empty_path_is_rejected_before_the_loader_runs() {
    unload();
    let err = load("").unwrap_err();
    assert!(matches!(err, BridgeError::EmptyPath));
    assert!(!is_loaded());
    assert!(last_error().contains("path was empty"));
}

#[test]
#[serial]
fn missing_symbol_aborts_the_whole_load() {
    unload();
    let err = load(&common::partial_module()).unwrap_err();
    match err {
        BridgeError::MissingSymbol { symbol } => assert_eq!(symbol, "veil_apply_config"),
        other => panic!("expected MissingSymbol, got {other:?}"),
    }
    assert!(!is_loaded());
    assert!(last_error().contains("veil_apply_config"));

    // No half-open state: a complete module loads cleanly afterwards.
    load(&common::full_module()).unwrap();
    assert!(is_loaded());
    unload();
}

#[test]
#[serial]
fn zero_factory_token_is_rejected() {
    unload();
    load(&common::full_module()).unwrap();

    let err = raw::factory_get_session(RawFactory::NULL, "partition-1").unwrap_err();
    assert!(matches!(err, BridgeError::NullFactory));
    assert_eq!(err.to_string(), "factory handle was null");
    unload();
}

#[test]
#[serial]
fn zero_session_token_is_rejected_and_output_stays_empty() {
    unload();
    load(&common::full_module()).unwrap();

    let mut out = RawBuffer::empty();
    let err = raw::encrypt(RawSession::NULL, b"secret", &mut out).unwrap_err();
    assert!(matches!(err, BridgeError::NullSession));
    assert!(out.data.is_null());
    assert_eq!(out.len, 0);

    let err = raw::decrypt(RawSession::NULL, b"payload", &mut out).unwrap_err();
    assert!(matches!(err, BridgeError::NullSession));
    assert!(out.data.is_null());
    assert_eq!(out.len, 0);
    unload();
}

#[test]
#[serial]
fn failed_decrypt_surfaces_the_engine_diagnostic() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = Factory::from_env().unwrap();
    let session = factory.session("partition-1").unwrap();

    let err = session.decrypt(b"garbage, not a sealed payload").unwrap_err();
    match &err {
        BridgeError::Native {
            operation, detail, ..
        } => {
            assert_eq!(*operation, "decrypt");
            assert!(detail.contains("bad magic"), "detail was: {detail}");
        }
        other => panic!("expected Native, got {other:?}"),
    }
    // The engine's diagnostic wins the two-tier lookup.
    assert!(last_error().contains("bad magic"));
    unload();
}

#[test]
#[serial]
fn payloads_decrypt_across_sessions_of_the_same_partition() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = Factory::from_env().unwrap();
    let writer = factory.session("orders").unwrap();
    let reader = factory.session("orders").unwrap();

    let sealed = writer.encrypt(b"row data").unwrap();
    let opened = reader.decrypt(&sealed).unwrap();
    assert_eq!(opened.as_bytes(), b"row data");
    unload();
}

#[test]
#[serial]
fn partition_mismatch_is_a_native_error() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = Factory::from_env().unwrap();
    let orders = factory.session("orders").unwrap();
    let invoices = factory.session("invoices").unwrap();

    let sealed = orders.encrypt(b"row data").unwrap();
    let err = invoices.decrypt(&sealed).unwrap_err();
    match err {
        BridgeError::Native { detail, .. } => {
            assert!(detail.contains("partition mismatch"), "detail was: {detail}")
        }
        other => panic!("expected Native, got {other:?}"),
    }
    unload();
}

#[test]
#[serial]
fn sessions_for_one_partition_may_be_distinct_resources() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = raw::factory_new_from_env().unwrap();
    let first = raw::factory_get_session(factory, "orders").unwrap();
    let second = raw::factory_get_session(factory, "orders").unwrap();
    assert_ne!(first, second);

    raw::session_free(first);
    raw::session_free(second);
    raw::factory_free(factory);
    unload();
}

#[test]
#[serial]
fn apply_config_forwards_to_the_engine() {
    unload();
    load(&common::full_module()).unwrap();

    let json = Config::new("checkout", "billing").to_json().unwrap();
    raw::apply_config(&json).unwrap();

    let err = raw::apply_config("").unwrap_err();
    match err {
        BridgeError::Native {
            operation, detail, ..
        } => {
            assert_eq!(operation, "apply_config");
            assert!(detail.contains("empty"), "detail was: {detail}");
        }
        other => panic!("expected Native, got {other:?}"),
    }
    unload();
}

#[test]
#[serial]
fn null_factory_result_reports_construction_failure() {
    unload();
    load(&common::full_module()).unwrap();

    let err = Factory::from_config("").unwrap_err();
    match err {
        BridgeError::ConstructFailed {
            operation, detail, ..
        } => {
            assert_eq!(operation, "factory_new_with_config");
            assert!(detail.contains("empty"), "detail was: {detail}");
        }
        other => panic!("expected ConstructFailed, got {other:?}"),
    }
    unload();
}

#[test]
#[serial]
fn from_env_requires_engine_configuration() {
    unload();
    std::env::remove_var(common::MASTER_KEY_ENV);
    load(&common::full_module()).unwrap();

    let err = Factory::from_env().unwrap_err();
    match err {
        BridgeError::ConstructFailed { detail, .. } => {
            assert!(detail.contains("not set"), "detail was: {detail}")
        }
        other => panic!("expected ConstructFailed, got {other:?}"),
    }

    common::ensure_master_key();
    let factory = Factory::from_env().unwrap();
    factory.free();
    unload();
}

#[test]
#[serial]
fn config_json_is_opaque_to_the_bridge() {
    unload();
    load(&common::full_module()).unwrap();

    // Not JSON at all; the bridge shuttles it through untouched and the
    // fixture engine accepts any non-empty document.
    let factory = Factory::from_config("not json at all").unwrap();
    factory.free();
    unload();
}

#[test]
#[serial]
fn interior_nul_in_partition_is_rejected() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = Factory::from_env().unwrap();
    let err = factory.session("orders\0spoofed").unwrap_err();
    assert!(matches!(err, BridgeError::InteriorNul(_)));
    unload();
}

#[test]
#[serial]
fn buffers_outliving_the_module_drop_quietly() {
    unload();
    common::ensure_master_key();
    load(&common::full_module()).unwrap();

    let factory = Factory::from_env().unwrap();
    let session = factory.session("partition-1").unwrap();
    let sealed = session.encrypt(b"secret").unwrap();

    session.free();
    factory.free();
    unload();

    // The paired free symbol is gone; releasing is a documented no-op.
    drop(sealed);
    assert!(!is_loaded());
}

#[test]
#[serial]
fn frees_of_absent_resources_are_no_ops() {
    unload();
    raw::factory_free(RawFactory::NULL);
    raw::session_free(RawSession::NULL);
    let mut buffer = RawBuffer::empty();
    raw::buffer_free(&mut buffer);
    assert!(buffer.is_empty());
}
