//! Mod lifecycle tests
//!
//! Tests for the dependency gate, asset-only mods, compile failures, entry-point
//! selection, teardown and package-scoped bundle loading.

use super::test_utils::*;
use modhost::module::{FailureKind, ResolutionContext};
use modhost::{ModError, ModLoaderConfig, ModState};

#[test]
fn test_missing_dependency_blocks_everything() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &["Bar", "Baz"]);
    fixture.add_script("Foo", "main.src", "script ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &["Bar", "Baz"]);

    let live = active(&["Baz"]);
    let err = lifecycle
        .init(&mut package, ResolutionContext::Live(&live))
        .unwrap_err();

    match err {
        ModError::MissingDependencies { name, missing } => {
            assert_eq!(name, "Foo");
            assert_eq!(missing, vec!["Bar".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(
        package.state(),
        ModState::Failed(FailureKind::MissingDependencies)
    );
    assert!(!package.is_live());
    assert!(!package.is_overlay_registered());
    assert_eq!(fixture.overlay.total_calls(), 0);
    assert!(fixture.compiler.calls().is_empty());
}

#[test]
fn test_foo_bar_scenario() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &["Bar"]);
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &["Bar"]);

    let err = lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap_err();
    assert!(matches!(
        err,
        ModError::MissingDependencies { ref missing, .. } if missing == &["Bar"]
    ));
    assert_eq!(
        package.state(),
        ModState::Failed(FailureKind::MissingDependencies)
    );
    assert!(fixture.overlay.registered().is_empty());

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&["Bar"])))
        .unwrap();
    assert_eq!(package.state(), ModState::Initialized);
    assert_eq!(fixture.overlay.registered(), vec![fixture.mod_dir("Foo")]);
}

#[test]
fn test_asset_only_mod_without_scripts_dir() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Skins", &[]);
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Skins", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();

    assert_eq!(package.state(), ModState::Initialized);
    assert!(package.code_unit().is_none());
    assert_eq!(fixture.overlay.count("register", &fixture.mod_dir("Skins")), 1);
    assert!(fixture.compiler.calls().is_empty());

    lifecycle.start(&mut package).unwrap();
    assert_eq!(package.state(), ModState::Started);
    assert!(!package.has_running_script());
}

#[test]
fn test_scripts_dir_without_sources_is_asset_only() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Skins", &[]);
    fixture.add_script("Skins", "README.txt", "script ScriptMain");
    std::fs::create_dir_all(fixture.mod_dir("Skins").join("Scripts/nested.src")).unwrap();
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Skins", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();

    assert_eq!(package.state(), ModState::Initialized);
    assert!(package.code_unit().is_none());
    assert!(fixture.compiler.calls().is_empty());
    assert_eq!(fixture.overlay.registered(), vec![fixture.mod_dir("Skins")]);
}

#[test]
fn test_sources_compiled_as_one_sorted_batch() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "b.src", "type Helper");
    fixture.add_script("Foo", "a.src", "script ScriptMain");
    fixture.add_script("Foo", "notes.md", "not source");
    let mut config = fixture.config();
    config.allow_host_api = false;
    let lifecycle = fixture.lifecycle_with(&config);
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();

    let calls = fixture.compiler.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].unit_name, "Foo");
    assert_eq!(calls[0].files, vec!["a.src", "b.src"]);
    assert!(!calls[0].allow_host_api);
    assert!(package.code_unit().is_some());
}

#[test]
fn test_custom_source_extension() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "main.cs", "script ScriptMain");
    fixture.add_script("Foo", "ignored.src", "syntax error");
    let config = ModLoaderConfig {
        source_extension: "cs".to_string(),
        ..fixture.config()
    };
    let lifecycle = fixture.lifecycle_with(&config);
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    assert_eq!(fixture.compiler.calls()[0].files, vec!["main.cs"]);
}

#[test]
fn test_compile_failure_keeps_overlay() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Broken", &[]);
    fixture.add_script("Broken", "main.src", "script ScriptMain\nsyntax error");
    fixture.add_mod("Fine", &[]);
    fixture.add_script("Fine", "main.src", "script ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut broken = fixture.package("Broken", &[]);
    let mut fine = fixture.package("Fine", &[]);

    let err = lifecycle
        .init(&mut broken, ResolutionContext::Live(&active(&[])))
        .unwrap_err();
    assert!(matches!(err, ModError::Compile { ref name, .. } if name == "Broken"));
    assert_eq!(broken.state(), ModState::Failed(FailureKind::Compile));
    assert!(broken.code_unit().is_none());
    assert!(broken.is_live());
    assert!(fixture.overlay.inner.contains(&fixture.mod_dir("Broken")));

    lifecycle
        .init(&mut fine, ResolutionContext::Live(&active(&[])))
        .unwrap();
    assert_eq!(fine.state(), ModState::Initialized);
    assert_eq!(
        fixture.overlay.registered(),
        vec![fixture.mod_dir("Broken"), fixture.mod_dir("Fine")]
    );

    // Start of a mod whose code failed is a no-op
    lifecycle.start(&mut broken).unwrap();
    assert_eq!(broken.state(), ModState::Failed(FailureKind::Compile));
    lifecycle.start(&mut fine).unwrap();
    assert_eq!(fixture.events(), vec!["new:Fine:ScriptMain", "start:Fine:ScriptMain"]);
}

#[test]
fn test_gate_failure_on_retry_revokes_overlay() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &["Bar"]);
    fixture.add_script("Foo", "main.src", "syntax error");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &["Bar"]);

    let _ = lifecycle.init(&mut package, ResolutionContext::Live(&active(&["Bar"])));
    assert_eq!(package.state(), ModState::Failed(FailureKind::Compile));
    assert!(package.is_overlay_registered());

    // Bar went away before the retry
    let err = lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap_err();
    assert!(matches!(err, ModError::MissingDependencies { .. }));
    assert_eq!(
        package.state(),
        ModState::Failed(FailureKind::MissingDependencies)
    );
    assert!(!package.is_overlay_registered());
    assert!(fixture.overlay.registered().is_empty());

    lifecycle.destroy(&mut package);
    assert_eq!(fixture.overlay.count("unregister", &fixture.mod_dir("Foo")), 1);
}

#[test]
fn test_only_reserved_entry_point_is_started() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script Other\ntype Helper");
    fixture.add_script("Foo", "b.src", "script ScriptMain\nscript ScriptMainExtra");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    assert_eq!(package.state(), ModState::Started);
    assert!(package.has_running_script());
    assert_eq!(fixture.events(), vec!["new:Foo:ScriptMain", "start:Foo:ScriptMain"]);

    // Start runs the entry point once
    lifecycle.start(&mut package).unwrap();
    assert_eq!(fixture.events().len(), 2);
}

#[test]
fn test_first_matching_type_wins() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nscript ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    let starts = fixture
        .events()
        .into_iter()
        .filter(|e| e.starts_with("start:"))
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn test_no_entry_point_is_noop() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script Main\ntype Helper");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    assert_eq!(package.state(), ModState::Started);
    assert!(!package.has_running_script());
    assert!(fixture.events().is_empty());
}

#[test]
fn test_configured_entry_point_name() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nscript Main");
    let config = ModLoaderConfig {
        entry_point: "Main".to_string(),
        ..fixture.config()
    };
    let lifecycle = fixture.lifecycle_with(&config);
    assert_eq!(lifecycle.entry_point_name(), "Main");
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();
    assert_eq!(fixture.events(), vec!["new:Foo:Main", "start:Foo:Main"]);
}

#[test]
fn test_designated_entry_point_wins() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nscript Boot\nentry Boot");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();
    assert_eq!(fixture.events(), vec!["new:Foo:Boot", "start:Foo:Boot"]);
}

#[test]
fn test_instantiation_failure_is_not_fatal() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "broken ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    assert_eq!(package.state(), ModState::Started);
    assert!(!package.has_running_script());
    assert_eq!(fixture.events(), vec!["new:Foo:ScriptMain"]);
}

#[test]
fn test_entry_point_without_capability_is_noop() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "type ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();
    assert_eq!(package.state(), ModState::Started);
    assert!(!package.has_running_script());
}

#[test]
fn test_script_error_marks_start_failed() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nfail");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    let err = lifecycle.start(&mut package).unwrap_err();

    assert!(matches!(err, ModError::ScriptFailed { .. }));
    assert_eq!(package.state(), ModState::StartFailed);
    assert!(!package.has_running_script());
    assert!(package.is_overlay_registered());
}

#[test]
fn test_script_panic_is_contained() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\npanic");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    let err = lifecycle.start(&mut package).unwrap_err();

    match err {
        ModError::ScriptFailed { reason, .. } => assert_eq!(reason, "script blew up"),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(package.state(), ModState::StartFailed);

    // Teardown still works after a panicking start
    lifecycle.destroy(&mut package);
    assert!(fixture.overlay.registered().is_empty());
}

#[test]
fn test_init_twice_is_rejected() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    let err = lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap_err();
    assert!(matches!(err, ModError::InvalidState { .. }));
    assert_eq!(fixture.overlay.count("register", &fixture.mod_dir("Foo")), 1);
}

#[test]
fn test_destroy_twice_unregisters_once() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.destroy(&mut package);
    lifecycle.destroy(&mut package);

    assert_eq!(package.state(), ModState::Destroyed);
    assert_eq!(fixture.overlay.count("unregister", &fixture.mod_dir("Foo")), 1);
    assert!(fixture.overlay.registered().is_empty());
}

#[test]
fn test_destroy_without_init() {
    let fixture = ModTestFixture::new();
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Ghost", &[]);

    lifecycle.destroy(&mut package);

    assert_eq!(package.state(), ModState::Destroyed);
    assert_eq!(fixture.overlay.total_calls(), 0);
}

#[test]
fn test_destroy_after_failed_gate_leaves_no_registration() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &["Bar"]);
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &["Bar"]);

    let _ = lifecycle.init(&mut package, ResolutionContext::Live(&active(&[])));
    lifecycle.destroy(&mut package);

    assert_eq!(fixture.overlay.total_calls(), 0);
}

#[test]
fn test_reinit_after_destroy() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.destroy(&mut package);
    assert!(package.code_unit().is_none());

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    assert_eq!(package.state(), ModState::Initialized);
    assert_eq!(fixture.overlay.registered(), vec![fixture.mod_dir("Foo")]);
}

#[test]
fn test_script_bundle_missing_dir_is_none() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nbundle data.bin");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    assert!(fixture.events().contains(&"bundle:Foo:none".to_string()));
}

#[test]
fn test_script_loads_own_bundle() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_script("Foo", "a.src", "script ScriptMain\nbundle data.bin");
    fixture.add_bundle("Foo", "data.bin", b"ARCH");
    let lifecycle = fixture.lifecycle();
    let mut package = fixture.package("Foo", &[]);

    lifecycle
        .init(&mut package, ResolutionContext::Live(&active(&[])))
        .unwrap();
    lifecycle.start(&mut package).unwrap();

    assert!(fixture.events().contains(&"bundle:Foo:4".to_string()));
}

#[tokio::test]
async fn test_async_bundle_load() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_bundle("Foo", "levels/one.pak", b"HEADERpayload");
    let package = fixture.package("Foo", &[]);

    let request = package.load_bundle_async("levels/one.pak", 6).unwrap();
    let handle = request.await.unwrap();
    assert_eq!(&handle.data[..], b"payload");
    assert_eq!(
        handle.path,
        fixture.mod_dir("Foo").join("Bundles/levels/one.pak")
    );

    let missing = package.load_bundle_async("levels/two.pak", 0).unwrap().await;
    assert!(matches!(missing, Err(ModError::Asset(_))));
}

#[test]
fn test_nested_bundle_path() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    fixture.add_bundle("Foo", "cars/sport/falcon.pak", b"FALCON");
    let package = fixture.package("Foo", &[]);

    let handle = package.load_bundle("cars/sport/falcon.pak", 0).unwrap().unwrap();
    assert_eq!(&handle.data[..], b"FALCON");
    assert!(matches!(
        package.load_bundle("cars/sport/missing.pak", 0),
        Some(Err(ModError::Asset(_)))
    ));
}

#[tokio::test]
async fn test_async_bundle_without_dir_is_none() {
    let fixture = ModTestFixture::new();
    fixture.add_mod("Foo", &[]);
    let package = fixture.package("Foo", &[]);

    assert!(package.load_bundle_async("one.pak", 0).is_none());
    assert!(package.load_bundle("one.pak", 0).is_none());
}
