use std::fs;
use std::sync::Arc;

use input_starter_core::prelude::*;

fn file_backed(dir: &std::path::Path, src: &ManualSource) -> InputFacade {
    InputFacade::builder()
        .source(src.clone())
        .store(Arc::new(FileStore::new(dir)))
        .build()
        .unwrap()
}

#[test]
fn overrides_reload_on_next_start() {
    let dir = tempfile::tempdir().unwrap();
    let src = ManualSource::new();
    {
        let mut f = file_backed(dir.path(), &src);
        f.start_rebind(Action::Crouch, 0).unwrap();
        f.complete_rebind_with(Control::Key(Key::Letter('c'))).unwrap();
        f.save_bindings().unwrap();
    }
    assert!(dir.path().join("bindings_v1.json").is_file());

    let f = file_backed(dir.path(), &src);
    assert_eq!(
        f.overrides().get(Action::Crouch, 0),
        Some(Control::Key(Key::Letter('c')))
    );
}

#[test]
fn blob_on_disk_is_the_documented_format() {
    let dir = tempfile::tempdir().unwrap();
    let src = ManualSource::new();
    let mut f = file_backed(dir.path(), &src);
    f.start_rebind(Action::Move, 1).unwrap();
    f.complete_rebind_with(Control::Key(Key::Up)).unwrap();
    f.save_bindings().unwrap();

    let text = fs::read_to_string(dir.path().join("bindings_v1.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "version": 1,
            "overrides": [{"action": "Move", "slot": 1, "control": "kb_up"}]
        })
    );
}

#[test]
fn corrupt_or_missing_blob_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bindings_v1.json"), "{\"version\":7}").unwrap();
    let log = Arc::new(MemoryLog::new());

    let src = ManualSource::new();
    let mut f = InputFacade::builder()
        .source(src.clone())
        .store(Arc::new(FileStore::new(dir.path())))
        .logger(log.clone())
        .build()
        .unwrap();
    assert!(f.overrides().is_empty());
    assert!(log.contains("WARN: [store] decode 'bindings_v1'"));

    assert!(!f.load_bindings("never_saved"));
    assert!(f.overrides().is_empty());
}

#[test]
fn failed_load_keeps_the_current_table() {
    let backend = Arc::new(MemoryStore::new());
    backend.save("broken", "[]").unwrap();
    let src = ManualSource::new();
    let mut f = InputFacade::builder()
        .source(src.clone())
        .store(backend)
        .build()
        .unwrap();
    f.start_rebind(Action::Sprint, 0).unwrap();
    f.complete_rebind_with(Control::Key(Key::RShift)).unwrap();

    assert!(!f.load_bindings("broken"));
    assert_eq!(
        f.overrides().get(Action::Sprint, 0),
        Some(Control::Key(Key::RShift))
    );
}

#[test]
fn auto_load_can_be_turned_off() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    backend
        .save(
            "profile_a",
            r#"{"version":1,"overrides":[{"action":"Aim","slot":1,"control":"gp_lshoulder"}]}"#,
        )
        .unwrap();

    let cfg = InputConfig {
        storage_key: "profile_a".into(),
        ..InputConfig::default()
    };
    let on = InputFacade::new(ManualSource::new(), backend.clone(), cfg.clone(), Arc::new(NoopLog))
        .unwrap();
    assert_eq!(
        on.overrides().get(Action::Aim, 1),
        Some(Control::Pad(PadButton::LeftShoulder))
    );

    let off = InputFacade::new(
        ManualSource::new(),
        backend,
        InputConfig {
            auto_load: false,
            ..cfg
        },
        Arc::new(NoopLog),
    )
    .unwrap();
    assert!(off.overrides().is_empty());
}

#[test]
fn invalid_key_is_reported_and_memory_untouched() {
    let src = ManualSource::new();
    let mut f = InputFacade::builder().source(src.clone()).build().unwrap();
    f.start_rebind(Action::Interact, 0).unwrap();
    f.complete_rebind_with(Control::Key(Key::Letter('r'))).unwrap();

    assert!(matches!(
        f.save_bindings_as("../escape"),
        Err(StoreError::InvalidKey(_))
    ));
    assert_eq!(f.overrides().len(), 1);
}
