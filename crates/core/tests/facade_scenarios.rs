use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use input_starter_core::prelude::*;

fn facade(src: &ManualSource) -> InputFacade {
    InputFacade::builder().source(src.clone()).build().unwrap()
}

/// Collects event names in delivery order.
fn recorder(f: &mut InputFacade) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    f.on_device_changed(move |ty| l.borrow_mut().push(format!("changed:{ty}")));
    let l = log.clone();
    f.on_device_lost(move |ty| l.borrow_mut().push(format!("lost:{ty:?}")));
    let l = log.clone();
    f.on_device_regained(move |ty| l.borrow_mut().push(format!("regained:{ty}")));
    let l = log.clone();
    f.on_rebind_started(move |a| l.borrow_mut().push(format!("started:{a}")));
    let l = log.clone();
    f.on_rebind_completed(move |a| l.borrow_mut().push(format!("completed:{a}")));
    let l = log.clone();
    f.on_rebind_cancelled(move |a| l.borrow_mut().push(format!("cancelled:{a}")));
    log
}

#[test]
fn scheme_changes_drive_the_device_type() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    assert_eq!(f.current_device_type(), DeviceType::KeyboardAndMouse);

    src.emit(PlatformSignal::SchemeChanged("XBox Controller".into()));
    f.tick();
    assert_eq!(f.current_device_type(), DeviceType::XBox);
    assert!(f.is_using_gamepad());

    src.emit(PlatformSignal::SchemeChanged("Some Racing Wheel".into()));
    f.tick();
    assert_eq!(f.current_device_type(), DeviceType::KeyboardAndMouse);
    assert!(!f.is_using_gamepad());

    assert_eq!(f.device_type_of("Switch Pro Controller"), DeviceType::SwitchPro);
}

#[test]
fn saved_override_survives_reset_and_load() {
    let src = ManualSource::new();
    let mut f = facade(&src);

    f.start_rebind(Action::Move, 1).unwrap();
    f.complete_rebind_with(Control::Key(Key::Up)).unwrap();
    f.save_bindings_as("bindings_v1").unwrap();

    f.reset_bindings();
    assert!(f.overrides().is_empty());
    assert_eq!(f.bindings_of(Action::Move)[1].control, Control::Key(Key::Letter('w')));

    assert!(f.load_bindings("bindings_v1"));
    assert_eq!(f.overrides().get(Action::Move, 1), Some(Control::Key(Key::Up)));

    src.set_sample(DeviceSample::new().with(Control::Key(Key::Up)));
    f.tick();
    assert_eq!(f.move_input(), Vec2::new(0.0, 1.0));
}

#[test]
fn cancelled_rebind_leaves_everything_as_it_was() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let events = recorder(&mut f);

    f.start_rebind(Action::Fire, 0).unwrap();
    assert_eq!(*events.borrow(), vec!["started:Fire"]);
    assert_eq!(f.rebind_state(), RebindState::AwaitingInput);

    f.cancel_rebind().unwrap();
    f.tick();

    let cancelled = events
        .borrow()
        .iter()
        .filter(|e| e.starts_with("cancelled:"))
        .count();
    assert_eq!(cancelled, 1);
    assert!(f.overrides().is_empty());
    assert!(f.actions().is_action_enabled(Action::Fire));
    assert_eq!(f.rebind_state(), RebindState::Idle);

    src.set_sample(DeviceSample::new().with(Control::Mouse(MouseButton::Left)));
    f.tick();
    assert!(f.fire().pressed_this_tick);
}

#[test]
fn lost_then_regained_as_a_different_pad() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    src.emit(PlatformSignal::SchemeChanged("XBox Controller".into()));
    f.tick();
    let events = recorder(&mut f);

    src.emit(PlatformSignal::DeviceLost);
    f.tick();
    src.emit(PlatformSignal::DeviceRegained("PlayStation Controller".into()));
    f.tick();

    assert_eq!(
        *events.borrow(),
        vec![
            "lost:Some(XBox)",
            "changed:PlayStation",
            "regained:PlayStation"
        ]
    );
    assert_eq!(f.current_device_type(), DeviceType::PlayStation);
}

#[test]
fn regained_same_family_only_reports_regained() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let events = recorder(&mut f);

    src.emit(PlatformSignal::DeviceLost);
    src.emit(PlatformSignal::DeviceRegained("Keyboard and Mouse".into()));
    f.tick();

    assert_eq!(
        *events.borrow(),
        vec!["lost:Some(KeyboardAndMouse)", "regained:KeyboardAndMouse"]
    );
}

#[test]
fn second_install_is_discarded() {
    let log = Arc::new(MemoryLog::new());
    let first_src = ManualSource::new();
    let mut host = InputHost::new();
    assert!(host.install(facade(&first_src)));
    host.current_mut()
        .unwrap()
        .apply_overrides(BindingOverrides::from_json(
            r#"{"version":1,"overrides":[{"action":"Jump","slot":0,"control":"kb_j"}]}"#,
        )
        .unwrap());

    let second_src = ManualSource::new();
    let second = InputFacade::builder()
        .source(second_src.clone())
        .logger(log.clone())
        .build()
        .unwrap();
    assert_eq!(second_src.subscriber_count(), 1);
    assert!(!host.install(second));

    assert_eq!(first_src.subscriber_count(), 1);
    assert_eq!(second_src.subscriber_count(), 0);
    assert!(log.contains("WARN: [facade] an instance is already live"));

    let live = host.current().unwrap();
    assert_eq!(
        live.overrides().get(Action::Jump, 0),
        Some(Control::Key(Key::Letter('j')))
    );
    assert!(live.actions().is_enabled());
}

#[test]
fn captured_input_completes_a_rebind_on_tick() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let events = recorder(&mut f);

    f.start_rebind(Action::Jump, 1).unwrap();
    src.set_sample(DeviceSample::new().with(Control::Key(Key::Letter('q'))));
    f.tick();
    assert_eq!(f.rebind_state(), RebindState::AwaitingInput);

    src.set_sample(DeviceSample::new().with(Control::Pad(PadButton::North)));
    f.tick();
    assert_eq!(*events.borrow(), vec!["started:Jump", "completed:Jump"]);
    assert_eq!(
        f.overrides().get(Action::Jump, 1),
        Some(Control::Pad(PadButton::North))
    );
    assert_eq!(
        f.last_rebind_outcome(),
        Some((Action::Jump, RebindState::Completed))
    );

    // still held from the capture: must not fire as a fresh press
    f.tick();
    assert!(!f.jump().is_pressed);
    src.set_sample(DeviceSample::new());
    f.tick();
    src.set_sample(DeviceSample::new().with(Control::Pad(PadButton::North)));
    f.tick();
    assert!(f.jump().pressed_this_tick);
}

#[test]
fn second_rebind_is_rejected_while_one_is_open() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    f.start_rebind(Action::Aim, 0).unwrap();
    assert_eq!(
        f.start_rebind(Action::Crouch, 0),
        Err(RebindError::AlreadyActive {
            action: Action::Aim,
            slot: 0
        })
    );
    assert!(f.actions().is_action_enabled(Action::Crouch));
}

#[test]
fn teardown_cancels_rebind_and_unsubscribes() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let events = recorder(&mut f);
    f.start_rebind(Action::Interact, 0).unwrap();

    drop(f);
    assert_eq!(src.subscriber_count(), 0);
    assert_eq!(*events.borrow(), vec!["started:Interact", "cancelled:Interact"]);
    assert_eq!(src.emit(PlatformSignal::DeviceLost), 0);
}

#[test]
fn removed_listener_stops_receiving() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let hits = Rc::new(RefCell::new(0));
    let h = hits.clone();
    let id = f.on_device_changed(move |_| *h.borrow_mut() += 1);

    src.emit(PlatformSignal::SchemeChanged("XBox Controller".into()));
    f.tick();
    assert!(f.remove_device_changed(id));
    assert!(!f.remove_device_changed(id));
    src.emit(PlatformSignal::SchemeChanged("Keyboard and Mouse".into()));
    f.tick();

    assert_eq!(*hits.borrow(), 1);
    assert_eq!(f.listener_count(), 0);
}

#[test]
fn disabled_set_reads_idle_and_recovers() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    src.set_sample(DeviceSample::new().with(Control::Key(Key::Letter('w'))));

    f.set_actions_enabled(false);
    f.set_actions_enabled(false);
    f.tick();
    assert_eq!(f.move_input(), Vec2::ZERO);

    f.set_actions_enabled(true);
    f.set_actions_enabled(true);
    f.tick();
    assert_eq!(f.move_input(), Vec2::new(0.0, 1.0));
    assert_eq!(f.tick_count(), 2);
}

#[test]
fn unreadable_control_never_poisons_the_saved_table() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    f.start_rebind(Action::Jump, 1).unwrap();
    f.complete_rebind_with(Control::Pad(PadButton::North)).unwrap();

    f.start_rebind(Action::Jump, 0).unwrap();
    assert!(matches!(
        f.complete_rebind_with(Control::Key(Key::F(13))),
        Err(RebindError::IncompatibleControl { .. })
    ));
    assert!(matches!(
        f.complete_rebind_with(Control::Key(Key::Letter('R'))),
        Err(RebindError::IncompatibleControl { .. })
    ));
    assert_eq!(f.rebind_state(), RebindState::AwaitingInput);
    f.cancel_rebind().unwrap();

    f.save_bindings().unwrap();
    f.reset_bindings();
    assert!(f.load_bindings(DEFAULT_STORAGE_KEY));
    assert_eq!(f.overrides().len(), 1);
    assert_eq!(
        f.overrides().get(Action::Jump, 1),
        Some(Control::Pad(PadButton::North))
    );
}

#[test]
fn loading_bindings_does_not_replay_held_input() {
    let src = ManualSource::new();
    let mut f = facade(&src);
    let backend_blob =
        r#"{"version":1,"overrides":[{"action":"Sprint","slot":0,"control":"kb_space"}]}"#;
    f.apply_overrides(BindingOverrides::from_json(backend_blob).unwrap());
    f.save_bindings().unwrap();
    f.reset_bindings();
    f.tick();

    src.set_sample(DeviceSample::new().with(Control::Key(Key::Space)));
    f.tick();
    assert!(f.jump().pressed_this_tick);

    assert!(f.load_bindings(DEFAULT_STORAGE_KEY));
    f.tick();
    assert!(!f.sprint().is_pressed);
    assert!(!f.sprint().pressed_this_tick);
    assert!(f.jump().released_this_tick);

    src.set_sample(DeviceSample::new());
    f.tick();
    src.set_sample(DeviceSample::new().with(Control::Key(Key::Space)));
    f.tick();
    assert!(f.sprint().pressed_this_tick);
}
