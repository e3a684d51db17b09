use constcat::concat;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::actions::Action;
use crate::bindings::binding::{Binding, CompositePart};
use crate::controls::{Control, Key, MouseButton, PadButton, Side};
use crate::device::DeviceType;

pub const APP_ID: &str = "io.input-starter";

/// Version tag written into every override blob.
pub const OVERRIDES_VERSION: u32 = 1;
const OVERRIDES_VERSION_TAG: &str = "1";

/// Key the facade saves to and loads from unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = concat!("bindings_v", OVERRIDES_VERSION_TAG);

/// Config file the CLI looks for in the app data dir.
pub const CONFIG_FILE_NAME: &str = concat!(APP_ID, ".config.json");

pub const DEFAULT_CANCEL_CONTROL: Control = Control::Key(Key::Escape);

/// Scheme display name, stable identifier, device family.
/// Display names are matched exactly; ids are the rename-proof alternative.
pub const SCHEME_TABLE: &[(&str, &str, DeviceType)] = &[
    ("Keyboard and Mouse", "keyboard_mouse", DeviceType::KeyboardAndMouse),
    ("XBox Controller", "xbox", DeviceType::XBox),
    ("PlayStation Controller", "playstation", DeviceType::PlayStation),
    ("Switch Pro Controller", "switch_pro", DeviceType::SwitchPro),
];

/// Default slots per action. The index in each list is the binding slot.
pub static DEFAULT_BINDINGS: Lazy<IndexMap<Action, Vec<Binding>>> = Lazy::new(|| {
    use CompositePart::*;
    let key = |c: char| Control::Key(Key::Letter(c));
    let pad = |b: PadButton| Binding::new(Control::Pad(b));

    [
        (
            Action::Move,
            vec![
                Binding::new(Control::Stick(Side::Left)),
                Binding::composite(key('w'), Up),
                Binding::composite(key('s'), Down),
                Binding::composite(key('a'), Left),
                Binding::composite(key('d'), Right),
            ],
        ),
        (
            Action::Look,
            vec![
                Binding::new(Control::MouseDelta),
                Binding::new(Control::Stick(Side::Right)),
            ],
        ),
        (
            Action::Jump,
            vec![Binding::new(Control::Key(Key::Space)), pad(PadButton::South)],
        ),
        (
            Action::Crouch,
            vec![Binding::new(Control::Key(Key::LCtrl)), pad(PadButton::East)],
        ),
        (
            Action::Sprint,
            vec![
                Binding::new(Control::Key(Key::LShift)),
                pad(PadButton::LeftStickPress),
            ],
        ),
        (
            Action::Fire,
            vec![
                Binding::new(Control::Mouse(MouseButton::Left)),
                Binding::new(Control::Trigger(Side::Right)),
            ],
        ),
        (
            Action::Aim,
            vec![
                Binding::new(Control::Mouse(MouseButton::Right)),
                Binding::new(Control::Trigger(Side::Left)),
            ],
        ),
        (
            Action::Interact,
            vec![Binding::new(key('e')), pad(PadButton::West)],
        ),
        (
            Action::InteractAlt,
            vec![Binding::new(key('f')), pad(PadButton::North)],
        ),
    ]
    .into_iter()
    .collect()
});
