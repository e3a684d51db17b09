//! Inspect and edit saved input bindings, and replay scripted input through
//! the input core.
//!
//! Examples:
//!   inputctl actions
//!   inputctl device "PlayStation Controller"
//!   inputctl rebind move 1 kb_up
//!   inputctl export --out ./my-bindings.json
//!   inputctl import ./my-bindings.json
//!   inputctl replay ./demos/replay.json
//!   inputctl --list-controls
//!
//! Notes:
//! - Bindings live in the app data dir unless --data-dir is given.
//! - Without --config, `io.input-starter.config.json` in that dir is used if present.
//! - --key picks the store key; otherwise the config's storage_key is used.

use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use input_starter_core::bindings::constants::CONFIG_FILE_NAME;
use input_starter_core::prelude::*;

// ───────────────────────────── CLI Args ─────────────────────────────

fn parse_action_arg(s: &str) -> Result<Action, String> {
    s.parse()
}

fn parse_control_arg(s: &str) -> Result<Control, String> {
    s.parse().map_err(|e: ControlParseError| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    name = "inputctl",
    version,
    about = "Inspect, rebind and replay first-person input bindings"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input config JSON (press point, deadzone, storage key, rebind options)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved bindings (defaults to the app data dir)
    #[arg(long, value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,

    /// Store key to read/write (defaults to the config's storage_key)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print all valid control tokens and exit
    #[arg(long)]
    list_controls: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every action with its effective bindings
    Actions,
    /// Classify a control scheme name
    Device { scheme: String },
    /// Capture a new control for one binding slot and save it
    Rebind {
        #[arg(value_parser = parse_action_arg)]
        action: Action,
        slot: usize,
        #[arg(value_parser = parse_control_arg)]
        control: Control,
    },
    /// Save an empty override table (back to defaults)
    Reset,
    /// Write the saved override blob to a file
    Export {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate an override blob and save it
    Import { path: PathBuf },
    /// Run a tick script and print one JSON line per tick
    Replay { script: PathBuf },
}

// ───────────────────────────── Logger ─────────────────────────────

#[derive(Clone)]
struct StderrLogger {
    verbose: bool,
}

// stdout is reserved for command output.
impl CoreLog for StderrLogger {
    fn info(&self, msg: &str) {
        eprintln!("INFO:  {msg}");
    }
    fn warn(&self, msg: &str) {
        eprintln!("WARN:  {msg}");
    }
    fn error(&self, msg: &str) {
        eprintln!("ERROR: {msg}");
    }
    fn debug(&self, msg: &str) {
        if self.verbose {
            eprintln!("DEBUG: {msg}");
        }
    }
}

// ───────────────────────────── Replay script ─────────────────────────────

#[derive(Debug, Deserialize)]
struct ReplayScript {
    ticks: Vec<ScriptTick>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptTick {
    /// Digital controls and full-pull triggers, e.g. ["kb_w","gp_rtrigger"]
    held: Vec<String>,
    mouse_delta: Option<[f32; 2]>,
    left_stick: Option<[f32; 2]>,
    right_stick: Option<[f32; 2]>,
    signals: Vec<ScriptSignal>,
    /// Open a rebind session before this tick runs.
    start_rebind: Option<ScriptRebind>,
    cancel_rebind: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptSignal {
    SchemeChanged(String),
    DeviceLost,
    DeviceRegained(String),
}

#[derive(Debug, Deserialize)]
struct ScriptRebind {
    action: String,
    slot: usize,
}

#[derive(Debug, Serialize)]
struct TickReport {
    tick: u64,
    device: String,
    #[serde(rename = "move")]
    move_input: [f32; 2],
    look: [f32; 2],
    pressed: Vec<String>,
    rebind: String,
    events: Vec<String>,
}

// ───────────────────────────── main ─────────────────────────────

fn main() -> Result<(), String> {
    let args = Args::parse();

    // Quick info mode
    if args.list_controls {
        print_control_tokens();
        return Ok(());
    }
    let Some(command) = args.command.as_ref() else {
        return Err("no command given (try --help)".into());
    };

    let logger: Arc<dyn CoreLog> = Arc::new(StderrLogger {
        verbose: args.verbose,
    });

    let files = open_store(args.data_dir.as_deref())?;
    logger.debug(&format!("Bindings dir: {}", files.dir().display()));

    // --config wins; otherwise pick up a config file sitting next to the bindings
    let config_path = args
        .config
        .clone()
        .or_else(|| Some(files.dir().join(CONFIG_FILE_NAME)).filter(|p| p.is_file()));
    let mut config = match config_path.as_ref() {
        Some(p) => {
            logger.debug(&format!("Config: {}", p.display()));
            InputConfig::load(p).map_err(|e| e.to_string())?
        }
        None => InputConfig::default(),
    };
    if let Some(k) = args.key.as_ref() {
        config.storage_key = k.clone();
    }
    config.validate().map_err(|e| e.to_string())?;
    let store: Arc<dyn KeyValueStore> = Arc::new(files);

    match command {
        Command::Actions => list_actions(store, config, logger),
        Command::Device { scheme } => {
            let ty = device_type_of(scheme);
            println!("{scheme} -> {ty} (gamepad: {})", ty.is_gamepad());
            Ok(())
        }
        Command::Rebind {
            action,
            slot,
            control,
        } => rebind(*action, *slot, *control, store, config, logger),
        Command::Reset => {
            let mut facade = build_facade(ManualSource::new(), store, config, logger.clone())?;
            facade.reset_bindings();
            facade.save_bindings().map_err(|e| e.to_string())?;
            logger.info(&format!(
                "Reset bindings under '{}'",
                facade.config().storage_key
            ));
            Ok(())
        }
        Command::Export { out } => export(out.as_deref(), store, &config, logger),
        Command::Import { path } => import(path, store, &config, logger),
        Command::Replay { script } => replay(script, store, config, logger),
    }
}

// ───────────────────────────── commands ─────────────────────────────

fn list_actions(
    store: Arc<dyn KeyValueStore>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<(), String> {
    let facade = build_facade(ManualSource::new(), store, config, logger)?;
    let overrides = facade.overrides();
    for action in Action::iter() {
        let slots = facade
            .bindings_of(action)
            .iter()
            .enumerate()
            .map(|(i, b)| {
                let mark = if overrides.get(action, i).is_some() { "*" } else { "" };
                format!("{i}:{b}{mark}")
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("{:<12} {slots}", action.name());
    }
    if !overrides.is_empty() {
        println!("(* = overridden)");
    }
    Ok(())
}

/// Runs a real capture: open the session, actuate `control` on the next
/// tick, and save only if the session completed with it.
fn rebind(
    action: Action,
    slot: usize,
    control: Control,
    store: Arc<dyn KeyValueStore>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<(), String> {
    let src = ManualSource::new();
    let mut facade = build_facade(src.clone(), store, config, logger.clone())?;

    facade
        .start_rebind(action, slot)
        .map_err(|e| e.to_string())?;
    src.set_sample(DeviceSample::new().with(control));
    facade.tick();

    if facade.rebind_state() == RebindState::AwaitingInput {
        facade.cancel_rebind().map_err(|e| e.to_string())?;
        return Err(format!("{control} cannot be captured for {action} slot {slot}"));
    }
    match facade.last_rebind_outcome() {
        Some((_, RebindState::Completed)) => {}
        _ => return Err(format!("rebind of {action} slot {slot} was cancelled")),
    }

    facade.save_bindings().map_err(|e| e.to_string())?;
    logger.info(&format!(
        "✅ {action} slot {slot} -> {control} (saved under '{}')",
        facade.config().storage_key
    ));
    Ok(())
}

fn export(
    out: Option<&Path>,
    store: Arc<dyn KeyValueStore>,
    config: &InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<(), String> {
    let key = &config.storage_key;
    let blob = match store.load(key).map_err(|e| e.to_string())? {
        Some(b) => b,
        None => {
            logger.warn(&format!("Nothing saved under '{key}'; exporting defaults"));
            BindingOverrides::new().to_json().map_err(|e| e.to_string())?
        }
    };
    let out_path = out.map(Path::to_path_buf).unwrap_or_else(default_export_path);
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("create output dir {}: {e}", parent.display()))?;
    }
    fs::write(&out_path, blob).map_err(|e| format!("write {}: {e}", out_path.display()))?;
    logger.info(&format!("✅ Wrote {}", out_path.display()));
    Ok(())
}

fn import(
    path: &Path,
    store: Arc<dyn KeyValueStore>,
    config: &InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<(), String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let table =
        BindingOverrides::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))?;
    BindingStore::new(store, logger)
        .save(&config.storage_key, &table)
        .map_err(|e| e.to_string())
}

fn replay(
    script_path: &Path,
    store: Arc<dyn KeyValueStore>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<(), String> {
    let text = fs::read_to_string(script_path)
        .map_err(|e| format!("read {}: {e}", script_path.display()))?;
    let script: ReplayScript = serde_json::from_str(&text)
        .map_err(|e| format!("parse {}: {e}", script_path.display()))?;

    let src = ManualSource::new();
    let mut facade = build_facade(src.clone(), store, config, logger.clone())?;
    let events = record_events(&mut facade);

    for (i, step) in script.ticks.iter().enumerate() {
        src.set_sample(sample_for(step, &logger));
        for signal in &step.signals {
            src.emit(match signal {
                ScriptSignal::SchemeChanged(s) => PlatformSignal::SchemeChanged(s.clone()),
                ScriptSignal::DeviceLost => PlatformSignal::DeviceLost,
                ScriptSignal::DeviceRegained(s) => PlatformSignal::DeviceRegained(s.clone()),
            });
        }
        if step.cancel_rebind {
            if let Err(e) = facade.cancel_rebind() {
                logger.warn(&format!("tick {}: cancel_rebind: {e}", i + 1));
            }
        }
        if let Some(r) = step.start_rebind.as_ref() {
            let started = parse_action_arg(&r.action)
                .and_then(|a| facade.start_rebind(a, r.slot).map_err(|e| e.to_string()));
            if let Err(e) = started {
                logger.warn(&format!("tick {}: start_rebind: {e}", i + 1));
            }
        }

        facade.tick();

        let report = TickReport {
            tick: facade.tick_count(),
            device: facade.current_device_type().to_string(),
            move_input: vec2_array(facade.move_input()),
            look: vec2_array(facade.look_input()),
            pressed: Action::iter()
                .filter(|a| facade.state_of(*a).is_pressed)
                .map(|a| a.to_string())
                .collect(),
            rebind: format!("{:?}", facade.rebind_state()),
            events: events.borrow_mut().drain(..).collect(),
        };
        let line = serde_json::to_string(&report).map_err(|e| e.to_string())?;
        println!("{line}");
    }
    Ok(())
}

// ───────────────────────────── helpers ─────────────────────────────

fn build_facade(
    source: ManualSource,
    store: Arc<dyn KeyValueStore>,
    config: InputConfig,
    logger: Arc<dyn CoreLog>,
) -> Result<InputFacade, String> {
    InputFacade::new(source, store, config, logger).map_err(|e| e.to_string())
}

fn open_store(data_dir: Option<&Path>) -> Result<FileStore, String> {
    match data_dir {
        Some(dir) => Ok(FileStore::new(dir)),
        None => FileStore::in_app_data(APP_ID).map_err(|e| e.to_string()),
    }
}

fn record_events(facade: &mut InputFacade) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    facade.on_device_changed(move |ty| l.borrow_mut().push(format!("DeviceChanged({ty})")));
    let l = log.clone();
    facade.on_device_lost(move |ty| {
        let ty = ty.map(|t| t.to_string()).unwrap_or_else(|| "?".into());
        l.borrow_mut().push(format!("DeviceLost({ty})"))
    });
    let l = log.clone();
    facade.on_device_regained(move |ty| l.borrow_mut().push(format!("DeviceRegained({ty})")));
    let l = log.clone();
    facade.on_rebind_started(move |a| l.borrow_mut().push(format!("RebindStarted({a})")));
    let l = log.clone();
    facade.on_rebind_completed(move |a| l.borrow_mut().push(format!("RebindCompleted({a})")));
    let l = log.clone();
    facade.on_rebind_cancelled(move |a| l.borrow_mut().push(format!("RebindCancelled({a})")));
    log
}

fn sample_for(step: &ScriptTick, logger: &Arc<dyn CoreLog>) -> DeviceSample {
    let mut sample = DeviceSample::new();
    for token in &step.held {
        match token.parse::<Control>() {
            Ok(c) => {
                sample.actuate(c);
            }
            Err(e) => logger.warn(&format!("replay: {e} (skipped)")),
        }
    }
    let vectors = [
        (Control::MouseDelta, step.mouse_delta),
        (Control::Stick(Side::Left), step.left_stick),
        (Control::Stick(Side::Right), step.right_stick),
    ];
    for (control, value) in vectors {
        if let Some([x, y]) = value {
            sample.set_vector(control, Vec2::new(x, y));
        }
    }
    sample
}

fn vec2_array(v: Vec2) -> [f32; 2] {
    [v.x, v.y]
}

fn default_export_path() -> PathBuf {
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("bindings-export-{ts}.json"))
}

fn print_control_tokens() {
    println!("Valid control tokens:");
    let mut line = String::new();
    for c in Control::all() {
        let token = c.to_string();
        if !line.is_empty() {
            if line.len() + 1 + token.len() > 80 {
                println!("{line}");
                line.clear();
            } else {
                line.push(' ');
            }
        }
        line.push_str(&token);
    }
    if !line.is_empty() {
        println!("{line}");
    }
}
