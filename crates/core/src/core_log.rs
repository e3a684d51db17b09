use parking_lot::Mutex;

/// Logging seam for the input core. The core never prints; the host
/// (game loop, CLI, tests) decides where lines go.
pub trait CoreLog: Send + Sync {
    fn info(&self, msg: &str) {
        let _ = msg;
    }
    fn warn(&self, msg: &str) {
        let _ = msg;
    }
    fn error(&self, msg: &str) {
        let _ = msg;
    }
    fn debug(&self, msg: &str) {
        let _ = msg;
    }
}

/// No-op logger if you don't care about logs.
pub struct NoopLog;
impl CoreLog for NoopLog {}

/// Keeps every line in memory as `LEVEL: msg`. Handy for asserting on
/// warnings from tests or for dumping a session log on exit.
#[derive(Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines.lock().push(format!("{level}: {msg}"));
    }
}

impl CoreLog for MemoryLog {
    fn info(&self, msg: &str) {
        self.push("INFO", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("WARN", msg);
    }
    fn error(&self, msg: &str) {
        self.push("ERROR", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("DEBUG", msg);
    }
}
