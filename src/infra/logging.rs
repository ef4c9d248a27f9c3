use std::sync::{Arc, Mutex};

pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // stderr keeps stdout free for the stdio transport.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log capability handed to the Leantime client at construction.
pub trait EventSink: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Forwards to `tracing` under the `leantime` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn info(&self, msg: &str) {
        tracing::info!(target: "leantime", "{msg}");
    }
    fn debug(&self, msg: &str) {
        tracing::debug!(target: "leantime", "{msg}");
    }
    fn error(&self, msg: &str) {
        tracing::error!(target: "leantime", "{msg}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Error,
}

/// Keeps every line in memory; for tests and diagnostics.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink(Arc<Mutex<Vec<(Level, String)>>>);

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.0.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(lvl, _)| *lvl == Level::Error)
            .map(|(_, m)| m)
            .collect()
    }

    fn push(&self, level: Level, msg: &str) {
        if let Ok(mut l) = self.0.lock() {
            l.push((level, msg.to_string()));
        }
    }
}

impl EventSink for RecordingSink {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }
    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}
