use std::fmt;
use std::io::{stderr, stdout, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use base64::Engine;
use humantime::format_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(anyhow!("unsupported log level: {other}")),
        }
    }
}

pub trait LogSink: Send + Sync {
    fn emit(&self, entry: &Map<String, Value>);
}

/// Writes one JSON object per line; errors go to stderr, the rest to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdioSink;

impl LogSink for StdioSink {
    fn emit(&self, entry: &Map<String, Value>) {
        if let Ok(serialized) = serde_json::to_string(entry) {
            let level = entry
                .get("level")
                .and_then(|v| v.as_str())
                .unwrap_or("info");
            if level == "error" {
                let _ = writeln!(stderr(), "{}", serialized);
            } else {
                let _ = writeln!(stdout(), "{}", serialized);
            }
        }
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    entries: Mutex<Vec<Value>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Value> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|entry| entry.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

impl LogSink for CaptureSink {
    fn emit(&self, entry: &Map<String, Value>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Value::Object(entry.clone()));
        }
    }
}

fn current_timestamp() -> String {
    let now = std::time::SystemTime::now();
    format_rfc3339(now).to_string()
}

/// Only scalar tag values survive; nested values are dropped.
fn stable_tags(value: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, val) in value {
        match val {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                out.insert(key, val);
            }
            _ => {}
        }
    }
    out
}

/// Structured logger with inherited scope tags.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    min_level: Level,
    tags: Map<String, Value>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(Arc::new(StdioSink), Level::Info)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level)
            .field("tags", &self.tags)
            .finish()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, min_level: Level) -> Self {
        Self {
            sink,
            min_level,
            tags: Map::new(),
        }
    }

    /// Child logger carrying the parent's tags merged with `tags`.
    pub fn scoped(&self, tags: Value) -> Self {
        let mut merged = self.tags.clone();
        if let Value::Object(map) = tags {
            merged.extend(stable_tags(map));
        }
        Self {
            sink: self.sink.clone(),
            min_level: self.min_level,
            tags: merged,
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: Level, message: &str, data: Option<Value>) {
        if !self.enabled(level) || message.is_empty() {
            return;
        }
        let mut entry = Map::new();
        entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
        entry.insert("message".to_string(), Value::String(message.to_string()));
        if let Some(data) = data.filter(Value::is_object) {
            entry.insert("data".to_string(), data);
        }
        if !self.tags.is_empty() {
            entry.insert("tags".to_string(), Value::Object(self.tags.clone()));
        }
        entry.insert("timestamp".to_string(), Value::String(current_timestamp()));
        self.sink.emit(&entry);
    }

    pub fn debug(&self, message: &str, data: Option<Value>) {
        self.log(Level::Debug, message, data);
    }

    pub fn info(&self, message: &str, data: Option<Value>) {
        self.log(Level::Info, message, data);
    }

    pub fn warn(&self, message: &str, data: Option<Value>) {
        self.log(Level::Warn, message, data);
    }

    pub fn error(&self, message: &str, data: Option<Value>) {
        self.log(Level::Error, message, data);
    }
}

/// Renders a chaincode payload for a log line: UTF-8 text as-is, anything
/// else base64 encoded.
pub fn render_payload(payload: &[u8]) -> Value {
    match std::str::from_utf8(payload) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => {
            let mut map = Map::new();
            map.insert(
                "base64".to_string(),
                Value::String(base64::engine::general_purpose::STANDARD.encode(payload)),
            );
            Value::Object(map)
        }
    }
}
