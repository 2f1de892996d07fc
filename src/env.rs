use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::OnceLock;

use tokio::sync::{Mutex, MutexGuard};

pub const GOPATH_VAR: &str = "GOPATH";

fn override_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Process-wide environment variable override scoped to the guard's lifetime.
///
/// The process environment is shared by every task, so overrides are
/// serialised: a second override waits until the first guard is dropped.
/// Dropping restores the previous value, or removes the variable when it was
/// unset before.
pub struct ScopedEnvVar {
    name: String,
    previous: Option<OsString>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnvVar {
    pub async fn set(name: &str, value: impl AsRef<OsStr>) -> Self {
        let lock = override_lock().lock().await;
        let previous = env::var_os(name);
        env::set_var(name, value);
        Self {
            name: name.to_string(),
            previous,
            _lock: lock,
        }
    }

    pub fn previous(&self) -> Option<&OsStr> {
        self.previous.as_deref()
    }
}

impl Drop for ScopedEnvVar {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => env::set_var(&self.name, value),
            None => env::remove_var(&self.name),
        }
    }
}

/// Replaces `${NAME}` placeholders with the current value of the environment
/// variable; unknown variables expand to nothing.
pub fn expand_placeholders(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut token = String::new();
            for next in chars.by_ref() {
                if next == '}' {
                    break;
                }
                token.push(next);
            }
            if !token.is_empty() {
                if let Ok(replacement) = env::var(&token) {
                    result.push_str(&replacement);
                }
            }
            continue;
        }
        result.push(ch);
    }
    result
}
