use std::collections::HashMap;
use std::env;
use std::sync::Mutex;

use super::ReadEnv;

/// Environment backed by a map instead of the process environment.
///
/// Mutex-backed so it can be shared with tasks on a multi-threaded runtime.
#[derive(Debug, Default)]
pub struct InMemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl InMemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReadEnv for InMemoryEnv {
    fn var(&self, key: &str) -> Result<String, env::VarError> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or(env::VarError::NotPresent)
    }
}
