//! Shared test utilities for integration tests
//!
//! Centralizes environment setup so configuration tests stay isolated from the
//! developer's own config file and `SERSCOPE_*` variables.

use std::sync::Mutex;
use tempfile::TempDir;

/// Serializes environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: &[&str] = &[
    "SERSCOPE_AMQP__DEFAULT_CONTEXT",
    "SERSCOPE_CHECKPOINT__DEFAULT_CONTEXT",
    "SERSCOPE_LOGGING__LEVEL",
];

/// Environment variable state to restore after test
struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
    overrides: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
            overrides: OVERRIDE_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        restore_var("HOME", self.home);
        restore_var("XDG_CONFIG_HOME", self.xdg_config_home);
        for (name, value) in self.overrides {
            restore_var(name, value);
        }
    }
}

fn restore_var(name: &str, value: Option<String>) {
    match value {
        Some(orig) => std::env::set_var(name, orig),
        None => std::env::remove_var(name),
    }
}

/// Run `f` with `XDG_CONFIG_HOME` pointed at `test_dir` and every known
/// `SERSCOPE_*` override cleared, then restore the original environment.
///
/// `vars` are set for the duration of the call.
pub fn with_config_env<F, R>(test_dir: &TempDir, vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().to_str().unwrap());
    for name in OVERRIDE_VARS {
        std::env::remove_var(name);
    }
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = f();

    env_state.restore();

    result
}

/// Write `contents` to the global config location under `test_dir`.
pub fn write_global_config(test_dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let dir = test_dir.path().join("serscope");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}
