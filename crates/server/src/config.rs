use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use tracing::warn;

pub const CONFIG_FILE: &str = "tracker.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub seed_demo_data: bool,
    pub strict_transitions: bool,
    pub event_buffer: usize,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            seed_demo_data: true,
            strict_transitions: false,
            event_buffer: 64,
            max_body_bytes: 64 * 1024,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if Path::new(CONFIG_FILE).exists() {
        match read_file_overrides(Path::new(CONFIG_FILE)) {
            Ok(file_cfg) => apply_overrides(&mut settings, &file_cfg),
            Err(error) => warn!(%error, file = CONFIG_FILE, "ignoring unreadable config file"),
        }
    }

    let mut env_cfg = HashMap::new();
    for (env_key, key) in [
        ("TRACKER_BIND", "bind_addr"),
        ("APP__BIND_ADDR", "bind_addr"),
        ("APP__SEED_DEMO_DATA", "seed_demo_data"),
        ("APP__STRICT_TRANSITIONS", "strict_transitions"),
        ("APP__EVENT_BUFFER", "event_buffer"),
        ("APP__MAX_BODY_BYTES", "max_body_bytes"),
    ] {
        if let Ok(v) = std::env::var(env_key) {
            env_cfg.insert(key.to_string(), v);
        }
    }
    apply_overrides(&mut settings, &env_cfg);

    settings
}

fn read_file_overrides(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let table: toml::Table = toml::from_str(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// Applies recognised keys; values that fail to parse keep the current
/// setting.
pub fn apply_overrides(settings: &mut Settings, overrides: &HashMap<String, String>) {
    if let Some(v) = overrides.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = overrides.get("seed_demo_data") {
        parse_into(&mut settings.seed_demo_data, "seed_demo_data", v);
    }
    if let Some(v) = overrides.get("strict_transitions") {
        parse_into(&mut settings.strict_transitions, "strict_transitions", v);
    }
    if let Some(v) = overrides.get("event_buffer") {
        parse_into(&mut settings.event_buffer, "event_buffer", v);
    }
    if let Some(v) = overrides.get("max_body_bytes") {
        parse_into(&mut settings.max_body_bytes, "max_body_bytes", v);
    }
}

fn parse_into<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = raw, "ignoring invalid setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
