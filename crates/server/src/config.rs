use std::{fs, path::Path, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub asset_dir: PathBuf,
    pub archive_capacity: usize,
    pub log_enabled: bool,
    pub log_level: String,
    pub graceful_term_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:4000".into(),
            asset_dir: PathBuf::from("./asset"),
            archive_capacity: 5,
            log_enabled: true,
            log_level: "INFO".into(),
            graceful_term_millis: 0,
        }
    }
}

/// Layout of `server.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    asset_dir: Option<PathBuf>,
    archive_capacity: Option<usize>,
    logging: FileLogging,
    graceful_term_millis: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLogging {
    enable: Option<bool>,
    level: Option<String>,
}

impl Settings {
    /// Maps the configured level name onto a tracing filter directive.
    pub fn log_filter(&self) -> &'static str {
        if !self.log_enabled {
            return "off";
        }
        match self.log_level.trim().to_ascii_uppercase().as_str() {
            "ERROR" => "error",
            "WARNING" | "WARN" => "warn",
            "DEBUG" => "debug",
            "TRACE" => "trace",
            _ => "info",
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        apply_file(&mut settings, file_cfg);
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__ASSET_DIR") {
        settings.asset_dir = PathBuf::from(v);
    }
    if let Some(v) = env("APP__ARCHIVE_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.archive_capacity = parsed;
        }
    }
    if let Some(v) = env("APP__LOG_ENABLED") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.log_enabled = parsed;
        }
    }
    if let Some(v) = env("APP__LOG_LEVEL") {
        settings.log_level = v;
    }
    if let Some(v) = env("APP__GRACEFUL_TERM_MILLIS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.graceful_term_millis = parsed;
        }
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.bind_addr {
        settings.server_bind = v;
    }
    if let Some(v) = file_cfg.asset_dir {
        settings.asset_dir = v;
    }
    if let Some(v) = file_cfg.archive_capacity {
        settings.archive_capacity = v;
    }
    if let Some(v) = file_cfg.logging.enable {
        settings.log_enabled = v;
    }
    if let Some(v) = file_cfg.logging.level {
        settings.log_level = v;
    }
    if let Some(v) = file_cfg.graceful_term_millis {
        settings.graceful_term_millis = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
