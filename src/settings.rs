use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BanvicError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Length of the "recent" window used by branch rankings.
    #[serde(default = "default_trailing_months")]
    pub trailing_months: u32,
    #[serde(default = "default_chart_top")]
    pub chart_top: usize,
    #[serde(default = "default_table_top")]
    pub table_top: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_trailing_months() -> u32 {
    6
}

fn default_chart_top() -> usize {
    10
}

fn default_table_top() -> usize {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            trailing_months: default_trailing_months(),
            chart_top: default_chart_top(),
            table_top: default_table_top(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("banvic")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BanvicError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// `--data-dir` wins over the stored setting.
pub fn resolve_data_dir(settings: &Settings, cli_override: Option<&str>) -> PathBuf {
    match cli_override {
        Some(dir) => PathBuf::from(shellexpand_path(dir)),
        None => PathBuf::from(shellexpand_path(&settings.data_dir)),
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
