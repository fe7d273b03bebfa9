use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{NoterError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub fiscal_year: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: i64,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_notice_ttl_secs() -> i64 {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            fiscal_year: String::new(),
            log_level: default_log_level(),
            notice_ttl_secs: default_notice_ttl_secs(),
        }
    }
}

impl Settings {
    pub fn notice_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.notice_ttl_secs.max(0))
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("noter.db")
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("noter")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("noter")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| NoterError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
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
