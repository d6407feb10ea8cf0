use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_STORE_FILE: &str = "ledger.json";
const TMP_SUFFIX: &str = "tmp";

/// Operator preferences and store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Table file used by the JSON store. Defaults to `<home>/ledger.json`.
    pub store_path: Option<PathBuf>,
    /// Writes and reports the construction stage of each expense.
    #[serde(default)]
    pub track_stages: bool,
    #[serde(default = "Config::default_read_attempts")]
    pub read_attempts: u32,
    #[serde(default = "Config::default_read_backoff_ms")]
    pub read_backoff_ms: u64,
    #[serde(default = "Config::default_labor_amount")]
    pub labor_default_amount: f64,
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            track_stages: false,
            read_attempts: Self::default_read_attempts(),
            read_backoff_ms: Self::default_read_backoff_ms(),
            labor_default_amount: Self::default_labor_amount(),
            currency_symbol: Self::default_currency_symbol(),
        }
    }
}

impl Config {
    pub fn default_read_attempts() -> u32 {
        3
    }

    pub fn default_read_backoff_ms() -> u64 {
        1000
    }

    pub fn default_labor_amount() -> f64 {
        400.0
    }

    pub fn default_currency_symbol() -> String {
        "$".into()
    }

    /// Store file, relative paths resolved against `base`.
    pub fn resolve_store_path(&self, base: &Path) -> PathBuf {
        match &self.store_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(DEFAULT_STORE_FILE),
        }
    }
}

/// Loads and saves [`Config`] as JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(base)?;
        Ok(Self::new(base.join(CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file yields the defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|err| ConfigError::Serde(err.to_string()))?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
