use crate::adapters::storage::flat_file::{
    DEFAULT_CUSTOMERS_FILE, DEFAULT_RECORDS_FILE, DEFAULT_VEHICLES_FILE,
};
use crate::domain::ports::{ConfigProvider, PersistMode};
use crate::utils::error::{RentalError, Result};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "rental.toml";

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub vehicles_file: String,
    pub customers_file: String,
    pub records_file: String,
    pub delimiter: String,
    pub mode: PersistMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            vehicles_file: DEFAULT_VEHICLES_FILE.to_string(),
            customers_file: DEFAULT_CUSTOMERS_FILE.to_string(),
            records_file: DEFAULT_RECORDS_FILE.to_string(),
            delimiter: ",".to_string(),
            mode: PersistMode::BestEffort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: LogFormat,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RentalError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RentalError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the variable's value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path(
            "storage.data_dir",
            &self.storage.data_dir.to_string_lossy(),
        )?;
        validation::validate_file_name("storage.vehicles_file", &self.storage.vehicles_file)?;
        validation::validate_file_name("storage.customers_file", &self.storage.customers_file)?;
        validation::validate_file_name("storage.records_file", &self.storage.records_file)?;
        validation::validate_delimiter("storage.delimiter", &self.storage.delimiter)?;

        let files = [
            &self.storage.vehicles_file,
            &self.storage.customers_file,
            &self.storage.records_file,
        ];
        for (i, file) in files.iter().enumerate() {
            if files[..i].contains(file) {
                return Err(RentalError::InvalidConfigValueError {
                    field: "storage".to_string(),
                    value: file.to_string(),
                    reason: "Each collection needs its own file".to_string(),
                });
            }
        }

        if let Some(level) = &self.logging.level {
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(RentalError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", valid_levels.join(", ")),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    fn vehicles_file(&self) -> &str {
        &self.storage.vehicles_file
    }

    fn customers_file(&self) -> &str {
        &self.storage.customers_file
    }

    fn records_file(&self) -> &str {
        &self.storage.records_file
    }

    fn delimiter(&self) -> u8 {
        // validate_config guarantees a single byte
        self.storage.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn persist_mode(&self) -> PersistMode {
        self.storage.mode
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
