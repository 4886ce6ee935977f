//! Pipeline settings: where extracts are read from and where outputs go.
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `BANKDATA_*` environment variables.

use crate::data_quality::DEFAULT_SAMPLE_SIZE;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_STORAGE_ROOT: &str = "BANKDATA_STORAGE_ROOT";
pub const ENV_EXTRACTS_DIR: &str = "BANKDATA_EXTRACTS_DIR";
pub const ENV_ANALYSIS_DIR: &str = "BANKDATA_ANALYSIS_DIR";
pub const ENV_SAMPLE_SIZE: &str = "BANKDATA_SAMPLE_SIZE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Root of the runtime storage tree
    pub storage_root: PathBuf,

    /// Defaults to `<storage_root>/extracts`
    pub extracts_dir: Option<PathBuf>,

    /// Defaults to `<storage_root>/analysis`
    pub analysis_dir: Option<PathBuf>,

    /// Missing-row indices kept per key in the validation report
    pub sample_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("runtime"),
            extracts_dir: None,
            analysis_dir: None,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl PipelineSettings {
    /// Settings rooted at `storage_root` with the default layout
    pub fn with_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Self::default()
        }
    }

    pub fn extracts_dir(&self) -> PathBuf {
        self.extracts_dir
            .clone()
            .unwrap_or_else(|| self.storage_root.join("extracts"))
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.analysis_dir
            .clone()
            .unwrap_or_else(|| self.storage_root.join("analysis"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(PipelineError::Config(
                "sample_size must be greater than 0".to_string(),
            ));
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(PipelineError::Config(
                "storage_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| PipelineError::Config(format!("Failed to parse TOML: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        settings.apply_env(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Optional TOML file, then the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let settings = match config_file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
                let mut settings = Self::from_toml(&text)?;
                settings.apply_env(|name| std::env::var(name).ok())?;
                settings
            }
            None => Self::from_env()?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `BANKDATA_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(root) = non_empty(ENV_STORAGE_ROOT) {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(dir) = non_empty(ENV_EXTRACTS_DIR) {
            self.extracts_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = non_empty(ENV_ANALYSIS_DIR) {
            self.analysis_dir = Some(PathBuf::from(dir));
        }
        if let Some(size) = non_empty(ENV_SAMPLE_SIZE) {
            self.sample_size = size.trim().parse().map_err(|_| {
                PipelineError::Config(format!("{} must be a positive integer, got {:?}", ENV_SAMPLE_SIZE, size))
            })?;
        }
        Ok(())
    }

    /// Create the extracts and analysis directories if needed
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [self.extracts_dir(), self.analysis_dir()] {
            fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_layout() {
        let settings = PipelineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.extracts_dir(), PathBuf::from("runtime/extracts"));
        assert_eq!(settings.analysis_dir(), PathBuf::from("runtime/analysis"));
        assert_eq!(settings.sample_size, 10);
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = PipelineSettings::default();
        settings
            .apply_env(env(&[
                (ENV_STORAGE_ROOT, "/data/bank"),
                (ENV_SAMPLE_SIZE, "25"),
                (ENV_ANALYSIS_DIR, ""),
            ]))
            .unwrap();

        assert_eq!(settings.extracts_dir(), PathBuf::from("/data/bank/extracts"));
        assert_eq!(settings.analysis_dir(), PathBuf::from("/data/bank/analysis"));
        assert_eq!(settings.sample_size, 25);
    }

    #[test]
    fn test_invalid_sample_size_env() {
        let mut settings = PipelineSettings::default();
        let result = settings.apply_env(env(&[(ENV_SAMPLE_SIZE, "ten")]));
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_zero_sample_size_is_invalid() {
        let mut settings = PipelineSettings::default();
        settings.sample_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let settings = PipelineSettings::from_toml(
            r#"
            storage_root = "/srv/bankdata"
            extracts_dir = "/mnt/extracts"
            "#,
        )
        .unwrap();

        assert_eq!(settings.extracts_dir(), PathBuf::from("/mnt/extracts"));
        assert_eq!(settings.analysis_dir(), PathBuf::from("/srv/bankdata/analysis"));
        assert_eq!(settings.sample_size, DEFAULT_SAMPLE_SIZE);
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(ENV_ANALYSIS_DIR, "/var/lib/bankdata/reports");
        let settings = PipelineSettings::from_env();
        std::env::remove_var(ENV_ANALYSIS_DIR);

        let settings = settings.unwrap();
        assert_eq!(settings.analysis_dir(), PathBuf::from("/var/lib/bankdata/reports"));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = PipelineSettings::with_root("/tmp/x");
        let text = settings.to_toml().unwrap();
        assert_eq!(PipelineSettings::from_toml(&text).unwrap(), settings);
    }
}
