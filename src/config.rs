use crate::error::{PackError, Result};
use crate::job::{EncryptionJob, DEFAULT_EXCLUDED_FILES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration (loaded from respack.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptorConfig {
    pub pack: PackConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Root file names copied without encryption (exact match)
    pub excluded_files: Vec<String>,
    /// Output archive is `<stem><output_suffix>.zip`
    pub output_suffix: String,
    /// Key file is `<stem><key_extension>`
    pub key_extension: String,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            excluded_files: DEFAULT_EXCLUDED_FILES.iter().map(|s| s.to_string()).collect(),
            output_suffix: "_encrypted".into(),
            key_extension: ".zip.key".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl EncryptorConfig {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| PackError::file_system(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Derive a job writing next to each other in `output_dir`
    pub fn job_for(&self, input: &Path, output_dir: &Path, master_key: String) -> EncryptionJob {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pack".to_string());

        EncryptionJob::new(
            input,
            output_dir.join(format!("{}{}.zip", stem, self.pack.output_suffix)),
            output_dir.join(format!("{}{}", stem, self.pack.key_extension)),
            master_key,
            self.pack.excluded_files.iter().cloned(),
        )
    }
}
