//! Group registry and status rules loaded once at startup.
//!
//! The on-disk format is TOML:
//!
//! ```toml
//! [[groups]]
//! id = "grupo-1"
//! name = "Grupo 1"
//! lists = ["EM PROCESSO DE CONTEÚDO"]
//! members = [{ username = "jamillyfreitass", name = "Jamily" }]
//!
//! [[status_rules]]
//! category = "done"
//! pattern = "feitos?"
//! ```
//!
//! A missing `groups` or `status_rules` section falls back to the built-ins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ReportError, Result};
use crate::groups::{Group, GroupRegistry};
use crate::status::{StatusClassifier, StatusRule};

/// File name looked up inside `~/.trelliq/` when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Serialized shape of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_rules: Option<Vec<StatusRule>>,
}

/// Read-only configuration handed to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub groups: GroupRegistry,
    pub classifier: StatusClassifier,
}

impl ReportConfig {
    /// Built-in groups and status rules.
    pub fn builtin() -> Self {
        Self {
            groups: GroupRegistry::builtin(),
            classifier: StatusClassifier::builtin(),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(text)
            .map_err(|e| ReportError::Config(format!("invalid config file: {e}")))?;
        Self::from_file(file)
    }

    /// Build configuration from an already-parsed [`ConfigFile`].
    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let groups = match file.groups {
            Some(groups) => GroupRegistry::new(groups)?,
            None => GroupRegistry::builtin(),
        };
        let classifier = match file.status_rules {
            Some(rules) => StatusClassifier::new(rules)?,
            None => StatusClassifier::builtin(),
        };
        Ok(Self { groups, classifier })
    }

    /// Load configuration from `path`, or fall back to the built-ins when
    /// `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given, using built-in groups and status rules");
            return Ok(Self::builtin());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ReportError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!(
            "Loaded config from {} ({} groups, {} status rules)",
            path.display(),
            config.groups.groups().len(),
            config.classifier.rules().len()
        );
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            groups: Some(self.groups.groups().to_vec()),
            status_rules: Some(self.classifier.rules()),
        };
        toml::to_string_pretty(&file).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// `~/.trelliq/config.toml` rooted at `base_dir`.
    pub fn default_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".trelliq").join(CONFIG_FILE_NAME)
    }
}
