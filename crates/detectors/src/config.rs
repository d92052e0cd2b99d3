use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metadata::{Remediation, Tag};
use crate::registry::{DetectorRegistry, RegistryConfig, RuleOverride};
use crate::types::{DetectorId, Severity};

/// Errors raised while loading or applying a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown rule '{0}' in configuration")]
    UnknownRule(String),
}

/// Main analyzer configuration, usually loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Rule activation and overrides
    #[serde(default)]
    pub rules: RulesConfig,
}

/// General analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Minimum severity level to report
    pub min_severity: Severity,

    /// Stop analysing a file on the first detector failure
    pub fail_fast: bool,

    /// Worker threads for multi-file analysis (0 = one per core)
    pub max_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            fail_fast: false,
            max_threads: 0,
        }
    }
}

/// Rule-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rules to enable even when not activated by default (overrides disabled)
    pub enabled_rules: Vec<String>,

    /// Rules to disable
    pub disabled_rules: Vec<String>,

    /// Tags to run (empty = all)
    pub enabled_tags: Vec<Tag>,

    /// Per-rule severity and remediation overrides
    pub overrides: HashMap<String, RuleSettings>,
}

/// Override block for a single rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub severity: Option<Severity>,
    pub remediation: Option<Remediation>,
}

impl AnalyzerConfig {
    /// Parse a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Every rule key mentioned must be registered
    pub fn validate(&self, registry: &DetectorRegistry) -> Result<(), ConfigError> {
        let mentioned = self
            .rules
            .enabled_rules
            .iter()
            .chain(self.rules.disabled_rules.iter())
            .chain(self.rules.overrides.keys());

        for key in mentioned {
            if !registry.is_registered(&DetectorId::new(key)) {
                return Err(ConfigError::UnknownRule(key.clone()));
            }
        }
        Ok(())
    }

    /// Registry settings derived from this configuration
    pub fn registry_config(&self) -> RegistryConfig {
        let overrides = self
            .rules
            .overrides
            .iter()
            .map(|(key, settings)| {
                (
                    DetectorId::new(key),
                    RuleOverride {
                        severity: settings.severity,
                        remediation: settings.remediation,
                    },
                )
            })
            .collect();

        RegistryConfig {
            max_threads: self.general.max_threads,
            fail_fast: self.general.fail_fast,
            min_severity: self.general.min_severity,
            enabled_tags: self.rules.enabled_tags.clone(),
            overrides,
        }
    }
}

impl DetectorRegistry {
    /// Validate `config`, then apply its settings and rule activation
    pub fn apply_config(&mut self, config: &AnalyzerConfig) -> Result<()> {
        config.validate(self)?;
        self.set_config(config.registry_config());

        for key in &config.rules.disabled_rules {
            self.disable_detector(&DetectorId::new(key));
        }
        for key in &config.rules.enabled_rules {
            self.enable_detector(&DetectorId::new(key))?;
        }
        Ok(())
    }
}
