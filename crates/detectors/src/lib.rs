// Core detector framework
pub mod detector;
pub mod metadata;
pub mod registry;
pub mod types;

// Configuration
pub mod config;

// Detector implementations
pub mod plsql;

// Re-export core types and traits
pub use config::{AnalyzerConfig, ConfigError, GeneralConfig, RuleSettings, RulesConfig};
pub use detector::{BaseDetector, Detector};
pub use metadata::{MetadataError, Remediation, RuleMetadata, RuleScope, Tag};
pub use registry::{DetectorRegistry, DetectorRegistryBuilder, RegistryConfig, RuleOverride};
pub use types::{
    AnalysisContext, AnalysisResult, AnalysisStats, DetectorId, Finding, Severity,
};
pub use plsql::{InNvarchar2UsageDetector, ParameterMode};
