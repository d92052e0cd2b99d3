//! Static description of a rule: what it is called, how severe its findings
//! are, what fixing one costs and when it runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::types::{DetectorId, Severity};

/// Errors raised while building or parsing rule metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("invalid remediation duration '{0}': expected values such as '5min', '1h' or '1h 30min'")]
    InvalidDuration(String),

    #[error("rule key must not be empty")]
    EmptyKey,
}

/// Classification tags attached to a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Bug,
    Convention,
    Design,
    Performance,
    Security,
    Unused,
    Custom(String),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Bug => write!(f, "bug"),
            Tag::Convention => write!(f, "convention"),
            Tag::Design => write!(f, "design"),
            Tag::Performance => write!(f, "performance"),
            Tag::Security => write!(f, "security"),
            Tag::Unused => write!(f, "unused"),
            Tag::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Which source set a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleScope {
    /// Production and test sources
    All,
    /// Production sources only
    Main,
    /// Test sources only
    Test,
}

impl RuleScope {
    pub fn includes(&self, is_test: bool) -> bool {
        match self {
            RuleScope::All => true,
            RuleScope::Main => !is_test,
            RuleScope::Test => is_test,
        }
    }
}

impl Default for RuleScope {
    fn default() -> Self {
        RuleScope::Main
    }
}

/// Constant cost to fix one finding.
///
/// Parsed from and written as durations like `5min`, `1h`, `1h 30min` or
/// `2d`, where one day is eight working hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Remediation {
    minutes: u32,
}

impl Remediation {
    const MINUTES_PER_HOUR: u32 = 60;
    const MINUTES_PER_DAY: u32 = 8 * Self::MINUTES_PER_HOUR;

    pub fn from_minutes(minutes: u32) -> Self {
        Self { minutes }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

impl FromStr for Remediation {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetadataError::InvalidDuration(s.to_string());

        let mut minutes: u32 = 0;
        let mut parts = s.split_whitespace().peekable();
        if parts.peek().is_none() {
            return Err(invalid());
        }

        for part in parts {
            let split = part
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(invalid)?;
            let (amount, unit) = part.split_at(split);
            let amount: u32 = amount.parse().map_err(|_| invalid())?;
            let factor = match unit {
                "min" => 1,
                "h" => Self::MINUTES_PER_HOUR,
                "d" => Self::MINUTES_PER_DAY,
                _ => return Err(invalid()),
            };
            minutes = amount
                .checked_mul(factor)
                .and_then(|part_minutes| minutes.checked_add(part_minutes))
                .ok_or_else(invalid)?;
        }

        Ok(Self { minutes })
    }
}

impl TryFrom<String> for Remediation {
    type Error = MetadataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Remediation> for String {
    fn from(value: Remediation) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.minutes / Self::MINUTES_PER_DAY;
        let hours = (self.minutes % Self::MINUTES_PER_DAY) / Self::MINUTES_PER_HOUR;
        let minutes = self.minutes % Self::MINUTES_PER_HOUR;

        let mut parts = Vec::new();
        if days > 0 {
            parts.push(format!("{}d", days));
        }
        if hours > 0 {
            parts.push(format!("{}h", hours));
        }
        if minutes > 0 || parts.is_empty() {
            parts.push(format!("{}min", minutes));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Everything the host needs to know about a rule without running it.
///
/// Supplied to the detector at construction and never changed afterwards;
/// configuration overrides are applied by the registry to the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub key: DetectorId,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub tags: Vec<Tag>,
    pub remediation: Remediation,
    pub scope: RuleScope,
    pub activated_by_default: bool,
}

impl RuleMetadata {
    pub fn new(
        key: &str,
        name: &str,
        description: &str,
        severity: Severity,
    ) -> Result<Self, MetadataError> {
        if key.trim().is_empty() {
            return Err(MetadataError::EmptyKey);
        }

        Ok(Self {
            key: DetectorId::new(key),
            name: name.to_string(),
            description: description.to_string(),
            severity,
            tags: Vec::new(),
            remediation: Remediation::default(),
            scope: RuleScope::default(),
            activated_by_default: false,
        })
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = remediation;
        self
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn activated_by_default(mut self, activated: bool) -> Self {
        self.activated_by_default = activated;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_parsing() {
        assert_eq!("5min".parse::<Remediation>().map(|r| r.minutes()), Ok(5));
        assert_eq!("1h".parse::<Remediation>().map(|r| r.minutes()), Ok(60));
        assert_eq!("1h 30min".parse::<Remediation>().map(|r| r.minutes()), Ok(90));
        assert_eq!("2d".parse::<Remediation>().map(|r| r.minutes()), Ok(960));
    }

    #[test]
    fn test_remediation_rejects_garbage() {
        for input in ["", "  ", "5", "min", "5 min", "5mins", "-5min", "1w"] {
            assert_eq!(
                input.parse::<Remediation>(),
                Err(MetadataError::InvalidDuration(input.to_string())),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_remediation_display() {
        assert_eq!(Remediation::from_minutes(5).to_string(), "5min");
        assert_eq!(Remediation::from_minutes(90).to_string(), "1h 30min");
        assert_eq!(Remediation::from_minutes(480 + 60).to_string(), "1d 1h");
        assert_eq!(Remediation::default().to_string(), "0min");
    }

    #[test]
    fn test_scope_includes() {
        assert!(RuleScope::All.includes(true));
        assert!(RuleScope::All.includes(false));
        assert!(RuleScope::Main.includes(false));
        assert!(!RuleScope::Main.includes(true));
        assert!(RuleScope::Test.includes(true));
    }

    #[test]
    fn test_metadata_builder() {
        let metadata = RuleMetadata::new("some-rule", "Some rule", "Finds things", Severity::Minor)
            .expect("valid key")
            .with_tag(Tag::Performance)
            .with_tag(Tag::Performance)
            .with_scope(RuleScope::All)
            .activated_by_default(true);

        assert_eq!(metadata.tags, vec![Tag::Performance]);
        assert_eq!(metadata.scope, RuleScope::All);
        assert!(metadata.activated_by_default);
        assert_eq!(
            RuleMetadata::new(" ", "x", "y", Severity::Info),
            Err(MetadataError::EmptyKey)
        );
    }
}
