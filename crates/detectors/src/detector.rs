use anyhow::Result;
use ast::{AstNode, GrammarKind, Located, SourceFile};
use std::any::Any;

use crate::metadata::{RuleMetadata, RuleScope, Tag};
use crate::types::{AnalysisContext, DetectorId, Finding, Severity};

/// Core trait that all checks must implement.
///
/// Detectors are shared between threads analysing different files, so they
/// take `&self` only and must not keep per-file state.
pub trait Detector: Send + Sync {
    /// Static description of the rule
    fn metadata(&self) -> &RuleMetadata;

    /// Grammar kinds whose nodes are handed to [`Detector::visit_node`]
    fn subscriptions(&self) -> Vec<GrammarKind>;

    /// Called once per subscribed node, in document order
    fn visit_node(&self, node: &AstNode<'_>, ctx: &mut AnalysisContext) -> Result<()>;

    /// Called once per file before its tree is walked
    fn visit_file(&self, _file: &SourceFile<'_>, _ctx: &mut AnalysisContext) -> Result<()> {
        Ok(())
    }

    /// Unique identifier for this detector
    fn id(&self) -> DetectorId {
        self.metadata().key.clone()
    }

    /// Human-readable name of the detector
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Description of what this detector finds
    fn description(&self) -> &str {
        &self.metadata().description
    }

    /// Tags this detector belongs to
    fn tags(&self) -> &[Tag] {
        &self.metadata().tags
    }

    /// Severity level this detector reports
    fn default_severity(&self) -> Severity {
        self.metadata().severity
    }

    /// Source set this detector runs on
    fn scope(&self) -> RuleScope {
        self.metadata().scope
    }

    /// Whether this detector is active unless configured otherwise
    fn is_enabled(&self) -> bool {
        self.metadata().activated_by_default
    }

    /// Get the detector as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Base implementation for detectors with common functionality
#[derive(Debug, Clone)]
pub struct BaseDetector {
    pub metadata: RuleMetadata,
}

impl BaseDetector {
    pub fn new(metadata: RuleMetadata) -> Self {
        Self { metadata }
    }

    /// Helper method to create a finding anchored at `anchor` with the rule's defaults
    pub fn create_finding(
        &self,
        ctx: &AnalysisContext,
        message: String,
        anchor: &impl Located,
    ) -> Finding {
        Finding::new(
            self.metadata.key.clone(),
            self.metadata.severity,
            message,
            ctx.location_of(anchor),
        )
        .with_tags(&self.metadata.tags)
        .with_remediation(self.metadata.remediation)
    }
}
