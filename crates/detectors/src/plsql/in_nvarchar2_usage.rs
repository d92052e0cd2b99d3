use anyhow::Result;
use ast::{find_token, AstNode, GrammarKind, Keyword};
use std::any::Any;

use crate::detector::{BaseDetector, Detector};
use crate::metadata::{Remediation, RuleMetadata, RuleScope, Tag};
use crate::types::{AnalysisContext, DetectorId, Severity};

const RULE_KEY: &str = "in-nvarchar2-usage";
const NVARCHAR2: &str = "nvarchar2";

pub const MESSAGE: &str = "Avoid using NVARCHAR2 in IN parameters: implicit conversions against \
                           VARCHAR2 columns can prevent index usage.";

/// Direction of a routine parameter as far as this check is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMode {
    /// Explicit `IN` or no mode keyword at all
    Input,
    /// `OUT` or `IN OUT`
    OutputOrInOut,
}

impl ParameterMode {
    /// Only direct children count: an `OUT` keyword nested in the datatype or
    /// a default expression belongs to another construct.
    pub fn classify(param: &AstNode<'_>) -> Self {
        if param.has_direct_child(GrammarKind::Keyword(Keyword::Out)) {
            ParameterMode::OutputOrInOut
        } else {
            ParameterMode::Input
        }
    }
}

/// Flags input parameters whose datatype mentions NVARCHAR2 anywhere,
/// including element types of table, varray and record types.
pub struct InNvarchar2UsageDetector {
    base: BaseDetector,
}

impl InNvarchar2UsageDetector {
    pub fn new() -> Self {
        Self::with_metadata(Self::default_metadata())
    }

    pub fn with_metadata(metadata: RuleMetadata) -> Self {
        Self {
            base: BaseDetector::new(metadata),
        }
    }

    pub fn default_metadata() -> RuleMetadata {
        RuleMetadata {
            key: DetectorId::new(RULE_KEY),
            name: "IN parameters should not use NVARCHAR2".to_string(),
            description: "Detects IN parameters declared with NVARCHAR2, which force implicit \
                          conversions when compared against VARCHAR2 data"
                .to_string(),
            severity: Severity::Major,
            tags: vec![Tag::Performance],
            remediation: Remediation::from_minutes(5),
            scope: RuleScope::All,
            activated_by_default: true,
        }
    }

    /// The node a finding for `param` is anchored at: the first NVARCHAR2
    /// token of its datatype, or `None` when the parameter is not flagged.
    pub fn find_violation<'a, 'arena>(
        param: &'a AstNode<'arena>,
    ) -> Option<&'a AstNode<'arena>> {
        if ParameterMode::classify(param) != ParameterMode::Input {
            return None;
        }
        let datatype = param.first_child(GrammarKind::Datatype)?;
        find_token(datatype, NVARCHAR2)
    }
}

impl Default for InNvarchar2UsageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for InNvarchar2UsageDetector {
    fn metadata(&self) -> &RuleMetadata {
        &self.base.metadata
    }

    fn subscriptions(&self) -> Vec<GrammarKind> {
        vec![GrammarKind::ParameterDeclaration]
    }

    fn visit_node(&self, node: &AstNode<'_>, ctx: &mut AnalysisContext) -> Result<()> {
        if !node.is(GrammarKind::ParameterDeclaration) {
            return Ok(());
        }

        if let Some(anchor) = Self::find_violation(node) {
            log::trace!("{}: NVARCHAR2 input parameter at {:?}", ctx.file_path, anchor.range);
            let finding = self
                .base
                .create_finding(ctx, MESSAGE.to_string(), anchor)
                .with_fix_suggestion(
                    "Declare the parameter as VARCHAR2, or convert explicitly where the \
                     national character set is required"
                        .to_string(),
                );
            ctx.add_finding(finding);
        }

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
