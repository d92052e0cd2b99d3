use anyhow::{anyhow, Result};
use ast::{walk, AstArena, AstNode, AstVisitor, GrammarKind, SourceFile};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crate::detector::Detector;
use crate::metadata::{Remediation, Tag};
use crate::types::{AnalysisContext, AnalysisResult, DetectorId, Finding, Severity};

/// Registry for managing and executing detectors
pub struct DetectorRegistry {
    /// All registered detectors
    detectors: HashMap<DetectorId, Arc<dyn Detector>>,
    /// Enabled detector IDs, in registration order
    enabled_detectors: Vec<DetectorId>,
    /// Configuration for the registry
    config: RegistryConfig,
}

/// Per-rule settings that replace the rule's own metadata in its findings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOverride {
    pub severity: Option<Severity>,
    pub remediation: Option<Remediation>,
}

/// Configuration for the detector registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of threads for multi-file analysis (0 = one per core)
    pub max_threads: usize,
    /// Whether to stop on first error or continue
    pub fail_fast: bool,
    /// Minimum severity level to include in results
    pub min_severity: Severity,
    /// Tags to include (empty means all)
    pub enabled_tags: Vec<Tag>,
    /// Severity and remediation overrides keyed by rule
    pub overrides: HashMap<DetectorId, RuleOverride>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            fail_fast: false,
            min_severity: Severity::Info,
            enabled_tags: Vec::new(),
            overrides: HashMap::new(),
        }
    }
}

impl DetectorRegistry {
    /// Create a new detector registry
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
            enabled_detectors: Vec::new(),
            config: RegistryConfig::default(),
        }
    }

    /// Create a new detector registry with configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            detectors: HashMap::new(),
            enabled_detectors: Vec::new(),
            config,
        }
    }

    /// Create a new detector registry with all built-in detectors
    pub fn with_all_detectors() -> Self {
        let mut registry = Self::new();
        registry.register_built_in_detectors();
        registry
    }

    /// Create a new detector registry with all built-in detectors and config
    pub fn with_all_detectors_and_config(config: RegistryConfig) -> Self {
        let mut registry = Self::with_config(config);
        registry.register_built_in_detectors();
        registry
    }

    /// Register a detector; it starts enabled when its rule is activated by default
    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        let id = detector.id();
        if detector.is_enabled() && !self.enabled_detectors.contains(&id) {
            self.enabled_detectors.push(id.clone());
        }
        self.detectors.insert(id, detector);
    }

    /// Enable a detector by ID
    pub fn enable_detector(&mut self, id: &DetectorId) -> Result<()> {
        if !self.detectors.contains_key(id) {
            return Err(anyhow!("Detector not found: {}", id));
        }

        if !self.enabled_detectors.contains(id) {
            self.enabled_detectors.push(id.clone());
        }
        Ok(())
    }

    /// Disable a detector by ID
    pub fn disable_detector(&mut self, id: &DetectorId) {
        self.enabled_detectors.retain(|detector_id| detector_id != id);
    }

    /// Enable every registered detector carrying `tag`
    pub fn enable_tag(&mut self, tag: &Tag) {
        let mut ids = Vec::new();
        for (id, detector) in &self.detectors {
            if detector.tags().contains(tag) && !self.enabled_detectors.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        self.enabled_detectors.extend(ids);
    }

    /// Disable every detector carrying `tag`
    pub fn disable_tag(&mut self, tag: &Tag) {
        let detectors = &self.detectors;
        self.enabled_detectors.retain(|id| {
            detectors
                .get(id)
                .is_some_and(|detector| !detector.tags().contains(tag))
        });
    }

    /// Get all registered detector IDs, sorted
    pub fn get_detector_ids(&self) -> Vec<DetectorId> {
        let mut ids: Vec<_> = self.detectors.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Get enabled detector IDs
    pub fn get_enabled_detector_ids(&self) -> Vec<DetectorId> {
        self.enabled_detectors.clone()
    }

    pub fn is_registered(&self, id: &DetectorId) -> bool {
        self.detectors.contains_key(id)
    }

    /// Get detector by ID
    pub fn get_detector(&self, id: &DetectorId) -> Option<&Arc<dyn Detector>> {
        self.detectors.get(id)
    }

    /// Update registry configuration
    pub fn set_config(&mut self, config: RegistryConfig) {
        self.config = config;
    }

    /// Get current configuration
    pub fn get_config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Run all enabled detectors over one file in a single walk of its tree
    pub fn run_analysis(&self, file: &SourceFile<'_>) -> Result<AnalysisResult> {
        let detectors_to_run: Vec<&Arc<dyn Detector>> = self
            .enabled_detectors
            .iter()
            .filter_map(|id| self.detectors.get(id))
            .filter(|detector| self.should_run_detector(detector, file))
            .collect();

        self.run_detectors(&detectors_to_run, file)
    }

    /// Run a specific detector by ID, ignoring whether it is enabled
    pub fn run_detector(&self, id: &DetectorId, file: &SourceFile<'_>) -> Result<Vec<Finding>> {
        let detector = self
            .detectors
            .get(id)
            .ok_or_else(|| anyhow!("Detector not found: {}", id))?;

        let start_time = Instant::now();
        let mut ctx = AnalysisContext::new(file.path, file.is_test);
        detector.visit_file(file, &mut ctx)?;

        let mut dispatcher = Dispatcher::new(vec![detector], ctx, true);
        walk(&file.root, &mut dispatcher);
        let (ctx, _, failures) = dispatcher.finish();

        match failures.into_iter().next() {
            Some((_, e)) => {
                log::error!("Detector {} failed: {}", id, e);
                Err(e)
            }
            None => {
                let findings = ctx.into_findings();
                log::debug!(
                    "Detector {} completed in {:?} with {} findings",
                    id,
                    start_time.elapsed(),
                    findings.len()
                );
                Ok(findings)
            }
        }
    }

    /// Analyse independent files concurrently.
    ///
    /// The syntax tree is tied to a single-threaded arena, so every worker
    /// builds the tree for its own input through `load` and analyses it in
    /// place. Results are merged in input order.
    pub fn analyze_files<I, F>(&self, inputs: &[I], load: F) -> Result<AnalysisResult>
    where
        I: Sync,
        F: for<'a> Fn(&'a AstArena, &I) -> Result<SourceFile<'a>> + Sync,
    {
        let start_time = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_threads)
            .build()?;

        let per_file: Vec<Result<AnalysisResult>> = pool.install(|| {
            inputs
                .par_iter()
                .map(|input| {
                    let arena = AstArena::new();
                    let file = load(&arena, input)?;
                    self.run_analysis(&file)
                })
                .collect()
        });

        let mut result = AnalysisResult::new();
        for file_result in per_file {
            match file_result {
                Ok(file_result) => result.merge(file_result),
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    log::warn!("File analysis failed: {}", e);
                    result.add_error(format!("Analysis failed: {}", e));
                }
            }
        }

        result.stats.total_time_ms = start_time.elapsed().as_millis() as u64;
        log::debug!(
            "Analysed {} files in {} ms with {} findings",
            result.stats.files_analyzed,
            result.stats.total_time_ms,
            result.findings.len()
        );
        Ok(result)
    }

    fn run_detectors(
        &self,
        detectors: &[&Arc<dyn Detector>],
        file: &SourceFile<'_>,
    ) -> Result<AnalysisResult> {
        let start_time = Instant::now();
        let mut result = AnalysisResult::new();
        result.stats.detectors_run = detectors.len();
        result.stats.files_analyzed = 1;

        let mut ctx = AnalysisContext::new(file.path, file.is_test);
        let mut active = Vec::with_capacity(detectors.len());
        for detector in detectors {
            match detector.visit_file(file, &mut ctx) {
                Ok(()) => active.push(*detector),
                Err(e) => self.record_failure(&mut result, &mut ctx, &detector.id(), e)?,
            }
        }

        let mut dispatcher = Dispatcher::new(active, ctx, self.config.fail_fast);
        walk(&file.root, &mut dispatcher);
        let (mut ctx, nodes_visited, failures) = dispatcher.finish();
        result.stats.nodes_visited = nodes_visited;

        for (id, e) in failures {
            self.record_failure(&mut result, &mut ctx, &id, e)?;
        }

        for finding in ctx.into_findings() {
            let finding = self.apply_override(finding);
            if self.should_include_finding(&finding) {
                result.add_finding(finding);
            }
        }

        result.stats.total_time_ms = start_time.elapsed().as_millis() as u64;
        log::debug!(
            "{}: {} detectors, {} nodes, {} findings",
            file.path,
            result.stats.detectors_run,
            nodes_visited,
            result.findings.len()
        );
        Ok(result)
    }

    /// Fail the file under fail-fast, otherwise drop the detector's findings and keep going
    fn record_failure(
        &self,
        result: &mut AnalysisResult,
        ctx: &mut AnalysisContext,
        id: &DetectorId,
        error: anyhow::Error,
    ) -> Result<()> {
        if self.config.fail_fast {
            log::error!("Detector {} failed on {}: {}", id, ctx.file_path, error);
            return Err(error.context(format!("Detector {} failed on {}", id, ctx.file_path)));
        }

        log::warn!("Detector {} failed on {}: {}", id, ctx.file_path, error);
        ctx.discard_findings_from(id);
        result.add_error(format!("Detector {} failed on {}: {}", id, ctx.file_path, error));
        Ok(())
    }

    /// Check if a detector should be run on `file` based on configuration
    fn should_run_detector(&self, detector: &Arc<dyn Detector>, file: &SourceFile<'_>) -> bool {
        if !detector.scope().includes(file.is_test) {
            return false;
        }

        if !self.config.enabled_tags.is_empty() {
            let has_enabled_tag = detector
                .tags()
                .iter()
                .any(|tag| self.config.enabled_tags.contains(tag));

            if !has_enabled_tag {
                return false;
            }
        }

        true
    }

    fn apply_override(&self, mut finding: Finding) -> Finding {
        if let Some(rule_override) = self.config.overrides.get(&finding.detector_id) {
            if let Some(severity) = rule_override.severity {
                finding.severity = severity;
            }
            if let Some(remediation) = rule_override.remediation {
                finding.remediation = remediation;
            }
        }
        finding
    }

    /// Check if a finding should be included in results based on configuration
    fn should_include_finding(&self, finding: &Finding) -> bool {
        finding.severity >= self.config.min_severity
    }

    /// Register all built-in detectors
    fn register_built_in_detectors(&mut self) {
        self.register(Arc::new(
            crate::plsql::in_nvarchar2_usage::InNvarchar2UsageDetector::new(),
        ));
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes each visited node to the detectors subscribed to its kind
struct Dispatcher<'d> {
    subscribers: HashMap<GrammarKind, Vec<&'d Arc<dyn Detector>>>,
    ctx: AnalysisContext,
    fail_fast: bool,
    failed: HashSet<DetectorId>,
    failures: Vec<(DetectorId, anyhow::Error)>,
    nodes_visited: usize,
}

impl<'d> Dispatcher<'d> {
    fn new(detectors: Vec<&'d Arc<dyn Detector>>, ctx: AnalysisContext, fail_fast: bool) -> Self {
        let mut subscribers: HashMap<GrammarKind, Vec<&'d Arc<dyn Detector>>> = HashMap::new();
        for detector in detectors {
            for kind in detector.subscriptions() {
                subscribers.entry(kind).or_default().push(detector);
            }
        }

        Self {
            subscribers,
            ctx,
            fail_fast,
            failed: HashSet::new(),
            failures: Vec::new(),
            nodes_visited: 0,
        }
    }

    /// The context, the node count and every detector failure in the order they occurred.
    /// A failed detector is not called again for the rest of the walk.
    fn finish(self) -> (AnalysisContext, usize, Vec<(DetectorId, anyhow::Error)>) {
        (self.ctx, self.nodes_visited, self.failures)
    }
}

impl AstVisitor for Dispatcher<'_> {
    fn visit_node(&mut self, node: &AstNode<'_>) {
        self.nodes_visited += 1;
        if self.fail_fast && !self.failures.is_empty() {
            return;
        }

        let Some(detectors) = self.subscribers.get(&node.kind) else {
            return;
        };

        for detector in detectors {
            let id = detector.id();
            if self.failed.contains(&id) {
                continue;
            }

            if let Err(e) = detector.visit_node(node, &mut self.ctx) {
                self.failed.insert(id.clone());
                self.failures.push((id, e));
                if self.fail_fast {
                    return;
                }
            }
        }
    }
}

/// Builder for creating detector registries
pub struct DetectorRegistryBuilder {
    registry: DetectorRegistry,
}

impl DetectorRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            registry: DetectorRegistry::new(),
        }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.registry.set_config(config);
        self
    }

    /// Add a detector
    pub fn with_detector(mut self, detector: Arc<dyn Detector>) -> Self {
        self.registry.register(detector);
        self
    }

    /// Enable every detector carrying `tag`
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.registry.enable_tag(&tag);
        self
    }

    /// Set maximum threads
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.registry.config.max_threads = max_threads;
        self
    }

    /// Set minimum severity
    pub fn with_min_severity(mut self, min_severity: Severity) -> Self {
        self.registry.config.min_severity = min_severity;
        self
    }

    /// Build the registry
    pub fn build(self) -> DetectorRegistry {
        self.registry
    }
}

impl Default for DetectorRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
