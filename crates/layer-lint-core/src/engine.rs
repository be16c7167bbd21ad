//! The rule engine: orchestrates one analysis pass.
//!
//! Files are classified, parsed and checked in parallel (one task per file),
//! then the dependency graph is built from every parsed file and the results
//! of both stages are merged by the [`Reporter`].

use std::any::Any;
use std::borrow::Cow;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::graph::{GraphAnalyzer, GraphFile, GRAPH_RULES};
use crate::layer::{Classification, DependencyPolicy, Layer, LayerClassifier};
use crate::metadata::ProjectMetadata;
use crate::patterns::PatternLibrary;
use crate::report::Reporter;
use crate::rule::{Node, NodeKind, Rule, RuleBox, RuleContext, RuleError, RuleInfo};
use crate::source::{LineIndex, SourceFile, SourceParser, SourceUnit};
use crate::taxonomy::ExceptionTypeTaxonomy;
use crate::types::{Diagnostic, LintResult, Location, Severity, Span};
use crate::utils::paths;

/// File could not be parsed; it is skipped.
pub const FILE_PARSE_ERROR: RuleInfo = RuleInfo {
    name: "file-parse-error",
    code: "CA900",
    severity: Severity::Error,
    description: "File could not be parsed and was skipped",
};

/// A rule failed or panicked while checking a file.
pub const RULE_FAILURE: RuleInfo = RuleInfo {
    name: "rule-failure",
    code: "CA901",
    severity: Severity::Warning,
    description: "A rule failed while checking a file",
};

/// A rule exceeded its time budget on a file.
pub const RULE_TIMEOUT: RuleInfo = RuleInfo {
    name: "rule-timeout",
    code: "CA902",
    severity: Severity::Warning,
    description: "A rule exceeded its time budget on a file",
};

/// Rule ids the engine emits on its own.
pub const INTERNAL_RULES: [RuleInfo; 3] = [FILE_PARSE_ERROR, RULE_FAILURE, RULE_TIMEOUT];

/// Errors that abort a pass.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No parser was supplied to the builder.
    #[error("No source parser configured")]
    MissingParser,

    /// The worker pool could not be created.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    /// The pass was cancelled; no diagnostics are published.
    #[error("Analysis cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between the caller and the engine.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Builder for configuring an [`Engine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: Option<Config>,
    rules: Vec<RuleBox>,
    parser: Option<Arc<dyn SourceParser>>,
    metadata: Option<Arc<dyn ProjectMetadata>>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Registers a rule.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Registers a boxed rule.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Registers several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Sets the source parser.
    #[must_use]
    pub fn parser<P: SourceParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Sets the project metadata provider.
    #[must_use]
    pub fn metadata<M: ProjectMetadata + 'static>(mut self, metadata: M) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }

    /// Validates configuration and builds the engine.
    ///
    /// Disabled rules are dropped here, before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for invalid configuration (including
    /// `[rules.<id>]` sections naming unknown rules) and
    /// [`EngineError::MissingParser`] when no parser was set.
    pub fn build(self) -> Result<Engine, EngineError> {
        let config = self.config.unwrap_or_default();
        let parser = self.parser.ok_or(EngineError::MissingParser)?;

        let known: Vec<&str> = self
            .rules
            .iter()
            .map(|r| r.name())
            .chain(GRAPH_RULES.iter().map(|r| r.name))
            .chain(INTERNAL_RULES.iter().map(|r| r.name))
            .collect();
        config.validate(&known)?;

        let classifier = LayerClassifier::new(&config)?;
        let policy = DependencyPolicy::new(&config)?;
        let taxonomy = Arc::new(ExceptionTypeTaxonomy::new(&config.exceptions)?);
        let patterns = Arc::new(PatternLibrary::new(&config.patterns));

        let rules: Vec<RuleBox> = self
            .rules
            .into_iter()
            .filter(|rule| {
                let enabled = config.is_rule_enabled(rule.name(), rule.enabled_by_default());
                if !enabled {
                    debug!("Skipping disabled rule: {}", rule.name());
                }
                enabled
            })
            .collect();

        let budget = match config.analyzer.rule_budget_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Ok(Engine {
            config,
            classifier,
            policy,
            patterns,
            taxonomy,
            rules,
            parser,
            metadata: self.metadata,
            budget,
        })
    }
}

/// Runs rules and graph checks over a set of source files.
///
/// Use [`Engine::builder()`] to construct an instance. An engine holds no
/// state between passes and can be shared across threads.
pub struct Engine {
    config: Config,
    classifier: LayerClassifier,
    policy: DependencyPolicy,
    patterns: Arc<PatternLibrary>,
    taxonomy: Arc<ExceptionTypeTaxonomy>,
    rules: Vec<RuleBox>,
    parser: Arc<dyn SourceParser>,
    metadata: Option<Arc<dyn ProjectMetadata>>,
    budget: Option<Duration>,
}

enum FileOutcome {
    Analyzed {
        unit: SourceUnit,
        layer: Layer,
        diagnostics: Vec<Diagnostic>,
    },
    /// The file is still a graph node, with no outgoing edges.
    Failed {
        unit: SourceUnit,
        layer: Layer,
        diagnostic: Diagnostic,
    },
    Cancelled,
}

/// Nodes of one file grouped by kind, collected in a single traversal.
struct NodeSet<'a> {
    by_kind: [Vec<Node<'a>>; 4],
}

impl<'a> NodeSet<'a> {
    fn collect(unit: &'a SourceUnit) -> Self {
        let mut by_kind: [Vec<Node<'a>>; 4] = Default::default();
        for (index, decl) in unit.declarations.iter().enumerate() {
            by_kind[NodeKind::Class.index()].push(Node::Class { index, decl });
            for method in &decl.methods {
                by_kind[NodeKind::Method.index()].push(Node::Method {
                    owner: index,
                    decl,
                    method,
                });
            }
        }
        by_kind[NodeKind::Throw.index()].extend(unit.throws.iter().map(Node::Throw));
        by_kind[NodeKind::Import.index()].extend(unit.imports.iter().map(Node::Import));
        Self { by_kind }
    }

    fn for_kinds(&self, kinds: &[NodeKind]) -> Cow<'_, [Node<'a>]> {
        match kinds {
            [single] => Cow::Borrowed(&self.by_kind[single.index()]),
            _ => {
                let mut merged: Vec<Node<'a>> = NodeKind::ALL
                    .iter()
                    .filter(|k| kinds.contains(k))
                    .flat_map(|k| self.by_kind[k.index()].iter().copied())
                    .collect();
                merged.sort_by_key(Node::offset);
                Cow::Owned(merged)
            }
        }
    }
}

impl Engine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Ids of the enabled rules, in registration order.
    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name())
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The layer classifier built from configuration.
    #[must_use]
    pub fn classifier(&self) -> &LayerClassifier {
        &self.classifier
    }

    /// Analyzes `files` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ThreadPool`] if a dedicated pool was requested
    /// and could not be created.
    pub fn analyze(&self, files: &[SourceFile]) -> Result<LintResult, EngineError> {
        self.analyze_with_cancel(files, &CancellationToken::new())
    }

    /// Analyzes `files`, checking `cancel` between files and between rules.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] if the token was cancelled before
    /// the pass completed, discarding every partial result.
    pub fn analyze_with_cancel(
        &self,
        files: &[SourceFile],
        cancel: &CancellationToken,
    ) -> Result<LintResult, EngineError> {
        info!(
            "Starting analysis of {} files with {} rules",
            files.len(),
            self.rules.len()
        );

        let mut work = Vec::with_capacity(files.len());
        let mut excluded = 0;
        for file in files {
            let classification = self.classifier.classify_detailed(&file.path);
            if classification.layer == Layer::Excluded {
                debug!("Excluding: {}", file.path.display());
                excluded += 1;
            } else {
                work.push((file, classification));
            }
        }

        let outcomes: Vec<FileOutcome> = self.in_pool(|| {
            work.par_iter()
                .map(|(file, classification)| self.analyze_file(file, classification, cancel))
                .collect()
        })?;

        if cancel.is_cancelled() {
            info!("Analysis cancelled");
            return Err(EngineError::Cancelled);
        }

        let mut reporter = Reporter::new();
        reporter.set_file_counts(work.len(), excluded);
        let mut parsed = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                FileOutcome::Analyzed {
                    unit,
                    layer,
                    diagnostics,
                } => {
                    reporter.extend(diagnostics);
                    parsed.push((unit, layer));
                }
                FileOutcome::Failed {
                    unit,
                    layer,
                    diagnostic,
                } => {
                    reporter.extend(self.apply_config(vec![diagnostic]));
                    parsed.push((unit, layer));
                }
                FileOutcome::Cancelled => return Err(EngineError::Cancelled),
            }
        }

        // Every non-excluded file is a node, parsed or not.
        let graph_files: Vec<GraphFile<'_>> = parsed
            .iter()
            .map(|(unit, layer)| GraphFile {
                unit,
                layer: *layer,
            })
            .collect();
        let graph = GraphAnalyzer::new(&self.config, &self.classifier, &self.policy)
            .analyze(&graph_files);
        reporter.extend(self.apply_config(graph.diagnostics));

        if cancel.is_cancelled() {
            info!("Analysis cancelled");
            return Err(EngineError::Cancelled);
        }

        let result = reporter.finish();
        info!(
            "Analysis complete: {} diagnostics in {} files ({} excluded)",
            result.diagnostics.len(),
            result.files_checked,
            result.files_excluded
        );
        Ok(result)
    }

    fn in_pool<T: Send>(&self, work: impl FnOnce() -> T + Send) -> Result<T, EngineError> {
        match self.config.analyzer.parallelism {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    fn analyze_file(
        &self,
        file: &SourceFile,
        classification: &Classification,
        cancel: &CancellationToken,
    ) -> FileOutcome {
        if cancel.is_cancelled() {
            return FileOutcome::Cancelled;
        }
        debug!(
            "Analyzing: {} ({})",
            file.path.display(),
            classification.layer
        );

        let unit = match self.parser.parse(&file.path, &file.content) {
            Ok(unit) => unit,
            Err(e) => {
                warn!("Failed to parse {}: {}", file.path.display(), e);
                return FileOutcome::Failed {
                    unit: SourceUnit::new(&file.path, &file.content),
                    layer: classification.layer,
                    diagnostic: parse_failure(&file.path, &file.content, &e),
                };
            }
        };

        let mut diagnostics = Vec::new();
        {
            let nodes = NodeSet::collect(&unit);
            let mut ctx = RuleContext::new(
                &unit,
                classification,
                &self.patterns,
                &self.taxonomy,
                &self.config,
            );
            if let Some(metadata) = &self.metadata {
                ctx = ctx.with_metadata(metadata.as_ref());
            }

            for rule in &self.rules {
                if cancel.is_cancelled() {
                    return FileOutcome::Cancelled;
                }
                let subscribed = nodes.for_kinds(rule.subscriptions());
                if subscribed.is_empty() {
                    continue;
                }
                diagnostics.extend(self.run_rule(rule.as_ref(), &ctx, &subscribed));
            }
        }

        FileOutcome::Analyzed {
            unit,
            layer: classification.layer,
            diagnostics,
        }
    }

    /// Runs one rule on one file, isolating errors, panics and overruns.
    fn run_rule(
        &self,
        rule: &dyn Rule,
        ctx: &RuleContext<'_>,
        nodes: &[Node<'_>],
    ) -> Vec<Diagnostic> {
        let started = Instant::now();
        ctx.arm_deadline(self.budget.map(|b| started + b));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.check(ctx, nodes)));
        ctx.arm_deadline(None);

        let file = &ctx.unit.path;
        let internal = match outcome {
            Ok(Ok(mut diagnostics)) => {
                let elapsed = started.elapsed();
                if self.budget.is_some_and(|budget| elapsed > budget) {
                    self.timeout(rule, file, elapsed)
                } else {
                    if let Some(severity) = self.config.rule_severity(rule.name()) {
                        for d in &mut diagnostics {
                            d.severity = severity;
                        }
                    }
                    return diagnostics;
                }
            }
            Ok(Err(RuleError::BudgetExhausted)) => self.timeout(rule, file, started.elapsed()),
            Ok(Err(e)) => {
                warn!("Rule {} failed on {}: {}", rule.name(), file.display(), e);
                internal_diagnostic(
                    &RULE_FAILURE,
                    file,
                    format!("Rule '{}' failed: {e}", rule.name()),
                )
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(
                    "Rule {} panicked on {}: {}",
                    rule.name(),
                    file.display(),
                    message
                );
                internal_diagnostic(
                    &RULE_FAILURE,
                    file,
                    format!("Rule '{}' panicked: {message}", rule.name()),
                )
            }
        };
        self.apply_config(vec![internal])
    }

    fn timeout(&self, rule: &dyn Rule, file: &Path, elapsed: Duration) -> Diagnostic {
        warn!(
            "Rule {} exceeded its budget on {} ({:?})",
            rule.name(),
            file.display(),
            elapsed
        );
        internal_diagnostic(
            &RULE_TIMEOUT,
            file,
            format!(
                "Rule '{}' exceeded its time budget ({} ms) and its results were discarded",
                rule.name(),
                self.config.analyzer.rule_budget_ms
            ),
        )
    }

    /// Applies enable/severity settings to diagnostics the engine emits itself.
    fn apply_config(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| self.config.is_rule_enabled(&d.rule, true))
            .map(|mut d| {
                if let Some(severity) = self.config.rule_severity(&d.rule) {
                    d.severity = severity;
                }
                d
            })
            .collect()
    }
}

fn internal_diagnostic(info: &RuleInfo, file: &Path, message: String) -> Diagnostic {
    Diagnostic::new(
        info.code,
        info.name,
        info.severity,
        Location::file_start(file.to_path_buf()),
        message,
    )
}

fn parse_failure(path: &Path, content: &str, error: &crate::source::ParseError) -> Diagnostic {
    let file = std::path::PathBuf::from(paths::normalize(path));
    let offset = error.offset.min(content.len());
    let (line, column) = LineIndex::new(content).line_col(offset);
    Diagnostic::new(
        FILE_PARSE_ERROR.code,
        FILE_PARSE_ERROR.name,
        FILE_PARSE_ERROR.severity,
        Location::new(file, line, column).with_span(Span::new(offset, 0)),
        format!("File could not be parsed and was skipped: {}", error.message),
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
