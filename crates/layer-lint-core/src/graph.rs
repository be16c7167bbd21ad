//! File-level dependency graph: import resolution, forbidden layer edges,
//! self-imports and import cycles.
//!
//! Runs after every file of the pass has been parsed and classified. Direct
//! violations are a single scan over the edge list; cycles come from one
//! iterative Tarjan pass over the whole graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::config::Config;
use crate::layer::{DependencyPolicy, Layer, LayerClassifier};
use crate::rule::RuleInfo;
use crate::source::{DirectiveKind, ImportDecl, SourceUnit};
use crate::types::{Diagnostic, Label, Location, Severity, Span, Suggestion};
use crate::utils::paths;

/// Forbidden layer-to-layer import.
pub const LAYER_DEPENDENCY: RuleInfo = RuleInfo {
    name: "layer-dependency",
    code: "CA001",
    severity: Severity::Error,
    description: "Imports must not cross layers in a forbidden direction",
};

/// Import cycle spanning several files.
pub const CIRCULAR_DEPENDENCY: RuleInfo = RuleInfo {
    name: "circular-dependency",
    code: "CA002",
    severity: Severity::Error,
    description: "Files must not form import cycles",
};

/// File importing itself, directly or through a re-exporting file.
pub const SELF_IMPORT: RuleInfo = RuleInfo {
    name: "self-import",
    code: "CA003",
    severity: Severity::Warning,
    description: "A file must not import itself",
};

/// Project import that cannot be resolved to exactly one file.
pub const UNRESOLVED_IMPORT: RuleInfo = RuleInfo {
    name: "unresolved-import",
    code: "CA004",
    severity: Severity::Warning,
    description: "Project imports must resolve to exactly one analyzed file",
};

/// Rule ids produced by the graph pass.
pub const GRAPH_RULES: [RuleInfo; 4] = [
    LAYER_DEPENDENCY,
    CIRCULAR_DEPENDENCY,
    SELF_IMPORT,
    UNRESOLVED_IMPORT,
];

/// A resolved import between two project files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Importing file.
    pub from: String,
    /// Imported file.
    pub to: String,
    /// Layer of the importing file.
    pub from_layer: Layer,
    /// Layer of the imported file.
    pub to_layer: Layer,
    /// Directive kind.
    pub kind: DirectiveKind,
    /// Span of the directive in the importing file.
    pub span: Span,
}

/// All files and resolved edges of one pass.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Layer>,
    edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Files in the graph, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Resolved edges in discovery order.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Layer of a node.
    #[must_use]
    pub fn layer_of(&self, file: &str) -> Option<Layer> {
        self.nodes.get(file).copied()
    }

    /// Strongly connected components with more than one member.
    ///
    /// Each component is ordered canonically: it starts at its smallest file
    /// and follows edges depth-first (neighbors in sorted order), so the same
    /// cycle yields the same list whichever file the search started from.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let index: BTreeMap<&str, usize> = self
            .nodes
            .keys()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); names.len()];
        for edge in &self.edges {
            if let (Some(&f), Some(&t)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str())) {
                if f != t {
                    adjacency[f].insert(t);
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan(&adjacency)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                canonical_order(&scc, &adjacency)
                    .into_iter()
                    .map(|i| names[i].to_string())
                    .collect()
            })
            .collect();
        cycles.sort();
        cycles
    }
}

/// Iterative Tarjan SCC over an adjacency list.
fn tarjan(adjacency: &[BTreeSet<usize>]) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;

    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut sccs = Vec::new();
    let mut counter = 0;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        // (node, neighbors) frames replace the recursion.
        let mut frames: Vec<(usize, std::collections::btree_set::Iter<'_, usize>)> = Vec::new();
        index[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;
        frames.push((root, adjacency[root].iter()));

        while let Some((v, neighbors)) = frames.last_mut() {
            let v = *v;
            if let Some(&w) = neighbors.next() {
                if index[w] == UNVISITED {
                    index[w] = counter;
                    lowlink[w] = counter;
                    counter += 1;
                    stack.push(w);
                    on_stack[w] = true;
                    frames.push((w, adjacency[w].iter()));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            frames.pop();
            if let Some((parent, _)) = frames.last() {
                lowlink[*parent] = lowlink[*parent].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut scc = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                scc.sort_unstable();
                sccs.push(scc);
            }
        }
    }
    sccs
}

/// Depth-first order of an SCC starting at its smallest member.
fn canonical_order(scc: &[usize], adjacency: &[BTreeSet<usize>]) -> Vec<usize> {
    let members: BTreeSet<usize> = scc.iter().copied().collect();
    let Some(&start) = members.first() else {
        return Vec::new();
    };
    let mut order = Vec::with_capacity(members.len());
    let mut seen = BTreeSet::new();
    let mut pending = vec![start];
    while let Some(v) = pending.pop() {
        if !seen.insert(v) {
            continue;
        }
        order.push(v);
        // Reverse so the smallest neighbor is visited first.
        for &w in adjacency[v].iter().rev() {
            if members.contains(&w) && !seen.contains(&w) {
                pending.push(w);
            }
        }
    }
    order
}

/// Where an import URI points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// SDK or foreign package; not part of the graph.
    External,
    /// Exactly one project file.
    File(String),
    /// A project path that is not among the analyzed files.
    Missing(String),
    /// Several project files match.
    Ambiguous(Vec<String>),
    /// Points at an excluded file (generated code, tests).
    Excluded,
}

/// Resolves import URIs to project files.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    package: Option<String>,
    source_root: String,
}

impl ImportResolver {
    /// Creates a resolver from analyzer configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            package: config.analyzer.package.clone(),
            source_root: paths::normalize_str(&config.analyzer.source_root),
        }
    }

    /// Resolves `uri`, written in `from`, against the set of analyzed files.
    #[must_use]
    pub fn resolve(
        &self,
        from: &str,
        uri: &str,
        files: &BTreeSet<String>,
        classifier: &LayerClassifier,
    ) -> Resolution {
        if uri.starts_with("dart:") {
            return Resolution::External;
        }

        if let Some(rest) = uri.strip_prefix("package:") {
            let Some((package, path)) = rest.split_once('/') else {
                return Resolution::External;
            };
            return match &self.package {
                Some(own) if own == package => {
                    let target = paths::normalize_str(&format!("{}/{path}", self.source_root));
                    self.check(target, files, classifier)
                }
                Some(_) => Resolution::External,
                None => self.resolve_unknown_package(path, files),
            };
        }

        if uri.contains(':') {
            return Resolution::External;
        }

        match paths::resolve_relative(from, uri) {
            Some(target) => self.check(target, files, classifier),
            None => Resolution::Missing(uri.to_string()),
        }
    }

    fn check(
        &self,
        target: String,
        files: &BTreeSet<String>,
        classifier: &LayerClassifier,
    ) -> Resolution {
        if files.contains(&target) {
            Resolution::File(target)
        } else if classifier.is_excluded(&target) {
            Resolution::Excluded
        } else {
            Resolution::Missing(target)
        }
    }

    // Without a configured package name, any `package:` import whose path
    // exists under a source root is taken as a project import.
    fn resolve_unknown_package(&self, path: &str, files: &BTreeSet<String>) -> Resolution {
        let suffix = format!("{}/{}", self.source_root, paths::normalize_str(path));
        let nested = format!("/{suffix}");
        let candidates: Vec<String> = files
            .iter()
            .filter(|f| **f == suffix || f.ends_with(&nested))
            .cloned()
            .collect();
        match candidates.len() {
            0 => Resolution::External,
            1 => candidates
                .into_iter()
                .next()
                .map_or(Resolution::External, Resolution::File),
            _ => Resolution::Ambiguous(candidates),
        }
    }
}

/// One analyzed file as seen by the graph pass.
///
/// A file that failed to parse is passed with an import-free unit: imports
/// into it still resolve and are layer-checked, and it has no outgoing edges.
#[derive(Debug, Clone, Copy)]
pub struct GraphFile<'a> {
    /// The parsed file.
    pub unit: &'a SourceUnit,
    /// Its layer.
    pub layer: Layer,
}

/// Graph plus the diagnostics derived from it.
#[derive(Debug, Clone, Default)]
pub struct GraphReport {
    /// The resolved graph.
    pub graph: DependencyGraph,
    /// Layer, self-import, cycle and resolution diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds the dependency graph and runs every graph check.
#[derive(Debug, Clone)]
pub struct GraphAnalyzer<'a> {
    classifier: &'a LayerClassifier,
    policy: &'a DependencyPolicy,
    resolver: ImportResolver,
}

impl<'a> GraphAnalyzer<'a> {
    /// Creates the analyzer.
    #[must_use]
    pub fn new(
        config: &Config,
        classifier: &'a LayerClassifier,
        policy: &'a DependencyPolicy,
    ) -> Self {
        Self {
            classifier,
            policy,
            resolver: ImportResolver::new(config),
        }
    }

    /// Resolves imports and reports violations for all files at once.
    #[must_use]
    pub fn analyze(&self, files: &[GraphFile<'_>]) -> GraphReport {
        let mut report = GraphReport::default();
        let known: BTreeSet<String> = files.iter().map(|f| f.unit.path_str()).collect();
        for file in files {
            report.graph.nodes.insert(file.unit.path_str(), file.layer);
        }

        let mut pending_imports: Vec<(usize, &ImportDecl, String)> = Vec::new();
        let mut exports: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (file_idx, file) in files.iter().enumerate() {
            let from = file.unit.path_str();
            for import in &file.unit.imports {
                if import.kind == DirectiveKind::Part {
                    continue;
                }
                match self
                    .resolver
                    .resolve(&from, &import.uri, &known, self.classifier)
                {
                    Resolution::File(to) => {
                        if import.kind == DirectiveKind::Export {
                            exports.entry(from.clone()).or_default().push(to.clone());
                        }
                        pending_imports.push((file_idx, import, to));
                    }
                    Resolution::Missing(target) => {
                        warn!("Unresolved import '{}' in {}", import.uri, from);
                        report.diagnostics.push(
                            graph_diagnostic(
                                &UNRESOLVED_IMPORT,
                                file.unit.location(import.span),
                                format!(
                                    "Import '{}' does not resolve to an analyzed file (expected '{target}')",
                                    import.uri
                                ),
                            ),
                        );
                    }
                    Resolution::Ambiguous(candidates) => {
                        warn!("Ambiguous import '{}' in {}", import.uri, from);
                        report.diagnostics.push(graph_diagnostic(
                            &UNRESOLVED_IMPORT,
                            file.unit.location(import.span),
                            format!(
                                "Import '{}' is ambiguous: matches {}",
                                import.uri,
                                candidates.join(", ")
                            ),
                        ));
                    }
                    Resolution::External | Resolution::Excluded => {}
                }
            }
        }

        for (file_idx, import, to) in pending_imports {
            let file = &files[file_idx];
            let from = file.unit.path_str();
            let location = file.unit.location(import.span);

            if to == from {
                report.diagnostics.push(graph_diagnostic(
                    &SELF_IMPORT,
                    location,
                    format!("'{from}' imports itself"),
                ));
                continue;
            }
            if import.kind == DirectiveKind::Import && reexports(&exports, &to, &from) {
                report.diagnostics.push(
                    graph_diagnostic(
                        &SELF_IMPORT,
                        location,
                        format!("'{from}' imports itself through the re-export in '{to}'"),
                    )
                    .with_suggestion(Suggestion::new(
                        "import the declarations you need directly instead of the re-exporting file",
                    )),
                );
                continue;
            }

            let to_layer = report.graph.layer_of(&to).unwrap_or(Layer::Unclassified);
            let edge = DependencyEdge {
                from,
                to,
                from_layer: file.layer,
                to_layer,
                kind: import.kind,
                span: import.span,
            };
            if self.policy.is_forbidden(edge.from_layer, edge.to_layer) {
                report.diagnostics.push(
                    graph_diagnostic(
                        &LAYER_DEPENDENCY,
                        location,
                        format!(
                            "{} layer must not depend on {} layer: imports '{}'",
                            edge.from_layer, edge.to_layer, edge.to
                        ),
                    )
                    .with_suggestion(Suggestion::new(format!(
                        "depend on an abstraction the {} layer can see instead of '{}'",
                        edge.from_layer, edge.to
                    ))),
                );
            }
            report.graph.edges.push(edge);
        }

        for cycle in report.graph.cycles() {
            if let Some(d) = cycle_diagnostic(&cycle, &report.graph, files) {
                report.diagnostics.push(d);
            }
        }

        debug!(
            "Dependency graph: {} nodes, {} edges",
            report.graph.nodes.len(),
            report.graph.edges.len()
        );
        report
    }
}

fn graph_diagnostic(info: &RuleInfo, location: Location, message: String) -> Diagnostic {
    Diagnostic::new(info.code, info.name, info.severity, location, message)
}

/// Whether `barrel` re-exports `target`, directly or through other exports.
fn reexports(exports: &BTreeMap<String, Vec<String>>, barrel: &str, target: &str) -> bool {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([barrel]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        for next in exports.get(current).into_iter().flatten() {
            if next == target {
                return true;
            }
            queue.push_back(next.as_str());
        }
    }
    false
}

fn cycle_diagnostic(
    cycle: &[String],
    graph: &DependencyGraph,
    files: &[GraphFile<'_>],
) -> Option<Diagnostic> {
    let first = cycle.first()?;
    let members: BTreeSet<&str> = cycle.iter().map(String::as_str).collect();
    let edge = graph
        .edges
        .iter()
        .filter(|e| e.from == *first && members.contains(e.to.as_str()))
        .min_by_key(|e| e.span.offset)?;
    let unit = files.iter().find(|f| f.unit.path_str() == *first)?.unit;

    let mut chain = cycle.join(" -> ");
    chain.push_str(" -> ");
    chain.push_str(first);

    let mut diagnostic = graph_diagnostic(
        &CIRCULAR_DEPENDENCY,
        unit.location(edge.span),
        format!("Circular dependency between {} files: {chain}", cycle.len()),
    )
    .with_suggestion(Suggestion::new(
        "break the cycle by moving shared declarations into a file both sides import",
    ));
    for member in cycle.iter().skip(1) {
        diagnostic = diagnostic.with_label(Label::new(
            Location::file_start(member.into()),
            "part of the cycle",
        ));
    }
    Some(diagnostic)
}
