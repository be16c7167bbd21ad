//! Helpers shared by the built-in rules.

use layer_lint_core::{ClassDecl, Layer, Node, RuleConfig, RuleError};

/// Class nodes with their declaration index.
pub(crate) fn classes<'n, 'a>(
    nodes: &'n [Node<'a>],
) -> impl Iterator<Item = (usize, &'a ClassDecl)> + 'n {
    nodes.iter().filter_map(|node| match *node {
        Node::Class { index, decl } => Some((index, decl)),
        _ => None,
    })
}

/// Reads a string-array option. Missing options read as empty.
pub(crate) fn str_array(config: Option<&RuleConfig>, key: &str) -> Result<Vec<String>, RuleError> {
    let Some(value) = config.and_then(|c| c.options.get(key)) else {
        return Ok(Vec::new());
    };
    let invalid = || RuleError::InvalidOption {
        key: key.to_string(),
        reason: "expected an array of strings".to_string(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(String::from).ok_or_else(invalid))
        .collect()
}

/// Reads an array of layer names.
pub(crate) fn layers(config: Option<&RuleConfig>, key: &str) -> Result<Vec<Layer>, RuleError> {
    str_array(config, key)?
        .iter()
        .map(|name| {
            name.parse().map_err(|_| RuleError::InvalidOption {
                key: key.to_string(),
                reason: format!("unknown layer '{name}'"),
            })
        })
        .collect()
}

/// Layers whose placement rules apply.
pub(crate) fn is_placed(layer: Layer) -> bool {
    matches!(layer, Layer::Domain | Layer::Data | Layer::Presentation)
}

#[cfg(test)]
pub(crate) mod testing {
    use layer_lint_core::{Config, Diagnostic, Engine, InMemoryMetadata, Rule, SourceFile};
    use layer_lint_dart::DartParser;

    /// Runs one rule over `files` with the default configuration.
    pub fn lint<R: Rule + 'static>(rule: R, files: &[(&str, &str)]) -> Vec<Diagnostic> {
        lint_with(rule, Config::default(), None, files)
    }

    /// Runs one rule and returns only its diagnostics.
    pub fn lint_with<R: Rule + 'static>(
        rule: R,
        config: Config,
        metadata: Option<InMemoryMetadata>,
        files: &[(&str, &str)],
    ) -> Vec<Diagnostic> {
        let name = rule.name();
        let mut builder = Engine::builder()
            .config(config)
            .parser(DartParser::new())
            .rule(rule);
        if let Some(metadata) = metadata {
            builder = builder.metadata(metadata);
        }
        let engine = builder.build().expect("engine should build");
        let sources: Vec<SourceFile> = files
            .iter()
            .map(|(path, content)| SourceFile::new(*path, *content))
            .collect();
        let result = engine.analyze(&sources).expect("analysis should succeed");
        assert!(
            result.by_rule("rule-failure").is_empty() && result.by_rule("file-parse-error").is_empty(),
            "unexpected internal diagnostics: {:?}",
            result.diagnostics
        );
        result
            .diagnostics
            .into_iter()
            .filter(|d| d.rule == name)
            .collect()
    }
}
