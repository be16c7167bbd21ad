//! Walks a tree-sitter Dart syntax tree into a [`SourceUnit`] outline.

use layer_lint_core::{
    ClassDecl, DeclKind, DirectiveKind, FieldDecl, ImportDecl, MethodDecl, MethodKind, ParamDecl,
    ParseError, SourceUnit, Span, ThrowExpr, TypeRef,
};
use tree_sitter::Node;

/// Member signature and field list kinds, most specific first.
const SIGNATURES: &[&str] = &[
    "redirecting_factory_constructor_signature",
    "factory_constructor_signature",
    "constant_constructor_signature",
    "constructor_signature",
    "operator_signature",
    "getter_signature",
    "setter_signature",
    "function_signature",
    "static_final_declaration_list",
    "initialized_identifier_list",
];

/// Named nodes that never hold part of a type reference.
const NOT_TYPES: &[&str] = &[
    "annotation",
    "marker_annotation",
    "comment",
    "documentation_comment",
    "type_parameters",
    "formal_parameter_list",
    "parameter_type_list",
    "mixins",
    "interfaces",
    "class_body",
    "enum_body",
    "extension_body",
];

fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
    std::str::from_utf8(&src[node.start_byte()..node.end_byte()]).unwrap_or("")
}

fn span(node: &Node<'_>) -> Span {
    Span::from_range(node.start_byte(), node.end_byte())
}

fn children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// First descendant (pre-order, excluding `node`) matching `pred`.
fn find<'t>(node: &Node<'t>, pred: &dyn Fn(&Node<'_>) -> bool) -> Option<Node<'t>> {
    for child in children(node) {
        if pred(&child) {
            return Some(child);
        }
        if let Some(found) = find(&child, pred) {
            return Some(found);
        }
    }
    None
}

fn last_identifier<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    children(node).into_iter().rev().find_map(|c| {
        if c.kind() == "identifier" {
            Some(c)
        } else {
            last_identifier(&c)
        }
    })
}

/// Identifier-like words of `src[start..end]`, used for modifiers.
fn words(src: &[u8], start: usize, end: usize) -> Vec<&str> {
    std::str::from_utf8(&src[start..end.max(start)])
        .unwrap_or("")
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Fills `unit` from the tree rooted at `root`.
///
/// Any `ERROR` or `MISSING` node makes the whole file a parse failure.
pub(crate) fn outline(
    root: &Node<'_>,
    src: &[u8],
    unit: &mut SourceUnit,
) -> Result<(), ParseError> {
    if let Some(bad) = first_error(*root) {
        return Err(syntax_error(&bad, src));
    }
    top_level(root, src, unit);
    throws(root, src, unit);
    Ok(())
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(&node).into_iter().find_map(first_error)
}

fn syntax_error(node: &Node<'_>, src: &[u8]) -> ParseError {
    let offset = node.start_byte();
    if node.is_missing() {
        return ParseError::new(format!("missing `{}`", node.kind()), offset);
    }
    let near: String = text(node, src)
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .chars()
        .take(24)
        .collect();
    if near.is_empty() {
        ParseError::new("unexpected end of input", offset)
    } else {
        ParseError::new(format!("syntax error near `{near}`"), offset)
    }
}

// ── directives and declarations ──

fn top_level(node: &Node<'_>, src: &[u8], unit: &mut SourceUnit) {
    for child in children(node) {
        match child.kind() {
            "library_import" | "import_specification" => {
                directive(&child, src, DirectiveKind::Import, unit);
            }
            "library_export" => directive(&child, src, DirectiveKind::Export, unit),
            "part_directive" => directive(&child, src, DirectiveKind::Part, unit),
            "part_of_directive" | "library_name" => {}
            "class_definition"
            | "mixin_declaration"
            | "enum_declaration"
            | "extension_declaration"
            | "extension_type_declaration" => unit.declarations.push(class_like(&child, src)),
            kind if kind.ends_with("_body") || kind == "block" => {}
            _ if child.named_child_count() > 0 => top_level(&child, src, unit),
            _ => {}
        }
    }
}

fn directive(node: &Node<'_>, src: &[u8], kind: DirectiveKind, unit: &mut SourceUnit) {
    let Some(uri) = find(node, &|n| matches!(n.kind(), "uri" | "string_literal")) else {
        return;
    };
    let head = find(node, &|n| n.kind() == "import_specification").unwrap_or(*node);
    unit.imports.push(ImportDecl {
        uri: unquote(text(&uri, src)).to_string(),
        kind,
        span: span(&head),
    });
}

fn unquote(literal: &str) -> &str {
    let literal = literal.trim();
    let literal = literal.strip_prefix('r').unwrap_or(literal);
    ["'''", "\"\"\"", "'", "\""]
        .iter()
        .find_map(|q| literal.strip_prefix(q).and_then(|s| s.strip_suffix(q)))
        .unwrap_or(literal)
}

fn decl_name<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(name);
    }
    for child in children(node) {
        match child.kind() {
            "identifier" | "type_identifier" => return Some(child),
            "mixin_application_class" => return decl_name(&child),
            "on" | "=" | "type_parameters" | "superclass" | "interfaces" | "mixins" => return None,
            kind if kind.ends_with("_body") => return None,
            _ => {}
        }
    }
    None
}

fn body_of<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    node.child_by_field_name("body")
        .or_else(|| children(node).into_iter().find(|c| c.kind().ends_with("_body")))
}

fn class_like(node: &Node<'_>, src: &[u8]) -> ClassDecl {
    let name = decl_name(node);
    let body = body_of(node);
    let head_end = match (name, body) {
        (Some(n), _) => n.start_byte(),
        (None, Some(b)) => b.start_byte(),
        (None, None) => node.end_byte(),
    };
    let modifiers = words(src, node.start_byte(), head_end);
    let has = |word: &str| modifiers.contains(&word);

    let mut decl = ClassDecl::new(name.map_or("", |n| text(&n, src)));
    decl.kind = match node.kind() {
        "mixin_declaration" => DeclKind::Mixin,
        "enum_declaration" => DeclKind::Enum,
        kind if kind.starts_with("extension") => DeclKind::Extension,
        _ if has("mixin") => DeclKind::Mixin,
        _ => DeclKind::Class,
    };
    decl.is_abstract = has("abstract");
    decl.is_interface = has("interface");
    decl.is_sealed = has("sealed");
    decl.name_span = match name {
        Some(n) => span(&n),
        None => node.child(0).map_or(Span::new(node.start_byte(), 0), |k| span(&k)),
    };
    decl.span = span(node);

    clauses(node, src, &mut decl);
    if let Some(body) = body {
        let members = children(&body);
        for (i, member) in members.iter().enumerate() {
            match member.kind() {
                "declaration" => member_decl(member, None, src, &mut decl),
                "method_signature" => {
                    let body = members.get(i + 1).filter(|n| n.kind() == "function_body");
                    member_decl(member, Some(body.copied().unwrap_or(*member)), src, &mut decl);
                }
                _ => {}
            }
        }
    }
    decl
}

fn clauses(node: &Node<'_>, src: &[u8], decl: &mut ClassDecl) {
    for child in children(node) {
        match child.kind() {
            "superclass" | "mixin_application" => {
                if let Some(base) = types_in(&children(&child), src).into_iter().next() {
                    decl.extends = Some(base);
                }
                clauses(&child, src, decl);
            }
            "mixins" => decl.mixins = types_in(&children(&child), src),
            "interfaces" => decl.implements = types_in(&children(&child), src),
            "mixin_application_class" => clauses(&child, src, decl),
            _ => {}
        }
    }
}

// ── members ──

fn signature<'t>(member: &Node<'t>) -> Option<Node<'t>> {
    let direct = children(member);
    let is_signature = |n: &Node<'_>| SIGNATURES.contains(&n.kind());
    direct.iter().find(|c| is_signature(c)).copied().or_else(|| {
        direct
            .iter()
            .find_map(|c| children(c).into_iter().find(|g| is_signature(g)))
    })
}

/// Adds the fields or method declared by `member`. `body` is the
/// `function_body` following a method signature, if any.
fn member_decl(member: &Node<'_>, body: Option<Node<'_>>, src: &[u8], decl: &mut ClassDecl) {
    let Some(sig) = signature(member) else {
        return;
    };
    let modifiers = words(src, member.start_byte(), sig.start_byte());
    let is_static = modifiers.contains(&"static");

    let kind = match sig.kind() {
        "initialized_identifier_list" | "static_final_declaration_list" => {
            fields(&sig, src, is_static, decl);
            return;
        }
        "redirecting_factory_constructor_signature" | "factory_constructor_signature" => {
            MethodKind::Factory
        }
        "constant_constructor_signature" | "constructor_signature" => MethodKind::Constructor,
        "operator_signature" => MethodKind::Operator,
        "getter_signature" => MethodKind::Getter,
        "setter_signature" => MethodKind::Setter,
        _ => MethodKind::Method,
    };

    let parts = children(&sig);
    let (name, name_span, return_type) = match kind {
        MethodKind::Constructor | MethodKind::Factory => {
            let Some(name) = name_before_params(&parts) else {
                return;
            };
            (text(&name, src).to_string(), span(&name), None)
        }
        MethodKind::Operator => {
            let Some(op) = operator_name(&sig, &parts, src) else {
                return;
            };
            op
        }
        _ => {
            let Some(name) = sig
                .child_by_field_name("name")
                .or_else(|| parts.iter().find(|c| c.kind() == "identifier").copied())
            else {
                return;
            };
            let before = parts
                .iter()
                .position(|c| c.id() == name.id())
                .unwrap_or(0);
            let return_type = types_in(&parts[..before], src).into_iter().next();
            (text(&name, src).to_string(), span(&name), return_type)
        }
    };

    let bodiless = body.is_none();
    let is_abstract = bodiless
        && !modifiers.contains(&"external")
        && matches!(
            kind,
            MethodKind::Method | MethodKind::Getter | MethodKind::Setter | MethodKind::Operator
        );
    let end = body.map_or(member.end_byte(), |b| b.end_byte().max(member.end_byte()));

    decl.methods.push(MethodDecl {
        name,
        kind,
        return_type,
        params: params(&parts, src),
        is_abstract,
        is_static,
        name_span,
        span: Span::from_range(member.start_byte(), end),
    });
}

/// Constructor name: `Foo` in `Foo(..)`, `create` in `Foo.create(..)`.
fn name_before_params<'t>(parts: &[Node<'t>]) -> Option<Node<'t>> {
    let end = parts
        .iter()
        .position(|c| c.kind() == "formal_parameter_list")
        .unwrap_or(parts.len());
    parts[..end].iter().rev().find_map(|c| {
        if c.kind() == "identifier" {
            Some(*c)
        } else {
            last_identifier(c)
        }
    })
}

fn operator_name(
    sig: &Node<'_>,
    parts: &[Node<'_>],
    src: &[u8],
) -> Option<(String, Span, Option<TypeRef>)> {
    let keyword = sig.start_byte() + text(sig, src).find("operator")?;
    let symbol_end = parts
        .iter()
        .find(|c| c.kind() == "formal_parameter_list")
        .map_or(sig.end_byte(), Node::start_byte);
    let symbol: String = std::str::from_utf8(&src[keyword + "operator".len()..symbol_end])
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let before: Vec<Node<'_>> = parts
        .iter()
        .take_while(|c| c.end_byte() <= keyword)
        .copied()
        .collect();
    Some((
        format!("operator{symbol}"),
        Span::from_range(keyword, symbol_end),
        types_in(&before, src).into_iter().next(),
    ))
}

fn fields(list: &Node<'_>, src: &[u8], is_static: bool, decl: &mut ClassDecl) {
    let ty = list.parent().and_then(|parent| {
        let siblings = children(&parent);
        let at = siblings.iter().position(|c| c.id() == list.id())?;
        types_in(&siblings[..at], src).into_iter().next()
    });
    for item in children(list) {
        let name = if item.kind() == "identifier" {
            Some(item)
        } else if item.is_named() {
            children(&item).into_iter().find(|c| c.kind() == "identifier")
        } else {
            None
        };
        if let Some(name) = name {
            decl.fields.push(FieldDecl {
                name: text(&name, src).to_string(),
                ty: ty.clone(),
                is_static,
                span: span(&name),
            });
        }
    }
}

fn params(sig_parts: &[Node<'_>], src: &[u8]) -> Vec<ParamDecl> {
    let mut out = Vec::new();
    if let Some(list) = sig_parts.iter().find(|c| c.kind() == "formal_parameter_list") {
        collect_params(list, src, &mut out);
    }
    out
}

fn collect_params(node: &Node<'_>, src: &[u8], out: &mut Vec<ParamDecl>) {
    for child in children(node) {
        if child.kind() == "formal_parameter" {
            out.extend(param(&child, src));
        } else if child.is_named() {
            collect_params(&child, src, out);
        }
    }
}

fn param(node: &Node<'_>, src: &[u8]) -> Option<ParamDecl> {
    // `this.x` and `super.x` take their type from the field or super parameter.
    if let Some(forwarded) = find(node, &|n| {
        matches!(n.kind(), "constructor_param" | "super_formal_parameter")
    }) {
        let name = last_identifier(&forwarded)?;
        return Some(ParamDecl {
            name: text(&name, src).to_string(),
            ty: None,
        });
    }

    let parts = children(node);
    let name_at = match node.child_by_field_name("name") {
        Some(name) => parts.iter().position(|c| c.id() == name.id())?,
        None => parts.iter().rposition(|c| c.kind() == "identifier")?,
    };
    let function_typed = parts.iter().any(|c| c.kind() == "formal_parameter_list");
    let ty = if function_typed {
        None
    } else {
        types_in(&parts[..name_at], src).into_iter().next()
    };
    Some(ParamDecl {
        name: text(&parts[name_at], src).to_string(),
        ty,
    })
}

// ── types ──

fn extend(ty: &mut TypeRef, node: &Node<'_>) {
    ty.span = Span::from_range(ty.span.offset, node.end_byte().max(ty.span.end()));
}

/// Type references spelled by `nodes`, in order. Comma-separated lists
/// (`implements A, B<C>`) yield one entry per type.
fn types_in(nodes: &[Node<'_>], src: &[u8]) -> Vec<TypeRef> {
    let mut out: Vec<TypeRef> = Vec::new();
    let mut dotted = false;
    let mut fresh = true;
    for node in nodes {
        let joined = std::mem::take(&mut dotted);
        match node.kind() {
            "." => dotted = !out.is_empty(),
            "," => fresh = true,
            "type_identifier" | "identifier" if joined => {
                if let Some(last) = out.last_mut() {
                    last.name.push('.');
                    last.name.push_str(text(node, src));
                    extend(last, node);
                }
            }
            "type_identifier" => {
                out.push(TypeRef::named(text(node, src)).with_span(span(node)));
                fresh = false;
            }
            "void_type" => {
                out.push(TypeRef::named("void").with_span(span(node)));
                fresh = false;
            }
            "record_type" => {
                out.push(TypeRef::named("Record").with_span(span(node)));
                fresh = false;
            }
            "function_type" => {
                out.push(function_type(node, src));
                fresh = false;
            }
            "Function" | "function_builtin_identifier" => {
                let ret = if fresh { None } else { out.pop() };
                let start = ret.as_ref().map_or(node.start_byte(), |t| t.span.offset);
                let ty = TypeRef::named("Function")
                    .with_args(ret.into_iter().collect())
                    .with_span(Span::from_range(start, node.end_byte()));
                out.push(ty);
                fresh = false;
            }
            "type_arguments" => {
                if let Some(last) = out.last_mut() {
                    last.args = types_in(&children(node), src);
                    extend(last, node);
                }
            }
            "nullable_type" | "?" => {
                if let Some(last) = out.last_mut() {
                    last.nullable = true;
                    extend(last, node);
                }
            }
            kind if NOT_TYPES.contains(&kind) => {}
            _ if node.is_named() && node.named_child_count() > 0 => {
                let nested = types_in(&children(node), src);
                if !nested.is_empty() {
                    fresh = false;
                }
                out.extend(nested);
            }
            _ => {}
        }
    }
    out
}

/// `void Function(String)?` is `Function<void>`, nullable.
fn function_type(node: &Node<'_>, src: &[u8]) -> TypeRef {
    let inner = types_in(&children(node), src);
    let mut ty = match inner.iter().position(|t| t.name == "Function") {
        Some(i) if i > 0 && inner[i].args.is_empty() => {
            let mut f = inner[i].clone();
            f.args = vec![inner[i - 1].clone()];
            f
        }
        Some(i) => inner[i].clone(),
        None => TypeRef::named("Function").with_args(inner.into_iter().take(1).collect()),
    };
    ty.span = span(node);
    ty
}

// ── throws ──

fn throws(root: &Node<'_>, src: &[u8], unit: &mut SourceUnit) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind().starts_with("throw_expression") {
            let offset = node.start_byte();
            let enclosing = unit
                .declarations
                .iter()
                .position(|d| d.span.offset <= offset && offset < d.span.end());
            unit.throws.push(ThrowExpr {
                thrown: thrown_name(text(&node, src)),
                enclosing,
                span: span(&node),
            });
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Last capitalized segment of the constructed type: `NotFoundException`
/// for `throw const errors.NotFoundException('a')`, nothing for `throw e`.
fn thrown_name(expr: &str) -> Option<String> {
    let mut rest = expr.strip_prefix("throw")?.trim_start();
    for keyword in ["const", "new"] {
        if let Some(after) = rest.strip_prefix(keyword) {
            if after.starts_with(char::is_whitespace) {
                rest = after.trim_start();
            }
        }
    }
    let chain_end = rest
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.')))
        .unwrap_or(rest.len());
    rest[..chain_end]
        .split('.')
        .rfind(|s| s.starts_with(|c: char| c.is_ascii_uppercase()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thrown_name_skips_keywords_and_prefixes() {
        assert_eq!(thrown_name("throw StateError('x')").as_deref(), Some("StateError"));
        assert_eq!(
            thrown_name("throw const errors.NotFoundException('a')").as_deref(),
            Some("NotFoundException")
        );
        assert_eq!(thrown_name("throw newError"), None);
        assert_eq!(thrown_name("throw e"), None);
    }

    #[test]
    fn unquote_handles_raw_and_triple_quotes() {
        assert_eq!(unquote("'a.dart'"), "a.dart");
        assert_eq!(unquote("\"c.dart\""), "c.dart");
        assert_eq!(unquote("r'x.dart'"), "x.dart");
        assert_eq!(unquote("'''y.dart'''"), "y.dart");
    }
}
