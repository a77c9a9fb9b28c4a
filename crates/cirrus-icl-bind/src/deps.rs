//! Dependency extraction and referenced-package discovery.
//!
//! Both passes walk raw syntax, before any binding:
//!
//! - Dependencies: every function-call name and scope-traversal root that
//!   resolves to a declared node becomes an edge. Missing references are
//!   not reported here; expression binding issues those diagnostics.
//! - Packages: resource type tokens plus `invoke` calls with a literal
//!   token argument name the external packages whose schemas must be
//!   loaded before binding starts.

use crate::node::{Node, NodeId, NodeKind};
use crate::schema::decompose_token;
use crate::scope::Scope;
use cirrus_icl_ast::{walk_body, walk_expr, ExprSyntax, LiteralValue};
use std::collections::BTreeSet;

/// Walk every expression in a node's declaring syntax.
pub(crate) fn walk_node_syntax<V>(node: &Node, visitor: &mut V)
where
    V: FnMut(&ExprSyntax),
{
    match &node.kind {
        NodeKind::Config(config) => walk_body(&config.syntax.body, visitor),
        NodeKind::Local(local) => walk_expr(&local.syntax.value, visitor),
        NodeKind::Resource(resource) => walk_body(&resource.syntax.body, visitor),
        NodeKind::Output(output) => walk_body(&output.syntax.body, visitor),
    }
}

/// The declared nodes a node's syntax references, deduplicated, in first
/// reference order. The binder re-sorts these into source order.
pub(crate) fn node_dependencies(node: &Node, root: &Scope) -> Vec<NodeId> {
    let mut deps = Vec::new();
    walk_node_syntax(node, &mut |expr| {
        let name = match expr {
            ExprSyntax::FunctionCall { name, .. } => name.as_str(),
            ExprSyntax::ScopeTraversal { traversal, .. } => traversal.root.as_str(),
            _ => return,
        };
        if let Some(referent) = root.get(name) {
            if !deps.contains(&referent) {
                deps.push(referent);
            }
        }
    });
    deps
}

/// The names of external packages a node's syntax references.
///
/// Tokens that do not decompose are skipped here; the resource binder
/// reports them as malformed-token diagnostics.
pub(crate) fn referenced_packages(node: &Node) -> BTreeSet<String> {
    let mut packages = BTreeSet::new();

    if let NodeKind::Resource(resource) = &node.kind {
        if let Some((token, span)) = resource.token() {
            if let Ok((package, _, _)) = decompose_token(token, span) {
                packages.insert(package);
            }
        }
    }

    walk_node_syntax(node, &mut |expr| {
        if let ExprSyntax::FunctionCall { name, args, span, .. } = expr {
            if name != "invoke" {
                return;
            }
            if let Some(token) = args.first().and_then(literal_string) {
                if let Ok((package, _, _)) = decompose_token(token, *span) {
                    packages.insert(package);
                }
            }
        }
    });

    packages
}

/// The string value of a literal expression, looking through a
/// single-part template.
fn literal_string(expr: &ExprSyntax) -> Option<&str> {
    match expr {
        ExprSyntax::Literal {
            value: LiteralValue::String(s),
            ..
        } => Some(s),
        ExprSyntax::Template { parts, .. } if parts.len() == 1 => literal_string(&parts[0]),
        ExprSyntax::TemplateWrap { wrapped, .. } => literal_string(wrapped),
        _ => None,
    }
}
