//! Expression tree walking utilities.
//!
//! Shared pre-order traversal so the binder's analysis passes (dependency
//! extraction, referenced-package discovery) do not each reimplement
//! recursive descent.
//!
//! # Design
//!
//! - **Minimal API** - two free functions, not a trait hierarchy
//! - **Visitor pattern** - caller provides `FnMut(&ExprSyntax)`
//! - **Pre-order** - visitor sees a node before its children

use super::{Body, ExprSyntax};

/// Walk every expression in a body, including those nested in inner blocks.
///
/// Attributes are visited before blocks; within each, source order is the
/// vector order the parser produced.
pub fn walk_body<V>(body: &Body, visitor: &mut V)
where
    V: FnMut(&ExprSyntax),
{
    for attr in &body.attributes {
        walk_expr(&attr.value, visitor);
    }
    for block in &body.blocks {
        walk_body(&block.body, visitor);
    }
}

/// Walk an expression tree in pre-order, calling `visitor` for each node.
pub fn walk_expr<V>(expr: &ExprSyntax, visitor: &mut V)
where
    V: FnMut(&ExprSyntax),
{
    visitor(expr);

    match expr {
        ExprSyntax::BinaryOp { lhs, rhs, .. } => {
            walk_expr(lhs, visitor);
            walk_expr(rhs, visitor);
        }

        ExprSyntax::Conditional {
            condition,
            true_result,
            false_result,
            ..
        } => {
            walk_expr(condition, visitor);
            walk_expr(true_result, visitor);
            walk_expr(false_result, visitor);
        }

        ExprSyntax::For {
            collection,
            key,
            value,
            condition,
            ..
        } => {
            walk_expr(collection, visitor);
            if let Some(key) = key {
                walk_expr(key, visitor);
            }
            walk_expr(value, visitor);
            if let Some(condition) = condition {
                walk_expr(condition, visitor);
            }
        }

        ExprSyntax::FunctionCall { args, .. } => {
            for arg in args {
                walk_expr(arg, visitor);
            }
        }

        ExprSyntax::Index {
            collection, key, ..
        } => {
            walk_expr(collection, visitor);
            walk_expr(key, visitor);
        }

        ExprSyntax::ObjectCons { items, .. } => {
            for item in items {
                walk_expr(&item.key, visitor);
                walk_expr(&item.value, visitor);
            }
        }

        ExprSyntax::ObjectConsKey { wrapped, .. } => walk_expr(wrapped, visitor),

        ExprSyntax::RelativeTraversal { source, .. } => walk_expr(source, visitor),

        ExprSyntax::Splat { source, each, .. } => {
            walk_expr(source, visitor);
            walk_expr(each, visitor);
        }

        ExprSyntax::Template { parts, .. } => {
            for part in parts {
                walk_expr(part, visitor);
            }
        }

        ExprSyntax::TemplateJoin { tuple, .. } => walk_expr(tuple, visitor),

        ExprSyntax::TemplateWrap { wrapped, .. } => walk_expr(wrapped, visitor),

        ExprSyntax::TupleCons { exprs, .. } => {
            for inner in exprs {
                walk_expr(inner, visitor);
            }
        }

        ExprSyntax::UnaryOp { operand, .. } => walk_expr(operand, visitor),

        // Leaves
        ExprSyntax::AnonSymbol { .. }
        | ExprSyntax::Literal { .. }
        | ExprSyntax::ScopeTraversal { .. } => {}
    }
}
