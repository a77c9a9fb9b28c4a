//! Expression syntax forms.
//!
//! One variant per surface form the parser can produce. The binder gives
//! each form a type; this crate only records shape and location.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprSyntax {
    /// Placeholder symbol introduced by splat desugaring.
    AnonSymbol { span: Span },
    BinaryOp {
        op: BinaryOpKind,
        lhs: Box<ExprSyntax>,
        rhs: Box<ExprSyntax>,
        span: Span,
    },
    Conditional {
        condition: Box<ExprSyntax>,
        true_result: Box<ExprSyntax>,
        false_result: Box<ExprSyntax>,
        span: Span,
    },
    For {
        key_name: Option<String>,
        value_name: String,
        collection: Box<ExprSyntax>,
        key: Option<Box<ExprSyntax>>,
        value: Box<ExprSyntax>,
        condition: Option<Box<ExprSyntax>>,
        span: Span,
    },
    FunctionCall {
        name: String,
        name_span: Span,
        args: Vec<ExprSyntax>,
        span: Span,
    },
    Index {
        collection: Box<ExprSyntax>,
        key: Box<ExprSyntax>,
        span: Span,
    },
    Literal {
        value: LiteralValue,
        span: Span,
    },
    ObjectCons {
        items: Vec<ObjectItemSyntax>,
        span: Span,
    },
    /// The key position of an object constructor item. Wraps the actual
    /// key expression; a bare identifier key may be read as a keyword.
    ObjectConsKey {
        wrapped: Box<ExprSyntax>,
        force_non_literal: bool,
        span: Span,
    },
    RelativeTraversal {
        source: Box<ExprSyntax>,
        parts: Vec<Traverser>,
        span: Span,
    },
    ScopeTraversal {
        traversal: Traversal,
        span: Span,
    },
    Splat {
        source: Box<ExprSyntax>,
        each: Box<ExprSyntax>,
        span: Span,
    },
    Template {
        parts: Vec<ExprSyntax>,
        span: Span,
    },
    TemplateJoin {
        tuple: Box<ExprSyntax>,
        span: Span,
    },
    TemplateWrap {
        wrapped: Box<ExprSyntax>,
        span: Span,
    },
    TupleCons {
        exprs: Vec<ExprSyntax>,
        span: Span,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: Box<ExprSyntax>,
        span: Span,
    },
}

/// One `key = value` item inside an object constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectItemSyntax {
    pub key: ExprSyntax,
    pub value: ExprSyntax,
}

/// A variable reference with attribute and index steps,
/// e.g. `site.buckets[0].name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traversal {
    pub root: String,
    pub root_span: Span,
    pub parts: Vec<Traverser>,
}

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Traverser {
    Attr { name: String, span: Span },
    Index { key: LiteralValue, span: Span },
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOpKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOpKind {
    Negate,
    LogicalNot,
}

impl ExprSyntax {
    /// The source range this expression covers.
    pub fn span(&self) -> Span {
        match self {
            ExprSyntax::AnonSymbol { span }
            | ExprSyntax::BinaryOp { span, .. }
            | ExprSyntax::Conditional { span, .. }
            | ExprSyntax::For { span, .. }
            | ExprSyntax::FunctionCall { span, .. }
            | ExprSyntax::Index { span, .. }
            | ExprSyntax::Literal { span, .. }
            | ExprSyntax::ObjectCons { span, .. }
            | ExprSyntax::ObjectConsKey { span, .. }
            | ExprSyntax::RelativeTraversal { span, .. }
            | ExprSyntax::ScopeTraversal { span, .. }
            | ExprSyntax::Splat { span, .. }
            | ExprSyntax::Template { span, .. }
            | ExprSyntax::TemplateJoin { span, .. }
            | ExprSyntax::TemplateWrap { span, .. }
            | ExprSyntax::TupleCons { span, .. }
            | ExprSyntax::UnaryOp { span, .. } => *span,
        }
    }

    /// Read this expression as a bare keyword, if it is one.
    ///
    /// A bare identifier parses as a scope traversal with no steps; in key
    /// position it means the literal name rather than a variable lookup.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            ExprSyntax::ScopeTraversal { traversal, .. } if traversal.parts.is_empty() => {
                Some(&traversal.root)
            }
            _ => None,
        }
    }

    /// Convenience constructor for a string literal.
    pub fn string_literal(value: impl Into<String>, span: Span) -> ExprSyntax {
        ExprSyntax::Literal {
            value: LiteralValue::String(value.into()),
            span,
        }
    }
}

impl LiteralValue {
    pub fn is_string(&self) -> bool {
        matches!(self, LiteralValue::String(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, LiteralValue::Number(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Null => write!(f, "null"),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::String(s) => write!(f, "{:?}", s),
        }
    }
}
