//! Bound, typed expressions.
//!
//! The binder turns every expression syntax form into one of these
//! variants; each carries its source span and resolved type. Expression
//! trees are owned by the node (or parent expression) that produced them,
//! never shared and never cyclic.
//!
//! Forms the binder does not implement yet are represented explicitly by
//! [`Expression::Error`], typed `Any`, so a partially supported program
//! still yields a fully shaped tree. Consumers match exhaustively; there is
//! no catch-all variant to hide behind.

use crate::functions::FunctionSignature;
use crate::node::NodeId;
use crate::types::Type;
use cirrus_icl_ast::{LiteralValue, Span, Traversal, Traverser};

/// A typed expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// A function literal; body typing is not implemented.
    AnonymousFunction {
        signature: FunctionSignature,
        body: Box<Expression>,
        span: Span,
    },
    BinaryOp {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        ty: Type,
        span: Span,
    },
    Conditional {
        condition: Box<Expression>,
        true_result: Box<Expression>,
        false_result: Box<Expression>,
        ty: Type,
        span: Span,
    },
    /// Placeholder for a form the binder could not type; always `Any`.
    Error { ty: Type, span: Span },
    For {
        collection: Box<Expression>,
        ty: Type,
        span: Span,
    },
    FunctionCall {
        name: String,
        signature: FunctionSignature,
        args: Vec<Expression>,
        span: Span,
    },
    Index {
        collection: Box<Expression>,
        key: Box<Expression>,
        ty: Type,
        span: Span,
    },
    Literal {
        value: LiteralValue,
        ty: Type,
        span: Span,
    },
    ObjectCons {
        items: Vec<ObjectItem>,
        ty: Type,
        span: Span,
    },
    RelativeTraversal {
        source: Box<Expression>,
        parts: Vec<Traverser>,
        ty: Type,
        span: Span,
    },
    ScopeTraversal {
        /// The declaration the root name resolved to, when it did.
        node: Option<NodeId>,
        traversal: Traversal,
        ty: Type,
        span: Span,
    },
    Splat {
        source: Box<Expression>,
        each: Box<Expression>,
        ty: Type,
        span: Span,
    },
    Template {
        parts: Vec<Expression>,
        ty: Type,
        span: Span,
    },
    TemplateJoin {
        tuple: Box<Expression>,
        ty: Type,
        span: Span,
    },
    TupleCons {
        exprs: Vec<Expression>,
        ty: Type,
        span: Span,
    },
    UnaryOp {
        operand: Box<Expression>,
        ty: Type,
        span: Span,
    },
}

/// One bound `key = value` pair of an object constructor.
#[derive(Debug, Clone)]
pub struct ObjectItem {
    pub key: Expression,
    pub value: Expression,
}

impl Expression {
    /// The expression's resolved type.
    pub fn ty(&self) -> &Type {
        match self {
            Expression::AnonymousFunction { signature, .. }
            | Expression::FunctionCall { signature, .. } => &signature.return_type,
            Expression::BinaryOp { ty, .. }
            | Expression::Conditional { ty, .. }
            | Expression::Error { ty, .. }
            | Expression::For { ty, .. }
            | Expression::Index { ty, .. }
            | Expression::Literal { ty, .. }
            | Expression::ObjectCons { ty, .. }
            | Expression::RelativeTraversal { ty, .. }
            | Expression::ScopeTraversal { ty, .. }
            | Expression::Splat { ty, .. }
            | Expression::Template { ty, .. }
            | Expression::TemplateJoin { ty, .. }
            | Expression::TupleCons { ty, .. }
            | Expression::UnaryOp { ty, .. } => ty,
        }
    }

    /// The source range the expression covers.
    pub fn span(&self) -> Span {
        match self {
            Expression::AnonymousFunction { span, .. }
            | Expression::BinaryOp { span, .. }
            | Expression::Conditional { span, .. }
            | Expression::Error { span, .. }
            | Expression::For { span, .. }
            | Expression::FunctionCall { span, .. }
            | Expression::Index { span, .. }
            | Expression::Literal { span, .. }
            | Expression::ObjectCons { span, .. }
            | Expression::RelativeTraversal { span, .. }
            | Expression::ScopeTraversal { span, .. }
            | Expression::Splat { span, .. }
            | Expression::Template { span, .. }
            | Expression::TemplateJoin { span, .. }
            | Expression::TupleCons { span, .. }
            | Expression::UnaryOp { span, .. } => *span,
        }
    }

    /// The literal string value, when this is a string literal.
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expression::Literal {
                value: LiteralValue::String(s),
                ..
            } => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_call_type_comes_from_signature() {
        let call = Expression::FunctionCall {
            name: "mimeType".to_string(),
            signature: FunctionSignature {
                parameters: vec![],
                varargs_parameter: None,
                return_type: Type::String,
            },
            args: vec![],
            span: Span::new(0, 0, 1),
        };
        assert_eq!(call.ty(), &Type::String);
    }

    #[test]
    fn test_as_string_literal() {
        let lit = Expression::Literal {
            value: LiteralValue::String("private".to_string()),
            ty: Type::String,
            span: Span::new(0, 0, 9),
        };
        assert_eq!(lit.as_string_literal(), Some("private"));

        let num = Expression::Literal {
            value: LiteralValue::Number(1.0),
            ty: Type::Number,
            span: Span::new(0, 0, 1),
        };
        assert_eq!(num.as_string_literal(), None);
    }
}
