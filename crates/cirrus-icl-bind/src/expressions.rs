//! Recursive-descent expression binding.
//!
//! [`Binder::bind_expression`] gives every syntax form a typed
//! [`Expression`]. Forms without an implemented typing rule degrade to an
//! [`Expression::Error`] typed `Any` plus a diagnostic; binding never
//! panics or aborts on an input program, so the rest of the tree still
//! binds.
//!
//! The traversal rule here is shared verbatim by scope traversals and
//! relative traversals: wrappers (`Optional`, `Output`, `Promise`) are
//! transparent to indexing and re-wrap the result, so indexing an
//! `output<array<T>>` yields `output<T>`.

use crate::binder::Binder;
use crate::error::{
    extra_arguments, missing_required_argument, object_keys_must_be_strings, types_not_assignable,
    undefined_variable, unknown_function, unknown_object_property, unsupported_array_index,
    unsupported_index_key, unsupported_map_key, unsupported_object_property,
    unsupported_receiver_type, Diagnostic,
};
use crate::expr::{Expression, ObjectItem};
use crate::functions::{builtin_signature, FunctionSignature};
use crate::types::Type;
use cirrus_icl_ast::{ExprSyntax, LiteralValue, Span, Traverser};
use indexmap::IndexMap;

/// A traversal step key with a known literal value.
enum IndexKey {
    String(String),
    Number(f64),
}

impl Binder {
    /// Bind one expression, returning it alongside any diagnostics.
    pub(crate) fn bind_expression(&self, syntax: &ExprSyntax) -> (Expression, Vec<Diagnostic>) {
        match syntax {
            ExprSyntax::AnonSymbol { span } => {
                self.error_expression("anonymous symbol expressions", *span)
            }
            ExprSyntax::BinaryOp { span, .. } => {
                self.error_expression("binary operator expressions", *span)
            }
            ExprSyntax::Conditional { span, .. } => {
                self.error_expression("conditional expressions", *span)
            }
            ExprSyntax::For { span, .. } => self.error_expression("for expressions", *span),
            ExprSyntax::Index { span, .. } => self.error_expression("index expressions", *span),
            ExprSyntax::Splat { span, .. } => self.error_expression("splat expressions", *span),
            ExprSyntax::UnaryOp { span, .. } => {
                self.error_expression("unary operator expressions", *span)
            }

            ExprSyntax::Literal { value, span } => {
                let ty = match value {
                    // An absent value fits anywhere a value could; the
                    // absorbing type keeps binding going.
                    LiteralValue::Null => Type::Any,
                    LiteralValue::Bool(_) => Type::Bool,
                    LiteralValue::Number(_) => Type::Number,
                    LiteralValue::String(_) => Type::String,
                };
                (
                    Expression::Literal {
                        value: value.clone(),
                        ty,
                        span: *span,
                    },
                    Vec::new(),
                )
            }

            ExprSyntax::Template { parts, span } => self.bind_template(parts, *span),

            ExprSyntax::TemplateJoin { tuple, span } => {
                let (tuple, diagnostics) = self.bind_expression(tuple);
                (
                    Expression::TemplateJoin {
                        tuple: Box::new(tuple),
                        ty: Type::String,
                        span: *span,
                    },
                    diagnostics,
                )
            }

            ExprSyntax::TemplateWrap { wrapped, .. } => self.bind_expression(wrapped),

            ExprSyntax::TupleCons { exprs, span } => self.bind_tuple_cons(exprs, *span),

            ExprSyntax::ObjectCons { items, span } => self.bind_object_cons(items, *span),

            ExprSyntax::ObjectConsKey {
                wrapped,
                force_non_literal,
                span,
            } => {
                // A bare word in key position means the literal name, not a
                // variable lookup.
                if !force_non_literal {
                    if let Some(keyword) = wrapped.as_keyword() {
                        return (
                            Expression::Literal {
                                value: LiteralValue::String(keyword.to_string()),
                                ty: Type::String,
                                span: *span,
                            },
                            Vec::new(),
                        );
                    }
                }
                self.bind_expression(wrapped)
            }

            ExprSyntax::FunctionCall {
                name,
                name_span,
                args,
                span,
            } => self.bind_function_call(name, *name_span, args, *span),

            ExprSyntax::ScopeTraversal { traversal, span } => {
                let Some(node) = self.scopes.resolve(&traversal.root) else {
                    return (
                        Expression::ScopeTraversal {
                            node: None,
                            traversal: traversal.clone(),
                            ty: Type::Any,
                            span: *span,
                        },
                        vec![undefined_variable(traversal.root_span)],
                    );
                };

                let receiver = self.nodes[node.0].ty().clone();
                let (ty, diagnostics) = self.bind_traversal_type(&receiver, &traversal.parts);
                (
                    Expression::ScopeTraversal {
                        node: Some(node),
                        traversal: traversal.clone(),
                        ty,
                        span: *span,
                    },
                    diagnostics,
                )
            }

            ExprSyntax::RelativeTraversal {
                source,
                parts,
                span,
            } => {
                let (source, mut diagnostics) = self.bind_expression(source);
                let (ty, traversal_diagnostics) =
                    self.bind_traversal_type(source.ty(), parts);
                diagnostics.extend(traversal_diagnostics);
                (
                    Expression::RelativeTraversal {
                        source: Box::new(source),
                        parts: parts.clone(),
                        ty,
                        span: *span,
                    },
                    diagnostics,
                )
            }
        }
    }

    fn error_expression(&self, form: &str, span: Span) -> (Expression, Vec<Diagnostic>) {
        (
            Expression::Error {
                ty: Type::Any,
                span,
            },
            vec![crate::error::not_yet_implemented(form, span)],
        )
    }

    fn bind_template(&self, parts: &[ExprSyntax], span: Span) -> (Expression, Vec<Diagnostic>) {
        // A template holding a single literal is that literal.
        if parts.len() == 1 {
            if let ExprSyntax::Literal { .. } = &parts[0] {
                return self.bind_expression(&parts[0]);
            }
        }

        let mut diagnostics = Vec::new();
        let mut bound = Vec::with_capacity(parts.len());
        for part in parts {
            let (part, part_diagnostics) = self.bind_expression(part);
            bound.push(part);
            diagnostics.extend(part_diagnostics);
        }
        (
            Expression::Template {
                parts: bound,
                ty: Type::String,
                span,
            },
            diagnostics,
        )
    }

    fn bind_tuple_cons(&self, exprs: &[ExprSyntax], span: Span) -> (Expression, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut bound = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let (expr, expr_diagnostics) = self.bind_expression(expr);
            bound.push(expr);
            diagnostics.extend(expr_diagnostics);
        }

        // Element type: the common type when all elements agree exactly,
        // otherwise `Any`. No widening is attempted.
        let mut element = Type::Any;
        for (index, expr) in bound.iter().enumerate() {
            if index == 0 {
                element = expr.ty().clone();
            } else if expr.ty() != &element {
                element = Type::Any;
                break;
            }
        }

        (
            Expression::TupleCons {
                exprs: bound,
                ty: Type::array(element),
                span,
            },
            diagnostics,
        )
    }

    fn bind_object_cons(
        &self,
        items: &[cirrus_icl_ast::ObjectItemSyntax],
        span: Span,
    ) -> (Expression, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut bound = Vec::with_capacity(items.len());
        for item in items {
            let (key, key_diagnostics) = self.bind_expression(&item.key);
            diagnostics.extend(key_diagnostics);
            if !Type::String.assignable_from(key.ty()) {
                diagnostics.push(object_keys_must_be_strings(key.ty(), key.span()));
            }

            let (value, value_diagnostics) = self.bind_expression(&item.value);
            diagnostics.extend(value_diagnostics);

            bound.push(ObjectItem { key, value });
        }

        // Build a structural object type when every key is a literal
        // string. One computed key makes static property names unknowable,
        // and the whole constructor types as `Any`.
        let mut properties = IndexMap::new();
        let mut computed = false;
        for item in &bound {
            match item.key.as_string_literal() {
                Some(name) => {
                    properties.insert(name.to_string(), item.value.ty().clone());
                }
                None => {
                    computed = true;
                    break;
                }
            }
        }
        let ty = if computed {
            Type::Any
        } else {
            Type::object(properties)
        };

        (
            Expression::ObjectCons {
                items: bound,
                ty,
                span,
            },
            diagnostics,
        )
    }

    fn bind_function_call(
        &self,
        name: &str,
        name_span: Span,
        args: &[ExprSyntax],
        span: Span,
    ) -> (Expression, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let definition = builtin_signature(name);
        if definition.is_none() {
            diagnostics.push(unknown_function(name, name_span));
        }

        let mut bound_args = Vec::with_capacity(args.len());
        for arg in args {
            let (arg, arg_diagnostics) = self.bind_expression(arg);
            bound_args.push(arg);
            diagnostics.extend(arg_diagnostics);
        }

        let Some(signature) = definition else {
            return (
                Expression::FunctionCall {
                    name: name.to_string(),
                    signature: FunctionSignature::unresolved(),
                    args: bound_args,
                    span,
                },
                diagnostics,
            );
        };

        // Arguments are checked positionally against the parameters.
        let mut next_arg = 0;
        for parameter in &signature.parameters {
            match bound_args.get(next_arg) {
                None => {
                    if !parameter.ty.is_optional() {
                        diagnostics.push(missing_required_argument(&parameter.name, span));
                    }
                }
                Some(arg) => {
                    if !parameter.ty.assignable_from(arg.ty()) {
                        diagnostics.push(types_not_assignable(
                            &parameter.ty,
                            arg.ty(),
                            arg.span(),
                        ));
                    }
                    next_arg += 1;
                }
            }
        }

        // Excess arguments go to the varargs parameter when there is one.
        if next_arg < bound_args.len() {
            match &signature.varargs_parameter {
                None => diagnostics.push(extra_arguments(
                    signature.parameters.len(),
                    bound_args.len(),
                    span,
                )),
                Some(varargs) => {
                    for arg in &bound_args[next_arg..] {
                        if !varargs.ty.assignable_from(arg.ty()) {
                            diagnostics.push(types_not_assignable(
                                &varargs.ty,
                                arg.ty(),
                                arg.span(),
                            ));
                        }
                    }
                }
            }
        }

        (
            Expression::FunctionCall {
                name: name.to_string(),
                signature,
                args: bound_args,
                span,
            },
            diagnostics,
        )
    }

    /// Resolve a chain of traversal steps against a receiver type.
    ///
    /// Shared by scope-traversal and relative-traversal binding. On an
    /// unsupported step the result short-circuits to `Any` with a
    /// diagnostic rather than failing the enclosing bind.
    pub(crate) fn bind_traversal_type(
        &self,
        receiver: &Type,
        parts: &[Traverser],
    ) -> (Type, Vec<Diagnostic>) {
        let mut receiver = receiver.clone();
        let mut diagnostics = Vec::new();

        for part in parts {
            let (key, span) = match part {
                Traverser::Attr { name, span } => (IndexKey::String(name.clone()), *span),
                Traverser::Index { key, span } => match key {
                    LiteralValue::Number(n) => (IndexKey::Number(*n), *span),
                    LiteralValue::String(s) => (IndexKey::String(s.clone()), *span),
                    LiteralValue::Null | LiteralValue::Bool(_) => {
                        diagnostics.push(unsupported_index_key(*span));
                        return (Type::Any, diagnostics);
                    }
                },
            };

            let (next, step_diagnostics) = self.bind_index_type(&receiver, &key, span);
            receiver = next;
            diagnostics.extend(step_diagnostics);
        }

        (receiver, diagnostics)
    }

    /// Resolve a single index/attribute step by receiver variant.
    fn bind_index_type(
        &self,
        receiver: &Type,
        key: &IndexKey,
        span: Span,
    ) -> (Type, Vec<Diagnostic>) {
        match receiver {
            // Wrappers are transparent to indexing and re-wrap the result.
            Type::Optional(element) => {
                let (ty, diagnostics) = self.bind_index_type(element, key, span);
                (Type::optional(ty), diagnostics)
            }
            Type::Output(element) => {
                let (ty, diagnostics) = self.bind_index_type(element, key, span);
                (Type::output(ty), diagnostics)
            }
            Type::Promise(element) => {
                let (ty, diagnostics) = self.bind_index_type(element, key, span);
                (Type::promise(ty), diagnostics)
            }

            Type::Map(element) => {
                let diagnostics = match key {
                    IndexKey::String(_) => Vec::new(),
                    IndexKey::Number(_) => vec![unsupported_map_key(span)],
                };
                ((**element).clone(), diagnostics)
            }

            Type::Array(element) => {
                let diagnostics = match key {
                    IndexKey::Number(_) => Vec::new(),
                    IndexKey::String(_) => vec![unsupported_array_index(span)],
                };
                ((**element).clone(), diagnostics)
            }

            Type::Object(properties) => {
                let IndexKey::String(name) = key else {
                    return (Type::Any, vec![unsupported_object_property(span)]);
                };
                match properties.get(name) {
                    Some(property) => (property.clone(), Vec::new()),
                    None => (Type::Any, vec![unknown_object_property(name, span)]),
                }
            }

            Type::Any => (Type::Any, Vec::new()),

            Type::Bool
            | Type::Int
            | Type::Number
            | Type::String
            | Type::Archive
            | Type::Asset
            | Type::Union(_)
            | Type::Token(_) => (Type::Any, vec![unsupported_receiver_type(receiver, span)]),
        }
    }
}
