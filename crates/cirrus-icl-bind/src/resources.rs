//! Resource type and body binding.
//!
//! A resource's token selects a resource definition out of its package
//! schema; from it the binder computes the input object type (what the
//! body must satisfy) and the output object type (what the rest of the
//! program sees). The body itself binds as an object constructor over the
//! block's attributes and is checked against the input type; a mismatch is
//! a diagnostic, not a failure, and the resource keeps its computed types.

use crate::binder::Binder;
use crate::error::{types_not_assignable, unknown_package, unknown_resource_type, Diagnostic};
use crate::node::{NodeId, NodeKind, Resource};
use crate::schema::decompose_token;
use crate::types::Type;
use cirrus_icl_ast::{Block, ExprSyntax, ObjectItemSyntax};

impl Binder {
    /// Bind a resource node: compute its schema types, bind its body, and
    /// check assignability.
    pub(crate) fn bind_resource(&mut self, id: NodeId) -> Vec<Diagnostic> {
        let resource = match &self.nodes[id.0].kind {
            NodeKind::Resource(resource) => resource.clone(),
            // bind_node only routes resources here.
            _ => return Vec::new(),
        };

        // Input and output types default to Any when the schema cannot be
        // resolved; the body still binds below.
        let (types, mut diagnostics) = self.resolve_resource_schema(&resource);
        let (input_type, output_type) = types.unwrap_or((Type::Any, Type::Any));

        let body = object_cons_from_body(&resource.syntax);
        let (inputs, body_diagnostics) = self.bind_expression(&body);
        diagnostics.extend(body_diagnostics);

        if !input_type.assignable_from(inputs.ty()) {
            diagnostics.push(types_not_assignable(
                &input_type,
                inputs.ty(),
                resource.syntax.span,
            ));
        }

        if let NodeKind::Resource(resource) = &mut self.nodes[id.0].kind {
            resource.input_type = input_type;
            resource.output_type = output_type;
            resource.inputs = Some(inputs);
        }

        diagnostics
    }

    /// Find the resource definition the token names and build its types.
    fn resolve_resource_schema(
        &mut self,
        resource: &Resource,
    ) -> (Option<(Type, Type)>, Vec<Diagnostic>) {
        // A missing token label was already diagnosed during declare.
        let Some((token, token_span)) = resource.token() else {
            return (None, Vec::new());
        };

        let (package, _, _) = match decompose_token(token, token_span) {
            Ok(components) => components,
            Err(diagnostic) => return (None, vec![diagnostic]),
        };

        let resource_spec = match self.schemas.package(&package) {
            None => return (None, vec![unknown_package(&package, token_span)]),
            Some(schema) => match schema.resources.get(token) {
                None => return (None, vec![unknown_resource_type(token, token_span)]),
                Some(spec) => spec.clone(),
            },
        };

        (Some(self.schemas.resource_types(&resource_spec)), Vec::new())
    }
}

/// View a block's attributes as an object constructor so the body can be
/// bound and type-checked like any other expression.
fn object_cons_from_body(block: &Block) -> ExprSyntax {
    let items = block
        .body
        .attributes_in_source_order()
        .into_iter()
        .map(|attr| ObjectItemSyntax {
            key: ExprSyntax::string_literal(attr.name.clone(), attr.name_span),
            value: attr.value.clone(),
        })
        .collect();
    ExprSyntax::ObjectCons {
        items,
        span: block.span,
    }
}
