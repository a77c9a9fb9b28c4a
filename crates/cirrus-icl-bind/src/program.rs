//! The bind result.
//!
//! A [`Program`] owns the bound node arena, the originating files, and the
//! binder state needed to type additional syntax on demand. Downstream
//! code generators iterate nodes in dependency-respecting source order and
//! may re-bind fragments (for example, to materialize documentation
//! snippets) through [`Program::bind_expression`].
//!
//! Once constructed, a program is immutable; it can be read freely from
//! multiple consumers.

use crate::binder::Binder;
use crate::error::{Diagnostic, DiagnosticFormatter};
use crate::expr::Expression;
use crate::node::{Node, NodeId};
use cirrus_icl_ast::{ExprSyntax, File, SourceMap};

/// A fully bound program.
pub struct Program {
    binder: Binder,
    files: Vec<File>,
}

impl Program {
    pub(crate) fn new(binder: Binder, files: Vec<File>) -> Self {
        Self { binder, files }
    }

    /// The bound nodes in dependency order, ties broken by source order:
    /// every node appears after its dependencies.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.binder.bound.iter().map(|id| &self.binder.nodes[id.0])
    }

    /// Look up a node by id, as carried by scope-traversal expressions.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.binder.nodes.get(id.0)
    }

    /// Look up a top-level declaration by name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        let id = self.binder.scopes.root().get(name)?;
        self.binder.nodes.get(id.0)
    }

    /// The parsed files this program was bound from, in bind order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Bind an additional expression against the program's resolved scope
    /// and loaded schemas.
    ///
    /// Referenced schemas must already have been loaded by the original
    /// bind; this entry point performs no external calls.
    pub fn bind_expression(&self, syntax: &ExprSyntax) -> (Expression, Vec<Diagnostic>) {
        self.binder.bind_expression(syntax)
    }

    /// A diagnostic renderer over the given sources.
    pub fn diagnostic_formatter<'a>(&self, sources: &'a SourceMap) -> DiagnosticFormatter<'a> {
        DiagnosticFormatter::new(sources)
    }
}
