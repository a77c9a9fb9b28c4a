//! The bind pipeline and per-node state machine.
//!
//! # Phases
//!
//! 1. **Declare** - walk each file in name order and create one node per
//!    top-level block or attribute. Duplicate names are diagnosed and the
//!    duplicate dropped.
//! 2. **Schema pre-pass** - collect every package name referenced by any
//!    node, then load each schema exactly once. This is the only point the
//!    binder calls out of process.
//! 3. **Dependencies** - extract each node's reference edges from raw
//!    syntax and sort them into source order.
//! 4. **Bind** - visit nodes in source order, recursing into dependencies
//!    first. A three-state marker (`Unbound -> Binding -> Bound`) detects
//!    reference cycles: re-entering a `Binding` node reports a circular
//!    reference instead of recursing forever.
//!
//! One binder instance serves one `bind_program` call; nothing here is
//! shared across binds.

use crate::deps::{node_dependencies, referenced_packages};
use crate::error::{
    already_declared, circular_reference, labels_error, not_yet_implemented,
    unsupported_attribute, BindError, Diagnostic,
};
use crate::host::SchemaHost;
use crate::node::{
    BindState, ConfigVariable, LocalVariable, Node, NodeId, NodeKind, OutputVariable, Resource,
};
use crate::program::Program;
use crate::schema::SchemaRegistry;
use crate::scope::Scopes;
use crate::types::Type;
use cirrus_icl_ast::{Block, File};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub(crate) struct Binder {
    pub(crate) nodes: Vec<Node>,
    pub(crate) scopes: Scopes,
    pub(crate) schemas: SchemaRegistry,
    /// Ids of nodes currently being bound, outermost first. Used for cycle
    /// diagnostics.
    stack: Vec<NodeId>,
    /// All declared nodes in source order: files by name, then by starting
    /// byte within each file.
    pub(crate) order: Vec<NodeId>,
    /// Nodes in bind-completion order: every node follows its
    /// dependencies, ties broken by source order. This is the order the
    /// program exposes.
    pub(crate) bound: Vec<NodeId>,
}

/// Bind a parsed program.
///
/// Files are processed in stable name order so declaration order, and with
/// it diagnostic order and duplicate-name resolution, is deterministic.
///
/// # Returns
///
/// `Ok((program, diagnostics))` whenever a usable [`Program`] could be
/// produced; the diagnostics may still contain errors the caller should
/// inspect before generating code. `Err` only for failures that poison the
/// whole bind, such as an unloadable package schema.
pub fn bind_program(
    mut files: Vec<File>,
    host: &dyn SchemaHost,
) -> Result<(Program, Vec<Diagnostic>), BindError> {
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut binder = Binder::new();
    let mut diagnostics = Vec::new();

    for file in &files {
        binder.declare_file(file, &mut diagnostics);
    }
    binder.compute_order();

    // Collect referenced packages across all nodes, then resolve each
    // exactly once, so binding itself performs no hidden external calls.
    let mut packages = BTreeSet::new();
    for id in &binder.order {
        packages.extend(referenced_packages(&binder.nodes[id.0]));
    }
    for package in &packages {
        binder.schemas.load(package, host)?;
    }

    let rank: HashMap<NodeId, usize> = binder
        .order
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();
    for id in binder.order.clone() {
        let mut deps = node_dependencies(&binder.nodes[id.0], binder.scopes.root());
        deps.sort_by_key(|dep| rank.get(dep).copied().unwrap_or(usize::MAX));
        binder.nodes[id.0].dependencies = deps;
    }

    for id in binder.order.clone() {
        let node_diagnostics = binder.bind_node(id);
        diagnostics.extend(node_diagnostics);
    }

    Ok((Program::new(binder, files), diagnostics))
}

impl Binder {
    pub(crate) fn new() -> Self {
        let mut scopes = Scopes::new();
        scopes.push();
        Self {
            nodes: Vec::new(),
            scopes,
            schemas: SchemaRegistry::new(),
            stack: Vec::new(),
            order: Vec::new(),
            bound: Vec::new(),
        }
    }

    /// Declare every top-level node in one file, in source order.
    fn declare_file(&mut self, file: &File, diagnostics: &mut Vec<Diagnostic>) {
        for block in file.body.blocks_in_source_order() {
            match block.name.as_str() {
                "config" => {
                    if !block.labels.is_empty() {
                        diagnostics.push(labels_error(
                            block.labels_span(),
                            "config blocks do not support labels",
                        ));
                    }
                    self.declare_variable_block(block, file, "config", "config", diagnostics, |syntax| {
                        NodeKind::Config(ConfigVariable {
                            syntax,
                            ty: Type::Any,
                            default_value: None,
                        })
                    });
                }
                "resource" => {
                    if block.labels.len() != 2 {
                        diagnostics.push(labels_error(
                            block.labels_span(),
                            "resource variables must have exactly two labels",
                        ));
                    }
                    let Some(label) = block.labels.first() else {
                        // Unnameable; the labels diagnostic covers it.
                        continue;
                    };
                    self.declare_node(
                        Node::new(
                            label.value.clone(),
                            file.name.clone(),
                            NodeKind::Resource(Resource {
                                syntax: block.clone(),
                                input_type: Type::Any,
                                output_type: Type::Any,
                                inputs: None,
                            }),
                        ),
                        diagnostics,
                    );
                }
                "outputs" => {
                    if !block.labels.is_empty() {
                        diagnostics.push(labels_error(
                            block.labels_span(),
                            "outputs blocks do not support labels",
                        ));
                    }
                    self.declare_variable_block(block, file, "outputs", "output", diagnostics, |syntax| {
                        NodeKind::Output(OutputVariable {
                            syntax,
                            ty: Type::Any,
                            value: None,
                        })
                    });
                }
                // Unknown block kinds declare nothing.
                _ => {}
            }
        }

        for attr in file.body.attributes_in_source_order() {
            self.declare_node(
                Node::new(
                    attr.name.clone(),
                    file.name.clone(),
                    NodeKind::Local(LocalVariable {
                        syntax: attr.clone(),
                        ty: Type::Any,
                        value: None,
                    }),
                ),
                diagnostics,
            );
        }
    }

    /// Declare the variable sub-blocks of a `config` or `outputs` block.
    /// `block_name` appears in attribute diagnostics, `variable_name` in
    /// label diagnostics ("outputs block" but "output variables").
    fn declare_variable_block(
        &mut self,
        block: &Block,
        file: &File,
        block_name: &str,
        variable_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
        make_kind: impl Fn(Block) -> NodeKind,
    ) {
        for attr in block.body.attributes_in_source_order() {
            diagnostics.push(unsupported_attribute(&attr.name, block_name, attr.span));
        }
        for variable in block.body.blocks_in_source_order() {
            if variable.labels.len() > 1 {
                diagnostics.push(labels_error(
                    variable.labels_span(),
                    format!("{} variables must have no more than one label", variable_name),
                ));
            }
            self.declare_node(
                Node::new(
                    variable.name.clone(),
                    file.name.clone(),
                    make_kind(variable.clone()),
                ),
                diagnostics,
            );
        }
    }

    /// Add a node to the arena and the root scope. A name collision keeps
    /// the first declaration and drops this one.
    fn declare_node(&mut self, node: Node, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(existing) = self.scopes.root().get(&node.name) {
            diagnostics.push(already_declared(&node.name, self.nodes[existing.0].span()));
            return;
        }
        let id = NodeId(self.nodes.len());
        let name = node.name.clone();
        self.nodes.push(node);
        self.scopes.root_mut().define(&name, id);
    }

    /// Fix the source order of all declared nodes.
    fn compute_order(&mut self) {
        let mut order: Vec<NodeId> = self.scopes.root().node_ids().collect();
        order.sort_by(|a, b| {
            let na = &self.nodes[a.0];
            let nb = &self.nodes[b.0];
            (na.file.as_str(), na.span().start).cmp(&(nb.file.as_str(), nb.span().start))
        });
        self.order = order;
    }

    /// Bind one node, recursing into its dependencies first.
    pub(crate) fn bind_node(&mut self, id: NodeId) -> Vec<Diagnostic> {
        match self.nodes[id.0].state {
            BindState::Binding => {
                // The node is on the active stack: a reference cycle.
                let node = &self.nodes[id.0];
                let chain = self.cycle_chain(id);
                return vec![
                    circular_reference(&node.name, node.span()).with_detail(chain)
                ];
            }
            BindState::Bound => return Vec::new(),
            BindState::Unbound => {}
        }

        self.nodes[id.0].state = BindState::Binding;
        self.stack.push(id);
        debug!(node = %self.nodes[id.0].name, "binding node");

        let mut diagnostics = Vec::new();
        for dep in self.nodes[id.0].dependencies.clone() {
            diagnostics.extend(self.bind_node(dep));
        }

        let span = self.nodes[id.0].span();
        let kind_diagnostics = match &self.nodes[id.0].kind {
            NodeKind::Config(_) => vec![not_yet_implemented("config variable binding", span)],
            NodeKind::Local(_) => vec![not_yet_implemented("local variable binding", span)],
            NodeKind::Output(_) => vec![not_yet_implemented("output variable binding", span)],
            NodeKind::Resource(_) => self.bind_resource(id),
        };
        diagnostics.extend(kind_diagnostics);

        self.stack.pop();
        self.nodes[id.0].state = BindState::Bound;
        self.bound.push(id);
        diagnostics
    }

    /// Render the active stack from the first occurrence of `id`, closing
    /// the loop, e.g. `a -> b -> a`.
    fn cycle_chain(&self, id: NodeId) -> String {
        let start = self
            .stack
            .iter()
            .position(|frame| *frame == id)
            .unwrap_or(0);
        let mut names: Vec<&str> = self.stack[start..]
            .iter()
            .map(|frame| self.nodes[frame.0].name.as_str())
            .collect();
        names.push(self.nodes[id.0].name.as_str());
        format!("reference cycle: {}", names.join(" -> "))
    }
}
