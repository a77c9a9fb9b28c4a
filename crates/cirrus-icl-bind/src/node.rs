//! Top-level declaration nodes.
//!
//! One [`Node`] per top-level block or attribute: `config` variables,
//! local variables, resources, and output variables. Nodes live in an
//! arena owned by the binder and are referred to by [`NodeId`]; the
//! "currently binding" stack is a list of ids, never an aliased borrow.
//!
//! # Lifecycle
//!
//! Created during the declare phase, dependency list filled in by the
//! dependency resolver, type and bind state written exactly once during the
//! bind phase, immutable afterwards.

use crate::expr::Expression;
use crate::types::Type;
use cirrus_icl_ast::{Attribute, Block, Span};

/// Stable index of a node in the binder's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Bind progress marker. Transitions `Unbound -> Binding -> Bound`, never
/// backwards; observing `Binding` on entry means the node is on the active
/// bind stack, i.e. a reference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindState {
    Unbound,
    Binding,
    Bound,
}

/// A declared top-level node.
#[derive(Debug, Clone)]
pub struct Node {
    /// Declared name, unique within the root scope.
    pub name: String,
    /// Name of the file this node was declared in.
    pub file: String,
    pub kind: NodeKind,
    pub(crate) state: BindState,
    pub(crate) dependencies: Vec<NodeId>,
}

/// The declaration variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Config(ConfigVariable),
    Local(LocalVariable),
    Resource(Resource),
    Output(OutputVariable),
}

/// A variable declared inside a `config` block.
#[derive(Debug, Clone)]
pub struct ConfigVariable {
    pub syntax: Block,
    pub ty: Type,
    pub default_value: Option<Expression>,
}

/// A top-level attribute, `name = expression`.
#[derive(Debug, Clone)]
pub struct LocalVariable {
    pub syntax: Attribute,
    pub ty: Type,
    pub value: Option<Expression>,
}

/// A `resource "name" "package:module:member"` block.
#[derive(Debug, Clone)]
pub struct Resource {
    pub syntax: Block,
    /// The object type a resource body must be assignable to.
    pub input_type: Type,
    /// The object type the resource exposes to the rest of the program;
    /// every property is `Output`-wrapped.
    pub output_type: Type,
    /// The bound body, an object constructor over the block's attributes.
    pub inputs: Option<Expression>,
}

/// A variable declared inside an `outputs` block.
#[derive(Debug, Clone)]
pub struct OutputVariable {
    pub syntax: Block,
    pub ty: Type,
    pub value: Option<Expression>,
}

impl Node {
    pub(crate) fn new(name: String, file: String, kind: NodeKind) -> Self {
        Self {
            name,
            file,
            kind,
            state: BindState::Unbound,
            dependencies: Vec::new(),
        }
    }

    /// The source range of the declaring syntax.
    pub fn span(&self) -> Span {
        match &self.kind {
            NodeKind::Config(config) => config.syntax.span,
            NodeKind::Local(local) => local.syntax.span,
            NodeKind::Resource(resource) => resource.syntax.span,
            NodeKind::Output(output) => output.syntax.span,
        }
    }

    /// The node's resolved type. `Any` until the node is bound.
    pub fn ty(&self) -> &Type {
        match &self.kind {
            NodeKind::Config(config) => &config.ty,
            NodeKind::Local(local) => &local.ty,
            NodeKind::Resource(resource) => &resource.output_type,
            NodeKind::Output(output) => &output.ty,
        }
    }

    /// Ids of the nodes this node references, in source order.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    /// Whether the bind phase has completed for this node.
    pub fn is_bound(&self) -> bool {
        self.state == BindState::Bound
    }
}

impl Resource {
    /// The resource's declared name, its first label.
    pub fn name(&self) -> Option<&str> {
        self.syntax.labels.first().map(|l| l.value.as_str())
    }

    /// The resource's type token, its second label.
    pub fn token(&self) -> Option<(&str, Span)> {
        self.syntax
            .labels
            .get(1)
            .map(|l| (l.value.as_str(), l.span))
    }
}
