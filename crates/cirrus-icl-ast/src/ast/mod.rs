//! Parsed structure of an ICL source file.
//!
//! A [`File`] is a [`Body`]; a body is a list of blocks and attributes.
//! Top-level blocks declare configuration (`config`), resources
//! (`resource "name" "pkg:module:member"`), and outputs (`outputs`);
//! top-level attributes declare local variables.
//!
//! The parser that produces these values is a separate crate; nothing here
//! checks names, types, or references. That is the binder's job.

pub mod expr;
pub mod walk;

pub use expr::{
    BinaryOpKind, ExprSyntax, LiteralValue, ObjectItemSyntax, Traversal, Traverser, UnaryOpKind,
};
pub use walk::{walk_body, walk_expr};

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    /// File name, used for stable ordering across a program's files.
    pub name: String,
    /// Top-level contents.
    pub body: Body,
}

/// The contents of a file or block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub blocks: Vec<Block>,
    pub attributes: Vec<Attribute>,
}

/// A labeled block, e.g. `resource "site" "objectstore:index:Bucket" { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block kind: `config`, `resource`, `outputs`, or a nested name.
    pub name: String,
    pub labels: Vec<BlockLabel>,
    pub body: Body,
    pub span: Span,
}

/// A quoted or bare label on a block header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLabel {
    pub value: String,
    pub span: Span,
}

/// A `name = expression` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub name_span: Span,
    pub value: ExprSyntax,
    pub span: Span,
}

impl Body {
    /// Blocks ordered by their starting byte.
    ///
    /// Parsers normally emit blocks in source order already; sorting here
    /// keeps declaration order deterministic regardless of producer.
    pub fn blocks_in_source_order(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.span.start);
        blocks
    }

    /// Attributes ordered by their starting byte.
    pub fn attributes_in_source_order(&self) -> Vec<&Attribute> {
        let mut attrs: Vec<&Attribute> = self.attributes.iter().collect();
        attrs.sort_by_key(|a| a.span.start);
        attrs
    }
}

impl Block {
    /// The span covering every label on this block, or the block span when
    /// it has no labels. Diagnostics about label arity point here.
    pub fn labels_span(&self) -> Span {
        match (self.labels.first(), self.labels.last()) {
            (Some(first), Some(last)) => first.span.merge(&last.span),
            _ => self.span,
        }
    }
}
