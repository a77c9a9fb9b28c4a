// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Syntax tree for Cirrus ICL
//!
//! This crate defines the parsed form of an ICL source file: top-level
//! blocks (`config`, `resource`, `outputs`), top-level attributes, and the
//! expression forms that may appear inside them. It is the interface
//! between the parser and the semantic binder; it performs no analysis of
//! its own.
//!
//! Every syntax node carries a [`Span`] so diagnostics can point back into
//! the original source via a [`SourceMap`].

pub mod ast;
pub mod span;

pub use ast::*;
pub use span::{SourceFile, SourceMap, Span};
