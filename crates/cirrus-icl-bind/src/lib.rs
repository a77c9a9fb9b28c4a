// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Semantic binder for Cirrus ICL
//!
//! Takes the parsed syntax of an infrastructure program (config variables,
//! typed resources, computed locals, outputs) and produces a fully typed
//! [`Program`]: names resolved, every expression given a type, declarations
//! ordered by dependency, and structural errors collected as diagnostics.
//!
//! # Pipeline
//!
//! ```text
//! Files -> declare top-level nodes -> load referenced package schemas
//!       -> extract per-node dependencies -> bind nodes in dependency order
//!       -> Program + diagnostics
//! ```
//!
//! Recoverable problems (undefined names, type mismatches, malformed
//! tokens, cycles) become [`Diagnostic`] values and never stop the bind;
//! the offending expression is typed [`Type::Any`] so later stages still
//! see a fully shaped tree. Only schema loading failures and internal
//! invariant violations abort the bind with a [`BindError`].

pub mod binder;
pub mod deps;
pub mod error;
pub mod expr;
pub mod expressions;
pub mod functions;
pub mod host;
pub mod node;
pub mod program;
pub mod resources;
pub mod schema;
pub mod scope;
pub mod types;

pub use binder::bind_program;
pub use error::{has_errors, BindError, Diagnostic, DiagnosticFormatter, DiagnosticKind, Severity};
pub use expr::{Expression, ObjectItem};
pub use functions::{FunctionSignature, Parameter};
pub use host::{ProviderHandle, SchemaHost};
pub use node::{ConfigVariable, LocalVariable, Node, NodeId, NodeKind, OutputVariable, Resource};
pub use program::Program;
pub use types::{TokenType, Type};
