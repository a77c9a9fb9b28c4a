//! Diagnostics and fatal bind errors.
//!
//! Two tiers of failure:
//!
//! - [`Diagnostic`] - recoverable, accumulated. Undefined names, type
//!   mismatches, malformed tokens, cycles. The bind continues and the
//!   offending expression is typed `Any`.
//! - [`BindError`] - fatal, aborts the bind. Schema transport or parse
//!   failures and internal invariant violations; once a referenced schema
//!   cannot be loaded no further binding can be trusted.
//!
//! Constructor helpers for each diagnostic shape live at the bottom of this
//! module so message wording is defined in exactly one place.

use crate::types::Type;
use cirrus_icl_ast::{SourceMap, Span};
use std::fmt;
use thiserror::Error;

/// Category of a recoverable bind problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A traversal root that resolves to no declared node.
    UndefinedVariable,
    /// A call to a name outside the builtin function set.
    UnknownFunction,
    /// A resource token naming a package the binder has no schema for.
    UnknownPackage,
    /// A resource token naming a resource its package schema lacks.
    UnknownResourceType,
    /// An expression whose type cannot be assigned to its destination.
    TypeMismatch,
    /// Too few or too many arguments to a function call.
    WrongArgumentCount,
    /// A token that does not split into `package:module:member`.
    MalformedToken,
    /// A top-level name declared more than once.
    DuplicateDeclaration,
    /// An index or key of an unsupported kind for its receiver.
    UnsupportedKey,
    /// A declaration that participates in a reference cycle.
    CircularReference,
    /// A block with the wrong labels or unsupported contents.
    MalformedBlock,
    /// A syntax form the binder does not implement yet.
    NotYetImplemented,
}

impl DiagnosticKind {
    /// Human-readable name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::UndefinedVariable => "undefined variable",
            DiagnosticKind::UnknownFunction => "unknown function",
            DiagnosticKind::UnknownPackage => "unknown package",
            DiagnosticKind::UnknownResourceType => "unknown resource type",
            DiagnosticKind::TypeMismatch => "type mismatch",
            DiagnosticKind::WrongArgumentCount => "wrong argument count",
            DiagnosticKind::MalformedToken => "malformed token",
            DiagnosticKind::DuplicateDeclaration => "duplicate declaration",
            DiagnosticKind::UnsupportedKey => "unsupported key",
            DiagnosticKind::CircularReference => "circular reference",
            DiagnosticKind::MalformedBlock => "malformed block",
            DiagnosticKind::NotYetImplemented => "not yet implemented",
        }
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Suspicious but bindable.
    Warning,
    /// The program is wrong; callers normally stop before code generation.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A recoverable bind problem with a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
    /// One-line description.
    pub summary: String,
    /// Longer description; defaults to the summary.
    pub detail: String,
}

impl Diagnostic {
    /// Create an error-severity diagnostic whose detail equals its summary.
    pub fn error(kind: DiagnosticKind, span: Span, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        Self {
            kind,
            severity: Severity::Error,
            span,
            detail: summary.clone(),
            summary,
        }
    }

    /// Replace the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.kind.name(), self.summary)
    }
}

/// Whether any diagnostic in the slice has error severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// A failure that aborts the whole bind.
#[derive(Debug, Error)]
pub enum BindError {
    /// The provider host could not produce a schema for a package.
    #[error("failed to load schema for package '{package}': {reason}")]
    SchemaLoad { package: String, reason: String },

    /// A schema document was fetched but is not valid JSON for the
    /// package-schema shape.
    #[error("invalid schema document for package '{package}': {source}")]
    SchemaParse {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    /// A defect in the binder itself, not in the input program.
    #[error("internal binder error: {0}")]
    Internal(String),
}

/// Renders diagnostics with source snippets.
///
/// The binder operates on parsed syntax and never requires source text;
/// embedders that kept the text in a [`SourceMap`] can use this to print
/// `file:line:col` locations and underlined snippets.
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    /// Format one diagnostic as a multi-line string.
    pub fn format(&self, diagnostic: &Diagnostic) -> String {
        let mut out = format!(
            "{}: {}: {}\n",
            diagnostic.severity,
            diagnostic.kind.name(),
            diagnostic.summary
        );

        let span = &diagnostic.span;
        if let (Some(path), Some((line, col))) =
            (self.sources.file_path(span), self.sources.line_col(span))
        {
            out.push_str(&format!("  --> {}:{}:{}\n", path.display(), line, col));

            if let Some(file) = self.sources.file(span) {
                if let Some(text) = file.line_text(line) {
                    out.push_str(&format!("{:3} | {}\n", line, text));
                    let underline_len = (span.len() as usize).clamp(1, text.len().max(1));
                    let pad = " ".repeat((col as usize).saturating_sub(1));
                    out.push_str(&format!("    | {}{}\n", pad, "^".repeat(underline_len)));
                }
            }
        }

        if diagnostic.detail != diagnostic.summary {
            out.push_str(&format!("    = {}\n", diagnostic.detail));
        }

        out
    }

    /// Format a batch of diagnostics separated by blank lines.
    pub fn format_all(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| self.format(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// --- constructor helpers ---------------------------------------------------

pub(crate) fn undefined_variable(span: Span) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::UndefinedVariable, span, "undefined variable")
}

pub(crate) fn unknown_function(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnknownFunction,
        span,
        format!("unknown function '{}'", name),
    )
}

pub(crate) fn unknown_package(package: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnknownPackage,
        span,
        format!("unknown package '{}'", package),
    )
}

pub(crate) fn unknown_resource_type(token: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnknownResourceType,
        span,
        format!("unknown resource type '{}'", token),
    )
}

pub(crate) fn types_not_assignable(dest: &Type, src: &Type, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::TypeMismatch,
        span,
        format!(
            "cannot assign expression of type {} to location of type {}",
            src, dest
        ),
    )
}

pub(crate) fn object_keys_must_be_strings(key_type: &Type, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::TypeMismatch,
        span,
        format!(
            "object keys must be strings: cannot assign expression of type {} to location of type string",
            key_type
        ),
    )
}

pub(crate) fn missing_required_argument(parameter: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::WrongArgumentCount,
        span,
        format!("missing required parameter '{}'", parameter),
    )
}

pub(crate) fn extra_arguments(expected: usize, actual: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::WrongArgumentCount,
        span,
        format!("too many arguments to call: expected {}, got {}", expected, actual),
    )
}

pub(crate) fn malformed_token(token: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::MalformedToken,
        span,
        format!("malformed token '{}': expected 'package:module:member'", token),
    )
}

pub(crate) fn already_declared(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::DuplicateDeclaration,
        span,
        format!("'{}' already declared", name),
    )
}

pub(crate) fn circular_reference(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::CircularReference,
        span,
        format!("circular reference to '{}'", name),
    )
}

pub(crate) fn unsupported_index_key(span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnsupportedKey,
        span,
        "keys must be strings or numbers",
    )
}

pub(crate) fn unsupported_map_key(span: Span) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::UnsupportedKey, span, "map keys must be strings")
}

pub(crate) fn unsupported_array_index(span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnsupportedKey,
        span,
        "array indexes must be numbers",
    )
}

pub(crate) fn unsupported_object_property(span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnsupportedKey,
        span,
        "object properties must be strings",
    )
}

pub(crate) fn unknown_object_property(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnsupportedKey,
        span,
        format!("unknown property '{}'", name),
    )
}

pub(crate) fn unsupported_receiver_type(receiver: &Type, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnsupportedKey,
        span,
        format!("cannot index value of type {}", receiver),
    )
}

pub(crate) fn labels_error(span: Span, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::MalformedBlock, span, message)
}

pub(crate) fn unsupported_attribute(name: &str, block: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::MalformedBlock,
        span,
        format!("unsupported attribute '{}' in {} block", name, block),
    )
}

pub(crate) fn not_yet_implemented(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::NotYetImplemented,
        span,
        format!("not yet implemented: {}", what),
    )
}
