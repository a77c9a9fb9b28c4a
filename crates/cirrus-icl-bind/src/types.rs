//! Type system for bound ICL programs.
//!
//! A closed set of immutable type values:
//!
//! - Primitives: `Bool`, `Int`, `Number`, `String`, `Any`, `Archive`, `Asset`
//! - Collections: `Array<T>`, `Map<T>`, structural `Object`
//! - Alternatives: `Union`, `Optional<T>` (a value that may be absent)
//! - Lifted wrappers: `Output<T>` (produced asynchronously by a resource)
//!   and `Promise<T>` (not yet available at bind time)
//! - `Token` - a named type exported by a package schema
//!
//! Types are plain values compared structurally; constructing an `Array` or
//! `Union` never mutates an existing type. [`Type::assignable_from`] is a
//! total predicate: it never fails, it only answers.

use indexmap::IndexMap;
use std::fmt;

/// A type in the ICL type system.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Bool,
    Int,
    Number,
    String,
    /// The absorbing element: assignable from and to every type.
    Any,
    Archive,
    Asset,
    /// Homogeneous list.
    Array(Box<Type>),
    /// Homogeneous string-keyed map.
    Map(Box<Type>),
    /// Structural record; compared property-wise, not by identity.
    Object(IndexMap<String, Type>),
    /// One of several alternatives.
    Union(Vec<Type>),
    /// A value that may be absent.
    Optional(Box<Type>),
    /// A deferred value produced by a resource.
    Output(Box<Type>),
    /// A value unavailable until after bind time.
    Promise(Box<Type>),
    /// A named type exported by a package schema.
    Token(TokenType),
}

/// A schema-exported named type, optionally aliasing an underlying type.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenType {
    /// Canonical `package:module:member` name.
    pub token: String,
    /// The aliased type, when the schema declares one. A destination of
    /// this token type also accepts anything assignable to the alias.
    pub underlying: Option<Box<Type>>,
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn map(element: Type) -> Type {
        Type::Map(Box::new(element))
    }

    pub fn object(properties: IndexMap<String, Type>) -> Type {
        Type::Object(properties)
    }

    /// Build a union, flattening nested unions and collapsing the
    /// single-alternative case.
    pub fn union(alternatives: Vec<Type>) -> Type {
        let mut flat = Vec::with_capacity(alternatives.len());
        for alt in alternatives {
            match alt {
                Type::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        flat.dedup();
        match flat.len() {
            0 => Type::Any,
            1 => flat.into_iter().next().unwrap_or(Type::Any),
            _ => Type::Union(flat),
        }
    }

    /// Wrap in `Optional`, without double-wrapping.
    pub fn optional(inner: Type) -> Type {
        match inner {
            Type::Optional(_) => inner,
            other => Type::Optional(Box::new(other)),
        }
    }

    pub fn output(inner: Type) -> Type {
        Type::Output(Box::new(inner))
    }

    pub fn promise(inner: Type) -> Type {
        Type::Promise(Box::new(inner))
    }

    /// Whether this type admits absence.
    pub fn is_optional(&self) -> bool {
        matches!(self, Type::Optional(_))
    }

    /// The element type under a single `Optional`, `Output`, or `Promise`
    /// wrapper, or the type itself.
    pub fn unwrapped(&self) -> &Type {
        match self {
            Type::Optional(inner) | Type::Output(inner) | Type::Promise(inner) => inner,
            other => other,
        }
    }

    /// Structural compatibility: can a value of type `source` be used where
    /// this type is expected?
    ///
    /// Total over all constructed types. The rules:
    ///
    /// - `Any` is assignable from and to everything.
    /// - A union source must be assignable through every alternative; a
    ///   union destination accepts a source assignable to any alternative.
    /// - `Optional<T>` accepts `T` and `Optional<S>` when `T` accepts `S`;
    ///   only an `Optional` destination, or a union holding one, accepts an
    ///   optional source.
    /// - `Array`, `Map`, `Output`, and `Promise` are covariant in their
    ///   element type; a bare `T` is not assignable to `Output<T>`.
    /// - Objects use width subtyping: every property the destination
    ///   requires must be present and assignable in the source, extra
    ///   source properties are tolerated.
    /// - Token types match by canonical name; a destination token with an
    ///   underlying type also accepts values assignable to that alias.
    /// - Primitives require an exact match.
    pub fn assignable_from(&self, source: &Type) -> bool {
        match (self, source) {
            (Type::Any, _) | (_, Type::Any) => true,

            (_, Type::Union(alternatives)) => {
                alternatives.iter().all(|alt| self.assignable_from(alt))
            }

            (Type::Optional(dest), Type::Optional(src)) => dest.assignable_from(src),
            (Type::Optional(dest), src) => dest.assignable_from(src),

            (Type::Union(alternatives), src) => {
                alternatives.iter().any(|alt| alt.assignable_from(src))
            }

            (_, Type::Optional(_)) => false,

            (Type::Array(dest), Type::Array(src)) => dest.assignable_from(src),
            (Type::Map(dest), Type::Map(src)) => dest.assignable_from(src),
            (Type::Output(dest), Type::Output(src)) => dest.assignable_from(src),
            (Type::Promise(dest), Type::Promise(src)) => dest.assignable_from(src),

            (Type::Object(dest), Type::Object(src)) => {
                dest.iter().all(|(name, want)| match src.get(name) {
                    Some(have) => want.assignable_from(have),
                    None => want.is_optional(),
                })
            }

            (Type::Token(dest), src) => {
                if let Type::Token(src_token) = src {
                    if src_token.token == dest.token {
                        return true;
                    }
                }
                match &dest.underlying {
                    Some(underlying) => underlying.assignable_from(source),
                    None => false,
                }
            }

            (dest, src) => dest == src,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Number => write!(f, "number"),
            Type::String => write!(f, "string"),
            Type::Any => write!(f, "any"),
            Type::Archive => write!(f, "archive"),
            Type::Asset => write!(f, "asset"),
            Type::Array(element) => write!(f, "array<{}>", element),
            Type::Map(element) => write!(f, "map<{}>", element),
            Type::Object(properties) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in properties.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                write!(f, "}})")
            }
            Type::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", alt)?;
                }
                Ok(())
            }
            Type::Optional(inner) => write!(f, "optional<{}>", inner),
            Type::Output(inner) => write!(f, "output<{}>", inner),
            Type::Promise(inner) => write!(f, "promise<{}>", inner),
            Type::Token(token) => write!(f, "{}", token.token),
        }
    }
}
