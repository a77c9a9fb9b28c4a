//! Builtin function signatures.
//!
//! The binder knows a closed set of intrinsic functions. Arguments are
//! checked positionally against a signature; a trailing varargs parameter,
//! when present, absorbs and type-checks any excess arguments.

use crate::types::Type;

/// A named, typed positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

/// The shape of a callable function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub parameters: Vec<Parameter>,
    pub varargs_parameter: Option<Parameter>,
    pub return_type: Type,
}

impl FunctionSignature {
    /// Signature for a call the binder could not resolve: no parameters,
    /// `Any` result, so the rest of the program still binds.
    pub fn unresolved() -> Self {
        Self {
            parameters: Vec::new(),
            varargs_parameter: None,
            return_type: Type::Any,
        }
    }
}

fn parameter(name: &str, ty: Type) -> Parameter {
    Parameter {
        name: name.to_string(),
        ty,
    }
}

/// Look up a builtin function by name.
pub fn builtin_signature(name: &str) -> Option<FunctionSignature> {
    match name {
        "fileAsset" => Some(FunctionSignature {
            parameters: vec![parameter("path", Type::String)],
            varargs_parameter: None,
            return_type: Type::Asset,
        }),
        "mimeType" => Some(FunctionSignature {
            parameters: vec![parameter("path", Type::String)],
            varargs_parameter: None,
            return_type: Type::String,
        }),
        "toJSON" => Some(FunctionSignature {
            parameters: vec![parameter("value", Type::Any)],
            varargs_parameter: None,
            return_type: Type::String,
        }),
        _ => None,
    }
}
