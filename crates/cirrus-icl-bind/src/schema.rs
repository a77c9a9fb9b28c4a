//! Package schema loading and conversion into the type system.
//!
//! A package schema is a JSON document served by the provider host:
//! resources and functions keyed by `package:module:member` tokens, each
//! with named, typed properties. [`SchemaRegistry`] deserializes documents,
//! memoizes them per package name for the lifetime of one bind, and
//! converts schema type references into [`Type`] values.
//!
//! Loading is the binder's only external call and happens in a dedicated
//! pre-pass; a load failure is fatal to the whole bind, since nothing can
//! be typed against a schema that never arrived.

use crate::error::{malformed_token, BindError, Diagnostic};
use crate::host::SchemaHost;
use crate::types::{TokenType, Type};
use cirrus_icl_ast::Span;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

/// Top-level package schema document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub resources: IndexMap<String, ResourceSpec>,
    #[serde(default)]
    pub functions: IndexMap<String, FunctionSpec>,
    /// Named auxiliary types exported by the package.
    #[serde(default)]
    pub types: IndexMap<String, TypeDefSpec>,
}

/// A resource definition: input and output properties.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_properties: IndexMap<String, TypeSpec>,
    #[serde(default)]
    pub required_inputs: Vec<String>,
    /// Output properties.
    #[serde(default)]
    pub properties: IndexMap<String, TypeSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// A function definition with optional input/output object shapes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub inputs: Option<ObjectTypeSpec>,
    #[serde(default)]
    pub outputs: Option<ObjectTypeSpec>,
}

/// An inline object shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTypeSpec {
    #[serde(default)]
    pub properties: IndexMap<String, TypeSpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// A named type exported by the package, aliasing an underlying shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefSpec {
    #[serde(rename = "type", default)]
    pub primitive: Option<String>,
    #[serde(default)]
    pub properties: Option<IndexMap<String, TypeSpec>>,
    #[serde(default)]
    pub required: Vec<String>,
}

/// A type reference inside a schema document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSpec {
    /// Primitive or container kind: `boolean`, `integer`, `number`,
    /// `string`, `array`, `object`.
    #[serde(rename = "type", default)]
    pub primitive: Option<String>,
    /// Reference to a named type, `#/types/package:module:member`.
    #[serde(rename = "$ref", default)]
    pub reference: Option<String>,
    /// Element type when `type` is `array`.
    #[serde(default)]
    pub items: Option<Box<TypeSpec>>,
    /// Element type for string-keyed maps.
    #[serde(default)]
    pub additional_properties: Option<Box<TypeSpec>>,
    /// Inline object properties.
    #[serde(default)]
    pub properties: Option<IndexMap<String, TypeSpec>>,
    #[serde(default)]
    pub required: Vec<String>,
    /// Union alternatives.
    #[serde(default)]
    pub one_of: Vec<TypeSpec>,
}

/// Split a token into its `package:module:member` components.
pub fn decompose_token(token: &str, span: Span) -> Result<(String, String, String), Diagnostic> {
    let components: Vec<&str> = token.split(':').collect();
    match components.as_slice() {
        [package, module, member] => Ok((
            (*package).to_string(),
            (*module).to_string(),
            (*member).to_string(),
        )),
        _ => Err(malformed_token(token, span)),
    }
}

/// Rewrite a token's package component to the schema's declared name.
///
/// Schema documents occasionally key members under an alias of the package
/// name; canonicalizing keeps every cache keyed consistently. Tokens that
/// do not have three components are kept as written.
fn canonicalize_token(token: &str, package: &str) -> String {
    let components: Vec<&str> = token.split(':').collect();
    match components.as_slice() {
        [_, module, member] => format!("{}:{}:{}", package, module, member),
        _ => token.to_string(),
    }
}

/// One loaded package: the raw document plus canonically keyed lookup
/// tables for its resources and functions.
#[derive(Debug, Clone)]
pub struct PackageSchema {
    pub spec: PackageSpec,
    pub resources: IndexMap<String, ResourceSpec>,
    pub functions: IndexMap<String, FunctionSpec>,
}

/// Per-bind schema state: loaded packages and registered token types.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    packages: IndexMap<String, PackageSchema>,
    token_types: IndexMap<String, TokenType>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a package schema through the host, at most once per name.
    pub fn load(&mut self, package: &str, host: &dyn SchemaHost) -> Result<(), BindError> {
        if self.packages.contains_key(package) {
            debug!(package, "schema cache hit");
            return Ok(());
        }

        debug!(package, "loading package schema");
        let provider =
            host.provider(package, None)
                .map_err(|reason| BindError::SchemaLoad {
                    package: package.to_string(),
                    reason: reason.to_string(),
                })?;
        let bytes = provider
            .get_schema(0)
            .map_err(|reason| BindError::SchemaLoad {
                package: package.to_string(),
                reason: reason.to_string(),
            })?;

        let spec: PackageSpec =
            serde_json::from_slice(&bytes).map_err(|source| BindError::SchemaParse {
                package: package.to_string(),
                source,
            })?;

        // Register the package's named types before anything references
        // them, in declaration order.
        for (raw_token, def) in spec.types.clone() {
            let token = canonicalize_token(&raw_token, &spec.name);
            let underlying = self.type_def_to_type(&def);
            self.token_types.insert(
                token.clone(),
                TokenType {
                    token,
                    underlying: Some(Box::new(underlying)),
                },
            );
        }

        let mut resources = IndexMap::new();
        for (token, resource) in &spec.resources {
            resources.insert(canonicalize_token(token, &spec.name), resource.clone());
        }
        let mut functions = IndexMap::new();
        for (token, function) in &spec.functions {
            functions.insert(canonicalize_token(token, &spec.name), function.clone());
        }

        debug!(
            package,
            resources = resources.len(),
            functions = functions.len(),
            "package schema loaded"
        );
        self.packages.insert(
            package.to_string(),
            PackageSchema {
                spec,
                resources,
                functions,
            },
        );
        Ok(())
    }

    /// A loaded package, if the pre-pass saw it.
    pub fn package(&self, name: &str) -> Option<&PackageSchema> {
        self.packages.get(name)
    }

    /// Convert a schema type reference into a [`Type`].
    ///
    /// With `wrap_input` set, the converted type additionally accepts its
    /// own `Output` wrapper at every level: resource inputs take either a
    /// concrete value or a value deferred by another resource.
    pub fn schema_type_to_type(&mut self, spec: &TypeSpec, wrap_input: bool) -> Type {
        let base = self.base_type(spec, wrap_input);
        if wrap_input && base != Type::Any {
            Type::union(vec![base.clone(), Type::output(base)])
        } else {
            base
        }
    }

    /// Build a resource's input and output object types.
    ///
    /// Inputs are converted on the wrap-input path. Every output property
    /// is individually `Output`-wrapped, and the implicit `id` and `urn`
    /// properties every resource exposes are appended.
    pub fn resource_types(&mut self, resource: &ResourceSpec) -> (Type, Type) {
        let input_type = self.object_type(
            &resource.input_properties,
            &resource.required_inputs,
            true,
        );

        let mut outputs = IndexMap::new();
        for (name, prop) in &resource.properties {
            let mut ty = self.schema_type_to_type(prop, false);
            if !resource.required.iter().any(|r| r == name) {
                ty = Type::optional(ty);
            }
            outputs.insert(name.clone(), Type::output(ty));
        }
        outputs.insert("id".to_string(), Type::output(Type::String));
        outputs.insert("urn".to_string(), Type::output(Type::String));

        (input_type, Type::object(outputs))
    }

    /// Look up a token type by canonical name, registering a fresh opaque
    /// one on first reference.
    fn token_type(&mut self, token: &str) -> TokenType {
        if let Some(existing) = self.token_types.get(token) {
            return existing.clone();
        }
        let created = TokenType {
            token: token.to_string(),
            underlying: None,
        };
        self.token_types.insert(token.to_string(), created.clone());
        created
    }

    fn type_def_to_type(&mut self, def: &TypeDefSpec) -> Type {
        if let Some(properties) = &def.properties {
            return self.object_type(properties, &def.required, false);
        }
        let spec = TypeSpec {
            primitive: def.primitive.clone(),
            ..TypeSpec::default()
        };
        self.base_type(&spec, false)
    }

    fn object_type(
        &mut self,
        properties: &IndexMap<String, TypeSpec>,
        required: &[String],
        wrap_input: bool,
    ) -> Type {
        let mut props = IndexMap::new();
        for (name, prop) in properties {
            let mut ty = self.schema_type_to_type(prop, wrap_input);
            if !required.iter().any(|r| r == name) {
                ty = Type::optional(ty);
            }
            props.insert(name.clone(), ty);
        }
        Type::object(props)
    }

    fn base_type(&mut self, spec: &TypeSpec, wrap_input: bool) -> Type {
        if let Some(reference) = &spec.reference {
            return match reference.strip_prefix("#/types/") {
                Some(token) => Type::Token(self.token_type(token)),
                None => Type::Any,
            };
        }

        if !spec.one_of.is_empty() {
            let alternatives = spec
                .one_of
                .iter()
                .map(|alt| self.schema_type_to_type(alt, wrap_input))
                .collect();
            return Type::union(alternatives);
        }

        match spec.primitive.as_deref() {
            Some("bool") | Some("boolean") => Type::Bool,
            Some("int") | Some("integer") => Type::Int,
            Some("number") => Type::Number,
            Some("string") => Type::String,
            Some("archive") => Type::Archive,
            Some("asset") => Type::Asset,
            Some("array") => {
                let element = match &spec.items {
                    Some(items) => self.schema_type_to_type(items, wrap_input),
                    None => Type::Any,
                };
                Type::array(element)
            }
            Some("object") | None => {
                if let Some(properties) = &spec.properties {
                    self.object_type(properties, &spec.required, wrap_input)
                } else if let Some(element) = &spec.additional_properties {
                    Type::map(self.schema_type_to_type(element, wrap_input))
                } else if spec.primitive.is_some() {
                    Type::map(Type::Any)
                } else {
                    Type::Any
                }
            }
            Some(_) => Type::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0, 10)
    }

    fn primitive(name: &str) -> TypeSpec {
        TypeSpec {
            primitive: Some(name.to_string()),
            ..TypeSpec::default()
        }
    }

    #[test]
    fn test_decompose_token() {
        let (pkg, module, member) =
            decompose_token("objectstore:index:Bucket", span()).unwrap();
        assert_eq!(pkg, "objectstore");
        assert_eq!(module, "index");
        assert_eq!(member, "Bucket");

        assert!(decompose_token("not-a-token", span()).is_err());
        assert!(decompose_token("a:b", span()).is_err());
        assert!(decompose_token("a:b:c:d", span()).is_err());
    }

    #[test]
    fn test_primitive_conversion() {
        let mut registry = SchemaRegistry::new();
        assert_eq!(registry.schema_type_to_type(&primitive("boolean"), false), Type::Bool);
        assert_eq!(registry.schema_type_to_type(&primitive("integer"), false), Type::Int);
        assert_eq!(registry.schema_type_to_type(&primitive("number"), false), Type::Number);
        assert_eq!(registry.schema_type_to_type(&primitive("string"), false), Type::String);
        assert_eq!(registry.schema_type_to_type(&TypeSpec::default(), false), Type::Any);
    }

    #[test]
    fn test_array_and_map_conversion() {
        let mut registry = SchemaRegistry::new();

        let array = TypeSpec {
            primitive: Some("array".to_string()),
            items: Some(Box::new(primitive("string"))),
            ..TypeSpec::default()
        };
        assert_eq!(
            registry.schema_type_to_type(&array, false),
            Type::array(Type::String)
        );

        let map = TypeSpec {
            primitive: Some("object".to_string()),
            additional_properties: Some(Box::new(primitive("number"))),
            ..TypeSpec::default()
        };
        assert_eq!(
            registry.schema_type_to_type(&map, false),
            Type::map(Type::Number)
        );

        let bag = primitive("object");
        assert_eq!(
            registry.schema_type_to_type(&bag, false),
            Type::map(Type::Any)
        );
    }

    #[test]
    fn test_inline_object_marks_non_required_optional() {
        let mut registry = SchemaRegistry::new();
        let mut properties = IndexMap::new();
        properties.insert("name".to_string(), primitive("string"));
        properties.insert("count".to_string(), primitive("integer"));
        let spec = TypeSpec {
            primitive: Some("object".to_string()),
            properties: Some(properties),
            required: vec!["name".to_string()],
            ..TypeSpec::default()
        };

        let ty = registry.schema_type_to_type(&spec, false);
        let Type::Object(props) = ty else {
            panic!("expected an object type");
        };
        assert_eq!(props.get("name"), Some(&Type::String));
        assert_eq!(props.get("count"), Some(&Type::optional(Type::Int)));
    }

    #[test]
    fn test_wrap_input_accepts_deferred_values() {
        let mut registry = SchemaRegistry::new();
        let ty = registry.schema_type_to_type(&primitive("string"), true);
        assert!(ty.assignable_from(&Type::String));
        assert!(ty.assignable_from(&Type::output(Type::String)));

        // `any` is already absorbing; no union is layered on top.
        assert_eq!(registry.schema_type_to_type(&TypeSpec::default(), true), Type::Any);
    }

    #[test]
    fn test_reference_registers_token_type() {
        let mut registry = SchemaRegistry::new();
        let spec = TypeSpec {
            reference: Some("#/types/objectstore:index:CannedAcl".to_string()),
            ..TypeSpec::default()
        };
        let ty = registry.schema_type_to_type(&spec, false);
        let Type::Token(token) = ty else {
            panic!("expected a token type");
        };
        assert_eq!(token.token, "objectstore:index:CannedAcl");
        assert!(token.underlying.is_none());

        // A second reference reuses the registered type.
        let again = registry.schema_type_to_type(&spec, false);
        assert_eq!(again, Type::Token(token));
    }

    #[test]
    fn test_one_of_builds_union() {
        let mut registry = SchemaRegistry::new();
        let spec = TypeSpec {
            one_of: vec![primitive("string"), primitive("number")],
            ..TypeSpec::default()
        };
        assert_eq!(
            registry.schema_type_to_type(&spec, false),
            Type::union(vec![Type::String, Type::Number])
        );
    }

    #[test]
    fn test_resource_types_wrap_outputs_and_add_id_urn() {
        let mut registry = SchemaRegistry::new();
        let mut inputs = IndexMap::new();
        inputs.insert("acl".to_string(), primitive("string"));
        let mut outputs = IndexMap::new();
        outputs.insert("bucket".to_string(), primitive("string"));

        let resource = ResourceSpec {
            input_properties: inputs,
            required_inputs: vec![],
            properties: outputs,
            required: vec!["bucket".to_string()],
            ..ResourceSpec::default()
        };

        let (input_type, output_type) = registry.resource_types(&resource);

        let Type::Object(input_props) = &input_type else {
            panic!("expected an object input type");
        };
        let acl = input_props.get("acl").expect("acl input");
        assert!(acl.is_optional());
        assert!(acl.assignable_from(&Type::String));
        assert!(acl.assignable_from(&Type::output(Type::String)));

        let Type::Object(output_props) = &output_type else {
            panic!("expected an object output type");
        };
        assert_eq!(
            output_props.get("bucket"),
            Some(&Type::output(Type::String))
        );
        assert_eq!(output_props.get("id"), Some(&Type::output(Type::String)));
        assert_eq!(output_props.get("urn"), Some(&Type::output(Type::String)));
    }

    #[test]
    fn test_package_spec_json_shape() {
        let json = r#"{
            "name": "objectstore",
            "version": "1.4.0",
            "resources": {
                "objectstore:index:Bucket": {
                    "inputProperties": {
                        "acl": { "type": "string" },
                        "tags": {
                            "type": "object",
                            "additionalProperties": { "type": "string" }
                        }
                    },
                    "requiredInputs": [],
                    "properties": {
                        "bucket": { "type": "string" }
                    },
                    "required": ["bucket"]
                }
            },
            "functions": {
                "objectstore:index:getBucket": {
                    "inputs": {
                        "properties": { "name": { "type": "string" } },
                        "required": ["name"]
                    },
                    "outputs": {
                        "properties": { "arn": { "type": "string" } }
                    }
                }
            },
            "types": {
                "objectstore:index:CannedAcl": { "type": "string" }
            }
        }"#;

        let spec: PackageSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.name, "objectstore");
        assert_eq!(spec.resources.len(), 1);
        assert_eq!(spec.functions.len(), 1);
        assert_eq!(spec.types.len(), 1);

        let bucket = &spec.resources["objectstore:index:Bucket"];
        assert!(bucket.input_properties.contains_key("acl"));
        assert_eq!(bucket.required, vec!["bucket".to_string()]);
    }
}
