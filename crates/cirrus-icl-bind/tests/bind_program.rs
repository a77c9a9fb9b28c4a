//! End-to-end binds over hand-built syntax and an in-memory schema host.

use cirrus_icl_ast::{
    Attribute, Block, BlockLabel, Body, ExprSyntax, File, LiteralValue, Span, Traversal, Traverser,
};
use cirrus_icl_bind::host::{HostError, ProviderHandle, SchemaHost};
use cirrus_icl_bind::{
    bind_program, BindError, Diagnostic, DiagnosticKind, NodeKind, Type,
};
use std::cell::Cell;
use std::collections::HashMap;

const OBJECTSTORE_SCHEMA: &str = r#"{
    "name": "objectstore",
    "version": "2.1.0",
    "resources": {
        "objectstore:index:Bucket": {
            "inputProperties": {
                "acl": { "type": "string" },
                "indexDocument": { "type": "string" },
                "tags": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                }
            },
            "requiredInputs": [],
            "properties": {
                "bucket": { "type": "string" },
                "websiteEndpoint": { "type": "string" }
            },
            "required": ["bucket"]
        }
    },
    "functions": {
        "objectstore:index:getBucket": {
            "inputs": {
                "properties": { "bucket": { "type": "string" } },
                "required": ["bucket"]
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

/// Serves canned schema documents and counts provider requests.
struct StaticHost {
    schemas: HashMap<String, String>,
    requests: Cell<usize>,
}

impl StaticHost {
    fn new() -> Self {
        let mut schemas = HashMap::new();
        schemas.insert("objectstore".to_string(), OBJECTSTORE_SCHEMA.to_string());
        Self {
            schemas,
            requests: Cell::new(0),
        }
    }
}

struct StaticProvider {
    document: String,
}

impl SchemaHost for StaticHost {
    fn provider(
        &self,
        package: &str,
        _version: Option<&str>,
    ) -> Result<Box<dyn ProviderHandle + '_>, HostError> {
        self.requests.set(self.requests.get() + 1);
        match self.schemas.get(package) {
            Some(document) => Ok(Box::new(StaticProvider {
                document: document.clone(),
            })),
            None => Err(format!("no provider available for package '{}'", package).into()),
        }
    }
}

impl ProviderHandle for StaticProvider {
    fn get_schema(&self, _version: u32) -> Result<Vec<u8>, HostError> {
        Ok(self.document.clone().into_bytes())
    }
}

// --- syntax builders -------------------------------------------------------

fn sp(start: u32) -> Span {
    Span::new(0, start, start + 4)
}

fn var(name: &str, start: u32) -> ExprSyntax {
    ExprSyntax::ScopeTraversal {
        traversal: Traversal {
            root: name.to_string(),
            root_span: sp(start),
            parts: vec![],
        },
        span: sp(start),
    }
}

fn traversal(root: &str, attrs: &[&str], start: u32) -> ExprSyntax {
    ExprSyntax::ScopeTraversal {
        traversal: Traversal {
            root: root.to_string(),
            root_span: sp(start),
            parts: attrs
                .iter()
                .map(|name| Traverser::Attr {
                    name: name.to_string(),
                    span: sp(start + 1),
                })
                .collect(),
        },
        span: sp(start),
    }
}

fn attr(name: &str, start: u32, value: ExprSyntax) -> Attribute {
    Attribute {
        name: name.to_string(),
        name_span: sp(start),
        value,
        span: Span::new(0, start, start + 20),
    }
}

fn string(value: &str, start: u32) -> ExprSyntax {
    ExprSyntax::string_literal(value, sp(start))
}

fn number(value: f64, start: u32) -> ExprSyntax {
    ExprSyntax::Literal {
        value: LiteralValue::Number(value),
        span: sp(start),
    }
}

fn call(name: &str, start: u32, args: Vec<ExprSyntax>) -> ExprSyntax {
    ExprSyntax::FunctionCall {
        name: name.to_string(),
        name_span: sp(start),
        args,
        span: Span::new(0, start, start + 12),
    }
}

fn resource(name: &str, token: &str, start: u32, attributes: Vec<Attribute>) -> Block {
    Block {
        name: "resource".to_string(),
        labels: vec![
            BlockLabel {
                value: name.to_string(),
                span: sp(start + 1),
            },
            BlockLabel {
                value: token.to_string(),
                span: sp(start + 2),
            },
        ],
        body: Body {
            blocks: vec![],
            attributes,
        },
        span: Span::new(0, start, start + 100),
    }
}

fn file(name: &str, blocks: Vec<Block>, attributes: Vec<Attribute>) -> File {
    File {
        name: name.to_string(),
        body: Body { blocks, attributes },
    }
}

fn kinds(diagnostics: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diagnostics.iter().map(|d| d.kind).collect()
}

// --- tests -----------------------------------------------------------------

#[test]
fn cycle_binds_with_circular_reference_diagnostic() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![],
        vec![attr("a", 0, var("b", 4)), attr("b", 30, var("a", 34))],
    )];

    let (_, diagnostics) = bind_program(files, &host).unwrap();
    let circular = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::CircularReference)
        .count();
    assert!(circular >= 1, "expected a circular reference, got {:?}", kinds(&diagnostics));
}

#[test]
fn duplicate_declaration_keeps_first_node() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![],
        vec![
            attr("dup", 0, string("first", 6)),
            attr("dup", 30, string("second", 36)),
        ],
    )];

    let (program, diagnostics) = bind_program(files, &host).unwrap();
    let duplicates: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::DuplicateDeclaration)
        .collect();
    assert_eq!(duplicates.len(), 1);

    // The first declaration wins and stays resolvable.
    let node = program.node_by_name("dup").expect("dup resolvable");
    assert_eq!(node.span().start, 0);
    assert_eq!(program.nodes().count(), 1);
}

#[test]
fn resource_output_traversal_round_trips() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource(
            "site",
            "objectstore:index:Bucket",
            0,
            vec![attr("acl", 10, string("private", 16))],
        )],
        vec![],
    )];

    let (program, diagnostics) = bind_program(files, &host).unwrap();
    assert!(
        !cirrus_icl_bind::has_errors(&diagnostics),
        "unexpected diagnostics: {:?}",
        diagnostics
    );

    let (expr, traversal_diagnostics) =
        program.bind_expression(&traversal("site", &["bucket"], 200));
    assert!(traversal_diagnostics.is_empty());
    assert_eq!(expr.ty(), &Type::output(Type::String));

    // The implicit properties are present too.
    let (id_expr, _) = program.bind_expression(&traversal("site", &["id"], 210));
    assert_eq!(id_expr.ty(), &Type::output(Type::String));
}

#[test]
fn resource_types_are_recorded_on_the_node() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource("site", "objectstore:index:Bucket", 0, vec![])],
        vec![],
    )];

    let (program, _) = bind_program(files, &host).unwrap();
    let node = program.node_by_name("site").unwrap();
    let NodeKind::Resource(resource) = &node.kind else {
        panic!("expected a resource node");
    };

    let Type::Object(inputs) = &resource.input_type else {
        panic!("expected an object input type");
    };
    assert!(inputs.get("acl").unwrap().is_optional());

    let Type::Object(outputs) = &resource.output_type else {
        panic!("expected an object output type");
    };
    assert_eq!(outputs.get("bucket"), Some(&Type::output(Type::String)));
    assert!(resource.inputs.is_some());
}

#[test]
fn resource_body_type_mismatch_is_diagnosed_not_fatal() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource(
            "site",
            "objectstore:index:Bucket",
            0,
            vec![attr("acl", 10, number(42.0, 16))],
        )],
        vec![],
    )];

    let (program, diagnostics) = bind_program(files, &host).unwrap();
    assert!(kinds(&diagnostics).contains(&DiagnosticKind::TypeMismatch));

    // The resource still registered with its computed types.
    let node = program.node_by_name("site").unwrap();
    assert_ne!(node.ty(), &Type::Any);
}

#[test]
fn file_asset_with_no_arguments_reports_missing_parameter() {
    let host = StaticHost::new();
    let (program, _) = bind_program(vec![file("main.icl", vec![], vec![])], &host).unwrap();

    let (expr, diagnostics) = program.bind_expression(&call("fileAsset", 0, vec![]));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::WrongArgumentCount]);
    assert!(diagnostics[0].summary.contains("missing required parameter 'path'"));
    assert_eq!(expr.ty(), &Type::Asset);
}

#[test]
fn file_asset_with_extra_arguments_reports_too_many() {
    let host = StaticHost::new();
    let (program, _) = bind_program(vec![file("main.icl", vec![], vec![])], &host).unwrap();

    let (expr, diagnostics) = program.bind_expression(&call(
        "fileAsset",
        0,
        vec![string("a", 2), string("b", 8)],
    ));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::WrongArgumentCount]);
    assert!(diagnostics[0].summary.contains("too many arguments"));
    assert_eq!(expr.ty(), &Type::Asset);
}

#[test]
fn malformed_resource_token_is_a_diagnostic() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource("r", "not-a-token", 0, vec![])],
        vec![],
    )];

    let (program, diagnostics) = bind_program(files, &host).unwrap();
    assert!(kinds(&diagnostics).contains(&DiagnosticKind::MalformedToken));

    // The resource still exists, typed Any.
    assert_eq!(program.node_by_name("r").unwrap().ty(), &Type::Any);
}

#[test]
fn unknown_resource_type_is_a_diagnostic() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource("r", "objectstore:index:Nope", 0, vec![])],
        vec![],
    )];

    let (_, diagnostics) = bind_program(files, &host).unwrap();
    assert!(kinds(&diagnostics).contains(&DiagnosticKind::UnknownResourceType));
}

#[test]
fn unloadable_package_schema_is_fatal() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource("vm", "compute:index:Instance", 0, vec![])],
        vec![],
    )];

    match bind_program(files, &host) {
        Err(BindError::SchemaLoad { package, .. }) => assert_eq!(package, "compute"),
        other => panic!("expected a fatal schema load error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn schema_is_loaded_once_per_package() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![
            resource("a", "objectstore:index:Bucket", 0, vec![]),
            resource("b", "objectstore:index:Bucket", 200, vec![]),
        ],
        vec![],
    )];

    bind_program(files, &host).unwrap();
    assert_eq!(host.requests.get(), 1);
}

#[test]
fn undefined_variable_is_diagnosed() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![],
        vec![attr("x", 0, var("missing", 4))],
    )];

    let (_, diagnostics) = bind_program(files, &host).unwrap();
    // Local binding is still a stub, so the reference is only seen when the
    // expression is bound through a resource body or on demand.
    let (_, expr_diagnostics) = bind_program(
        vec![file("main.icl", vec![], vec![])],
        &host,
    )
    .unwrap()
    .0
    .bind_expression(&var("missing", 0));
    assert_eq!(kinds(&expr_diagnostics), vec![DiagnosticKind::UndefinedVariable]);

    // The stubbed local produces its own not-yet-implemented diagnostic.
    assert!(kinds(&diagnostics).contains(&DiagnosticKind::NotYetImplemented));
}

#[test]
fn unknown_function_still_produces_a_shaped_call() {
    let host = StaticHost::new();
    let (program, _) = bind_program(vec![file("main.icl", vec![], vec![])], &host).unwrap();

    let (expr, diagnostics) = program.bind_expression(&call("fetch", 0, vec![string("u", 6)]));
    assert_eq!(kinds(&diagnostics), vec![DiagnosticKind::UnknownFunction]);
    assert_eq!(expr.ty(), &Type::Any);
}

#[test]
fn config_and_outputs_blocks_declare_stub_nodes() {
    let host = StaticHost::new();
    let config_var = Block {
        name: "instanceType".to_string(),
        labels: vec![],
        body: Body::default(),
        span: Span::new(0, 10, 40),
    };
    let config = Block {
        name: "config".to_string(),
        labels: vec![],
        body: Body {
            blocks: vec![config_var],
            attributes: vec![],
        },
        span: Span::new(0, 0, 50),
    };

    let (program, diagnostics) = bind_program(vec![file("main.icl", vec![config], vec![])], &host).unwrap();
    assert!(program.node_by_name("instanceType").is_some());
    assert!(kinds(&diagnostics).contains(&DiagnosticKind::NotYetImplemented));
}

#[test]
fn dependencies_follow_references() {
    let host = StaticHost::new();
    let files = vec![file(
        "main.icl",
        vec![resource(
            "site",
            "objectstore:index:Bucket",
            100,
            vec![attr("acl", 110, var("acl_default", 116))],
        )],
        vec![attr("acl_default", 0, string("private", 14))],
    )];

    let (program, _) = bind_program(files, &host).unwrap();
    let site = program.node_by_name("site").unwrap();
    assert_eq!(site.dependencies().len(), 1);
    let dep = program.node(site.dependencies()[0]).unwrap();
    assert_eq!(dep.name, "acl_default");
}

#[test]
fn files_bind_in_name_order() {
    let host = StaticHost::new();
    let files = vec![
        file("zz.icl", vec![], vec![attr("later", 0, string("x", 8))]),
        file("aa.icl", vec![], vec![attr("earlier", 0, string("y", 10))]),
    ];

    let (program, _) = bind_program(files, &host).unwrap();
    let names: Vec<&str> = program.nodes().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["earlier", "later"]);
}

#[test]
fn nodes_are_exposed_in_dependency_order() {
    let host = StaticHost::new();
    // The resource is declared first but references the local declared
    // after it; the program lists the dependency first.
    let files = vec![file(
        "main.icl",
        vec![resource(
            "site",
            "objectstore:index:Bucket",
            0,
            vec![attr("acl", 10, var("acl_default", 16))],
        )],
        vec![attr("acl_default", 300, string("private", 314))],
    )];

    let (program, _) = bind_program(files, &host).unwrap();
    let names: Vec<&str> = program.nodes().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["acl_default", "site"]);
}

#[test]
fn binding_is_deterministic() {
    let build = || {
        vec![file(
            "main.icl",
            vec![
                resource(
                    "site",
                    "objectstore:index:Bucket",
                    100,
                    vec![attr("acl", 110, number(1.0, 116))],
                ),
                resource("r", "not-a-token", 300, vec![]),
            ],
            vec![
                attr("a", 0, var("b", 4)),
                attr("b", 30, var("a", 34)),
                attr("a", 60, string("dup", 66)),
            ],
        )]
    };

    let host = StaticHost::new();
    let (program_one, diagnostics_one) = bind_program(build(), &host).unwrap();
    let (program_two, diagnostics_two) = bind_program(build(), &host).unwrap();

    let render = |diagnostics: &[Diagnostic]| {
        diagnostics
            .iter()
            .map(|d| format!("{}@{}..{}", d, d.span.start, d.span.end))
            .collect::<Vec<_>>()
    };
    assert_eq!(render(&diagnostics_one), render(&diagnostics_two));

    let names = |program: &cirrus_icl_bind::Program| {
        program.nodes().map(|n| n.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&program_one), names(&program_two));
}
