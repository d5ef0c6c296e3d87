use std::sync::Arc;

use oapi_core::doc::{HttpMethod, SecuritySchemeType};
use oapi_core::{
    BuildError, FieldDef, OperationRegistry, Parameter, Reflect, Response, Router, Sample,
    Security, SpecConfig, TypeDef, build_spec, op,
};
use serde_json::json;

type Handler = Arc<dyn Fn(&str) -> String + Send + Sync>;

fn handler(body: &'static str) -> Handler {
    Arc::new(move |_: &str| body.to_string())
}

struct Pet;

impl Reflect for Pet {
    fn type_def() -> TypeDef {
        TypeDef::structure::<Self>(vec![
            FieldDef::new::<i64>("id"),
            FieldDef::new::<String>("name"),
        ])
    }
}

struct Inventory;

impl Reflect for Inventory {
    fn type_def() -> TypeDef {
        TypeDef::structure::<Self>(vec![FieldDef::new::<std::collections::HashMap<u8, Pet>>(
            "shelves",
        )])
    }
}

mod catalog {
    use super::*;

    pub struct Category;

    impl Reflect for Category {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![
                FieldDef::new::<String>("name"),
                FieldDef::new::<Vec<Category>>("children"),
            ])
        }
    }

    pub struct Shelf;

    impl Reflect for Shelf {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![
                FieldDef::new::<Category>("category"),
                FieldDef::new::<Vec<Pet>>("pets"),
            ])
        }
    }
}

fn collect_refs(value: &serde_json::Value, refs: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", serde_json::Value::String(target)) => refs.push(target.clone()),
                    _ => collect_refs(child, refs),
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

fn strip_api() -> SpecConfig {
    SpecConfig {
        strip_prefixes: vec!["/api".into()],
        ..SpecConfig::default()
    }
}

#[test]
fn integer_sample_emits_integer_query_param() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("listPets")
                .param(Parameter::query("filter", "", Sample::of_val(&123)))
                .build(),
        )
        .get("/pets", handler("list"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();
    let list = doc.operation("/pets", HttpMethod::Get).expect("should have GET /pets");
    assert_eq!(
        serde_json::to_value(&list.parameters[0]).unwrap(),
        json!({"in": "query", "name": "filter", "schema": {"type": "integer"}})
    );
}

#[test]
fn response_without_payload_has_only_description() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("getPet")
                .param(Parameter::path("petId", "The pet's id"))
                .produces(["application/json"])
                .returns(200, "OK", Sample::of::<Pet>())
                .returns(404, "Not found", None)
                .build(),
        )
        .get("/pets/{petId}", handler("get"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();
    let get = doc.operation("/pets/{petId}", HttpMethod::Get).unwrap();

    insta::assert_json_snapshot!(get.responses["404"], @r#"
    {
      "description": "Not found"
    }
    "#);
    assert_eq!(
        serde_json::to_value(&get.responses["200"]).unwrap(),
        json!({
            "description": "OK",
            "content": {
                "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
            }
        })
    );
    assert_eq!(
        serde_json::to_value(&get.parameters[0]).unwrap(),
        json!({
            "name": "petId",
            "in": "path",
            "description": "The pet's id",
            "required": true,
            "schema": {"type": "string"}
        })
    );
}

#[test]
fn shared_bearer_scheme_is_defined_once() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("listPets")
                .requires_auth("myAuth", Security::bearer())
                .build(),
        )
        .get("/pets", handler("list"));
    router
        .with(
            op().id("deletePet")
                .requires_auth("myAuth", Security::bearer())
                .build(),
        )
        .delete("/pets/{petId}", handler("delete"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();

    assert_eq!(doc.components.security_schemes.len(), 1);
    let scheme = &doc.components.security_schemes["myAuth"];
    assert_eq!(scheme.scheme_type, SecuritySchemeType::Http);
    assert_eq!(scheme.scheme.as_deref(), Some("bearer"));

    for (path, method) in [
        ("/pets", HttpMethod::Get),
        ("/pets/{petId}", HttpMethod::Delete),
    ] {
        let emitted = doc.operation(path, method).unwrap();
        assert_eq!(
            serde_json::to_value(&emitted.security).unwrap(),
            json!([{"myAuth": []}])
        );
    }
}

#[test]
fn zero_value_operation_is_absent() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router.with(op().build()).get("/hidden", handler("hidden"));
    router
        .with(op().doc("No id").tag("misc").build())
        .get("/untitled", handler("untitled"));
    router.get("/plain", handler("plain"));
    router
        .with(op().id("health").build())
        .get("/health", handler("ok"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();
    let paths: Vec<&str> = doc.paths.keys().map(String::as_str).collect();
    assert_eq!(paths, ["/health"]);
}

#[test]
fn chain_and_registry_are_merged_in_order() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router.use_middleware(op().tag("root").build());
    router.route("/api", |api| {
        api.use_middleware(op().tag("api").produces(["application/json"]).build());
        api.get(
            "/pets",
            op().id("listPets")
                .tag("pets")
                .returns(200, "OK", Sample::of::<Vec<Pet>>())
                .build_handler(&registry, handler("list")),
        );
    });

    let doc = build_spec(&router, &registry, &strip_api()).unwrap();
    let list = doc.operation("/pets", HttpMethod::Get).expect("prefix should be stripped");
    assert_eq!(list.operation_id.as_deref(), Some("listPets"));
    assert_eq!(list.tags, ["root", "api", "pets"]);
    assert_eq!(
        serde_json::to_value(&list.responses["200"].content["application/json"]).unwrap(),
        json!({
            "schema": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer", "format": "int64"},
                        "name": {"type": "string"}
                    }
                }
            }
        })
    );
}

#[test]
fn duplicate_tags_from_layers_are_kept() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router.use_middleware(op().tag("pets").build());
    router
        .with(op().id("listPets").tag("pets").build())
        .get("/pets", handler("list"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();
    let list = doc.operation("/pets", HttpMethod::Get).unwrap();
    assert_eq!(list.tags, ["pets", "pets"]);
}

#[test]
fn documented_routes_still_serve_requests() {
    let registry = OperationRegistry::new();
    let list = op().id("listPets").build_handler(&registry, handler("list"));
    let mut router = Router::new();
    router.route("/api", |api| {
        api.with(op().tag("pets").build()).get("/pets", list.clone());
    });

    let resolved = router
        .handler(HttpMethod::Get, "/api/pets")
        .expect("route should resolve");
    assert!(Arc::ptr_eq(&resolved, &list));
    assert_eq!(resolved("GET /api/pets"), "list");
}

#[test]
fn conversion_error_names_route_and_stage() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("inventory")
                .produces(["application/json"])
                .response(Response::new(200, "OK").writes(Sample::of::<Inventory>()))
                .build(),
        )
        .get("/inventory", handler("inventory"));

    let err = build_spec(&router, &registry, &SpecConfig::default()).unwrap_err();
    assert!(matches!(err, BuildError::Operation { .. }));
    let message = err.to_string();
    assert!(
        message.starts_with("generating responses for GET \"/inventory\""),
        "unexpected message: {message}"
    );
    assert!(message.contains("u8"));
}

#[test]
fn schemas_are_shared_across_operations() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("createPet")
                .consumes(["application/json"])
                .reads(Sample::of::<Pet>())
                .produces(["application/json"])
                .returns(201, "Created", Sample::of::<Pet>())
                .build(),
        )
        .post("/pets", handler("create"));

    let doc = build_spec(&router, &registry, &SpecConfig::default()).unwrap();
    assert_eq!(doc.components.schemas.len(), 1);
    let create = doc.operation("/pets", HttpMethod::Post).unwrap();
    assert_eq!(
        serde_json::to_value(create.request_body.as_ref().unwrap()).unwrap(),
        json!({
            "content": {
                "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
            },
            "required": true
        })
    );
    assert_eq!(doc.openapi, "3.0.0");
    assert_eq!(doc.info.title, "API");
}

#[test]
fn every_reference_resolves_with_module_segments() {
    let registry = OperationRegistry::new();
    let mut router = Router::new();
    router
        .with(
            op().id("getShelf")
                .produces(["application/json"])
                .returns(200, "OK", Sample::of::<catalog::Shelf>())
                .build(),
        )
        .get("/shelves/{id}", handler("shelf"));
    router
        .with(
            op().id("getPet")
                .produces(["application/json"])
                .returns(200, "OK", Sample::of::<Pet>())
                .build(),
        )
        .get("/pets/{id}", handler("pet"));
    let config = SpecConfig {
        obj_pkg_segments: 1,
        ..SpecConfig::default()
    };

    let doc = build_spec(&router, &registry, &config).unwrap();
    let keys: Vec<&str> = doc.components.schemas.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["catalog.Shelf", "catalog.Category", "build_spec_tests.Pet"]
    );

    let shelf = doc.operation("/shelves/{id}", HttpMethod::Get).unwrap();
    assert_eq!(
        serde_json::to_value(&shelf.responses["200"].content["application/json"]).unwrap(),
        json!({"schema": {"$ref": "#/components/schemas/catalog.Shelf"}})
    );

    let mut refs = Vec::new();
    collect_refs(&serde_json::to_value(&doc).unwrap(), &mut refs);
    assert!(refs.contains(&"#/components/schemas/catalog.Category".to_string()));
    for target in &refs {
        let name = target
            .strip_prefix("#/components/schemas/")
            .unwrap_or_else(|| panic!("unexpected reference {target}"));
        assert!(
            doc.components.schemas.contains_key(name),
            "dangling reference {target}"
        );
    }
}
