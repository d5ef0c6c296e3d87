use std::fs;
use std::path::Path;

use oapi_docgen::{DocgenError, DocgenOptions, OUTPUT_FILE_NAME, generate};

const PETS: &str = r#"
use serde::Serialize;

/// A pet in the store.
/// openapi:gen
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    /// Unique identifier.
    /// openapi:readonly
    pub id: u64,
    /// Display name.
    /// openapi:required
    pub display_name: String,
    /// openapi:format=date-time
    pub born_at: String,
}

pub struct Internal {
    /// Not marked for generation.
    pub secret: String,
}
"#;

const OWNERS: &str = r#"
/// openapi:gen
pub struct Owner {
    /// Contact address.
    /// openapi:format=email
    #[serde(rename = "mail")]
    pub email: String,
}
"#;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn generates_impls_for_marked_structs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.rs", PETS);
    write(dir.path(), "mod.rs", OWNERS);

    let out = generate(dir.path(), &DocgenOptions::default())
        .unwrap()
        .expect("should emit code");

    syn::parse_file(&out).expect("generated code should parse");
    assert!(out.contains("impl oapi_core::customize::Docs for super::Owner {"));
    assert!(out.contains("impl oapi_core::customize::Docs for super::pets::Pet {"));
    assert!(out.contains(r#"("displayName", "Display name."),"#));
    assert!(out.contains(r#"("id", oapi_core::customize::Attribute::ReadOnly),"#));
    assert!(out.contains(r#"("displayName", oapi_core::customize::Attribute::Required),"#));
    assert!(out.contains(r#"("bornAt", "date-time"),"#));
    assert!(out.contains(r#"("mail", "email"),"#));
    assert!(!out.contains("Internal"));

    let owner = out.find("super::Owner").unwrap();
    let pet = out.find("super::pets::Pet").unwrap();
    assert!(owner < pet, "structs should be sorted by name");
}

#[test]
fn all_includes_unmarked_structs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets.rs", PETS);

    let options = DocgenOptions {
        all: true,
        ..DocgenOptions::default()
    };
    let out = generate(dir.path(), &options).unwrap().unwrap();
    assert!(out.contains("impl oapi_core::customize::Docs for super::pets::Internal {"));
}

#[test]
fn test_files_and_previous_output_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pets_test.rs", PETS);
    write(dir.path(), "tests.rs", PETS);
    write(dir.path(), OUTPUT_FILE_NAME, "this is not rust");
    write(dir.path(), "notes.txt", PETS);
    write(dir.path(), "lib.rs", "pub mod pets;\n");

    assert_eq!(generate(dir.path(), &DocgenOptions::default()).unwrap(), None);
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate(dir.path(), &DocgenOptions::default()).unwrap_err();
    assert!(matches!(err, DocgenError::NoSources(_)));
}

#[test]
fn malformed_format_aborts() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "lib.rs",
        "/// openapi:gen\npub struct Pet {\n    /// openapi:format\n    pub born: String,\n}\n",
    );
    let err = generate(dir.path(), &DocgenOptions::default()).unwrap_err();
    assert!(err.to_string().contains("openapi:format=<format>"));
}

#[test]
fn unparsable_source_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.rs", "pub struct {");
    let err = generate(dir.path(), &DocgenOptions::default()).unwrap_err();
    assert!(matches!(err, DocgenError::Parse { .. }));
}
