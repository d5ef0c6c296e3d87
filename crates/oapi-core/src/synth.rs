//! Document synthesis: schemas with deduplication and operation emission.

use indexmap::IndexMap;
use log::{debug, trace};

use crate::convert::{ConvertContext, Converter, ReflectConverter};
use crate::customize;
use crate::doc::{
    self, Document, Header, HttpMethod, Info, MediaType, RequestBody, Schema, SchemaOrRef,
    SecurityRequirement,
};
use crate::error::{BuildError, Stage, SynthError};
use crate::naming::{ModulePathNames, NameStrategy, is_exported};
use crate::op::{Operation, ParamType, Parameter, Response};
use crate::reflect::TypeDef;

/// Accumulates one document. Each run owns its own schema cache.
pub struct Generator {
    doc: Document,
    converter: Box<dyn Converter>,
    names: Box<dyn NameStrategy>,
}

impl Generator {
    /// A generator using the reflective converter and module-path naming.
    pub fn new(info: Info, obj_pkg_segments: usize) -> Self {
        Self::with_strategies(
            info,
            Box::new(ReflectConverter::new()),
            Box::new(ModulePathNames::new(obj_pkg_segments)),
        )
    }

    pub fn with_strategies(
        info: Info,
        converter: Box<dyn Converter>,
        names: Box<dyn NameStrategy>,
    ) -> Self {
        Self {
            doc: Document::new(info),
            converter,
            names,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Schema for `def`: inline for non-structs, otherwise a `$ref` to a
    /// cached component.
    ///
    /// A name already cached is returned as a reference without converting
    /// again, so two distinct types deriving the same name share the first
    /// one's schema. Types the converter referenced by name while recursing
    /// are added as components too.
    pub fn schema(&mut self, def: &TypeDef) -> Result<SchemaOrRef, SynthError> {
        let def = def.unwrap_optional();
        let schema = if def.is_struct() {
            self.component(&def)?
        } else {
            self.convert(&def)?
        };
        self.add_referenced()?;
        Ok(schema)
    }

    fn convert(&mut self, def: &TypeDef) -> Result<SchemaOrRef, SynthError> {
        let cx = ConvertContext {
            names: self.names.as_ref(),
            hook: customize::apply,
        };
        self.converter.convert(def, &cx)
    }

    fn component(&mut self, def: &TypeDef) -> Result<SchemaOrRef, SynthError> {
        let name = self.names.schema_name(def);
        if self.doc.components.schemas.contains_key(&name) {
            trace!("schema cache hit for {name}");
            return Ok(SchemaOrRef::reference(&name));
        }

        let schema = self.convert(def)?;
        let empty = schema.as_schema().is_some_and(Schema::is_empty);
        if empty || !is_exported(&def.name) {
            return Ok(schema);
        }
        debug!("adding schema {name}");
        self.doc.components.schemas.insert(name.clone(), schema);
        Ok(SchemaOrRef::reference(&name))
    }

    fn add_referenced(&mut self) -> Result<(), SynthError> {
        let mut pending = self.converter.take_references();
        while let Some(def) = pending.pop() {
            let name = self.names.schema_name(&def);
            if self.doc.components.schemas.contains_key(&name) {
                continue;
            }
            let schema = self.convert(&def)?;
            debug!("adding referenced schema {name}");
            self.doc.components.schemas.insert(name, schema);
            pending.extend(self.converter.take_references());
        }
        Ok(())
    }

    /// Emit `op` under `method` and `path`.
    pub fn add_operation(
        &mut self,
        method: HttpMethod,
        path: &str,
        op: &Operation,
    ) -> Result<(), BuildError> {
        let fail = |stage: Stage| {
            move |source: SynthError| BuildError::Operation {
                stage,
                method,
                path: path.to_string(),
                source,
            }
        };

        let parameters = op
            .params()
            .iter()
            .map(|param| self.parameter(param))
            .collect::<Result<Vec<_>, _>>()
            .map_err(fail(Stage::Parameters))?;

        let request_body = self
            .request_body(op)
            .map_err(fail(Stage::RequestBody))?;

        let mut responses = IndexMap::new();
        for response in op.returns() {
            let emitted = self
                .response(response, op.produces())
                .map_err(fail(Stage::Responses))?;
            responses.insert(response.code().to_string(), emitted);
        }

        let security = self.security(op);

        let emitted = doc::Operation {
            operation_id: non_empty(op.id()),
            summary: non_empty(op.summary()),
            tags: op.tags().to_vec(),
            parameters,
            request_body,
            responses,
            security,
        };
        debug!("adding operation {method} {path}");
        self.doc.add_operation(path, method, emitted);
        Ok(())
    }

    fn parameter(&mut self, param: &Parameter) -> Result<doc::Parameter, SynthError> {
        let schema = match param.ty() {
            ParamType::Primitive(ty) => SchemaOrRef::inline(Schema::of_type(ty)),
            ParamType::Sample(sample) => self.schema(&sample.type_def())?,
        };
        Ok(doc::Parameter {
            name: param.name().to_string(),
            location: param.location(),
            description: non_empty(param.description()),
            required: param.is_required(),
            schema: Some(schema),
        })
    }

    fn request_body(&mut self, op: &Operation) -> Result<Option<RequestBody>, SynthError> {
        let Some(reads) = op.reads() else {
            return Ok(None);
        };
        if op.consumes().is_empty() {
            return Ok(None);
        }
        let schema = self.schema(&reads.type_def())?;
        Ok(Some(RequestBody {
            description: None,
            content: media_content(op.consumes(), &schema),
            required: true,
        }))
    }

    fn response(
        &mut self,
        response: &Response,
        produces: &[String],
    ) -> Result<doc::Response, SynthError> {
        let mut content = IndexMap::new();
        if let Some(payload) = response.payload() {
            let media_types = response.media_type_override().unwrap_or(produces);
            if !media_types.is_empty() {
                let schema = self.schema(&payload.type_def())?;
                content = media_content(media_types, &schema);
            }
        }
        let headers = response
            .headers()
            .iter()
            .map(|name| (name.clone(), Header { name: name.clone() }))
            .collect();
        Ok(doc::Response {
            description: response.description().to_string(),
            content,
            headers,
        })
    }

    fn security(&mut self, op: &Operation) -> Option<Vec<SecurityRequirement>> {
        if op.security().is_empty() {
            return None;
        }
        let mut requirements = Vec::with_capacity(op.security().len());
        for (name, security) in op.security() {
            self.doc
                .components
                .security_schemes
                .insert(name.clone(), security.to_scheme());
            requirements.push(SecurityRequirement::from([(name.clone(), Vec::new())]));
        }
        Some(requirements)
    }
}

fn media_content(media_types: &[String], schema: &SchemaOrRef) -> IndexMap<String, MediaType> {
    media_types
        .iter()
        .map(|media_type| {
            (
                media_type.clone(),
                MediaType {
                    schema: Some(schema.clone()),
                },
            )
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::op::{Sample, op};
    use crate::reflect::{FieldDef, Reflect};

    struct Pet;

    impl Reflect for Pet {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![
                FieldDef::new::<i64>("id"),
                FieldDef::new::<String>("name"),
            ])
        }
    }

    struct Folder;

    impl Reflect for Folder {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![
                FieldDef::new::<String>("name"),
                FieldDef::new::<Vec<Folder>>("subfolders"),
            ])
        }
    }

    struct Drive;

    impl Reflect for Drive {
        fn type_def() -> TypeDef {
            TypeDef::structure::<Self>(vec![FieldDef::new::<Folder>("root")])
        }
    }

    struct Timestamp;

    impl Reflect for Timestamp {
        fn type_def() -> TypeDef {
            TypeDef::of::<Self>(crate::reflect::TypeKind::String {
                format: Some("date-time"),
            })
        }
    }

    fn generator() -> Generator {
        Generator::new(
            Info {
                title: "Test".into(),
                version: "1".into(),
            },
            0,
        )
    }

    #[test]
    fn test_struct_schema_is_cached_and_referenced() {
        let mut g = generator();
        let first = g.schema(&Pet::type_def()).unwrap();
        let second = g.schema(&<Option<Pet>>::type_def()).unwrap();
        assert_eq!(first.ref_name(), Some("Pet"));
        assert_eq!(second.ref_name(), Some("Pet"));
        assert_eq!(g.document().components.schemas.len(), 1);
    }

    #[test]
    fn test_lowercase_names_are_inlined() {
        let mut g = generator();
        let def = Pet::type_def().named("app", "pet");
        let schema = g.schema(&def).unwrap();
        assert!(schema.as_schema().is_some());
        assert!(g.document().components.schemas.is_empty());
    }

    #[test]
    fn test_segmented_names_are_still_exported() {
        let mut g = Generator::new(
            Info {
                title: "Test".into(),
                version: "1".into(),
            },
            1,
        );
        let schema = g.schema(&Pet::type_def()).unwrap();
        assert_eq!(schema.ref_name(), Some("tests.Pet"));
        assert!(g.document().components.schemas.contains_key("tests.Pet"));
    }

    #[test]
    fn test_nested_recursive_type_becomes_component() {
        let mut g = generator();
        let schema = g.schema(&Drive::type_def()).unwrap();
        assert_eq!(schema.ref_name(), Some("Drive"));

        let schemas = &g.document().components.schemas;
        assert_eq!(schemas.keys().collect::<Vec<_>>(), ["Drive", "Folder"]);
        assert_eq!(
            serde_json::to_value(&schemas["Folder"]).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "subfolders": {
                        "type": "array",
                        "items": {"$ref": "#/components/schemas/Folder"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_recursive_type_behind_array_becomes_component() {
        let mut g = generator();
        let schema = g.schema(&<Vec<Folder>>::type_def()).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap()["items"]["properties"]["subfolders"]["items"],
            json!({"$ref": "#/components/schemas/Folder"})
        );
        assert!(g.document().components.schemas.contains_key("Folder"));
    }

    #[test]
    fn test_scalar_schema_is_inline() {
        let mut g = generator();
        let schema = g.schema(&Timestamp::type_def()).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"type": "string", "format": "date-time"})
        );
    }

    #[test]
    fn test_request_body_needs_consumes() {
        let mut g = generator();
        let without = op().id("a").reads(Sample::of::<Pet>()).operation();
        g.add_operation(HttpMethod::Post, "/a", &without).unwrap();
        assert!(g.document().operation("/a", HttpMethod::Post).unwrap().request_body.is_none());

        let with = op()
            .id("b")
            .consumes(["application/json"])
            .reads(Sample::of::<Pet>())
            .operation();
        g.add_operation(HttpMethod::Post, "/b", &with).unwrap();
        let body = g
            .document()
            .operation("/b", HttpMethod::Post)
            .unwrap()
            .request_body
            .clone()
            .unwrap();
        assert!(body.required);
        assert_eq!(
            body.content["application/json"].schema.as_ref().and_then(SchemaOrRef::ref_name),
            Some("Pet")
        );
    }

    #[test]
    fn test_response_media_type_override() {
        let mut g = generator();
        let operation = op()
            .id("export")
            .produces(["application/json"])
            .response(
                Response::new(200, "CSV export")
                    .writes(Sample::of::<String>())
                    .media_types(["text/csv"])
                    .header("Content-Disposition"),
            )
            .operation();
        g.add_operation(HttpMethod::Get, "/export", &operation).unwrap();

        let emitted = g.document().operation("/export", HttpMethod::Get).unwrap();
        assert_eq!(
            serde_json::to_value(&emitted.responses["200"]).unwrap(),
            json!({
                "description": "CSV export",
                "content": {"text/csv": {"schema": {"type": "string"}}},
                "headers": {"Content-Disposition": {"name": "Content-Disposition"}}
            })
        );
    }
}
