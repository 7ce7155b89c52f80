//! OpenAPI generation from built routes.
//!
//! [`DocsBuilder`] walks registered `(path, route)` pairs and assembles an
//! [`OpenApi`] document from the metadata each route carries: one operation
//! per declared method, request-body and response schemas straight from the
//! route's declarations, query/common parameters derived from the schema
//! documents, and security requirements from the route's auth schemes.

use crate::error::{DocsError, DocsResult};
use crate::openapi::{
    Components, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, ResponseObject, Server,
};
use indexmap::IndexMap;
use pylon_middleware::{Route, RouteAuth, RouteSpec, SetupParams, NO_AUTH};
use serde_json::{json, Value};
use std::sync::Arc;

/// The component name of the uniform error envelope schema.
const ERROR_ENVELOPE: &str = "ErrorEnvelope";

/// Builder assembling an OpenAPI document from routes.
///
/// # Example
///
/// ```ignore
/// let doc = DocsBuilder::new(setup.clone())
///     .route("/widgets", &list_widgets)
///     .route("/widgets/{id}", &get_widget)
///     .build()?;
/// ```
pub struct DocsBuilder {
    setup: Arc<SetupParams>,
    routes: Vec<(String, Arc<RouteSpec>)>,
}

impl DocsBuilder {
    /// Creates a builder for the given setup.
    #[must_use]
    pub fn new(setup: Arc<SetupParams>) -> Self {
        Self {
            setup,
            routes: Vec::new(),
        }
    }

    /// Registers a route under a path.
    #[must_use]
    pub fn route(mut self, path: impl Into<String>, route: &Route) -> Self {
        self.routes.push((path.into(), Arc::clone(route.spec())));
        self
    }

    /// Assembles the OpenAPI document.
    ///
    /// # Errors
    ///
    /// [`DocsError::DuplicateOperation`] when two routes claim the same
    /// path and method.
    pub fn build(self) -> DocsResult<OpenApi> {
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();

        for (path, spec) in &self.routes {
            if spec.exclude_from_docs() {
                continue;
            }

            let item = paths.entry(path.clone()).or_default();
            for method in spec.methods() {
                let method_name = method.as_str().to_ascii_lowercase();
                let Some(slot) = item.slot(&method_name) else {
                    // Verbs without an OpenAPI slot (e.g. OPTIONS) are not
                    // documented.
                    continue;
                };
                if slot.is_some() {
                    return Err(DocsError::DuplicateOperation {
                        method: method_name,
                        path: path.clone(),
                    });
                }
                *slot = Some(build_operation(spec, &method_name, path));
            }
        }

        let mut security_schemes: IndexMap<String, Value> = IndexMap::new();
        for (name, scheme) in self.setup.security_schemes() {
            security_schemes.insert(name.clone(), scheme.clone());
        }

        let mut schemas = IndexMap::new();
        schemas.insert(ERROR_ENVELOPE.to_string(), error_envelope_schema());

        Ok(OpenApi {
            openapi: "3.1.0".to_string(),
            info: Info {
                title: self.setup.api_name().to_string(),
                version: self.setup.version().to_string(),
                description: self.setup.description().map(str::to_owned),
            },
            servers: self
                .setup
                .base_url()
                .map(|url| {
                    vec![Server {
                        url: url.to_string(),
                        description: None,
                    }]
                })
                .unwrap_or_default(),
            paths,
            components: Some(Components {
                schemas,
                security_schemes,
            }),
        })
    }

    /// Assembles the document and serializes it to pretty JSON.
    pub fn build_json(self) -> DocsResult<String> {
        let doc = self.build()?;
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

fn build_operation(spec: &RouteSpec, method: &str, path: &str) -> Operation {
    Operation {
        operation_id: operation_id(spec, method, path),
        summary: spec.summary().map(str::to_owned),
        description: spec.description().map(str::to_owned),
        tags: spec.tags().to_vec(),
        parameters: build_parameters(spec),
        request_body: build_request_body(spec),
        responses: build_responses(spec),
        security: build_security(spec),
    }
}

/// An explicit operation ID is used verbatim for single-method routes;
/// everything else derives one from the method and path.
fn operation_id(spec: &RouteSpec, method: &str, path: &str) -> String {
    if spec.methods().len() == 1 {
        if let Some(id) = spec.operation_id() {
            return id.to_string();
        }
    }

    let slug: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{method}{slug}")
}

/// Query and common-params schema fields become query parameters.
fn build_parameters(spec: &RouteSpec) -> Vec<Parameter> {
    let mut parameters = Vec::new();

    if let Some(schema) = spec.query_params() {
        parameters.extend(schema_parameters(schema.document(), None));
    }
    if let Some(schema) = spec.common_params() {
        parameters.extend(schema_parameters(
            schema.document(),
            Some("Accepted in the query string or the request body"),
        ));
    }

    parameters
}

fn schema_parameters(document: &Value, description: Option<&str>) -> Vec<Parameter> {
    let required: Vec<&str> = document
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    document
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .map(|(name, field)| Parameter {
                    name: name.clone(),
                    location: ParameterIn::Query,
                    description: description.map(str::to_owned),
                    required: required.contains(&name.as_str()),
                    schema: Some(field.clone()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn build_request_body(spec: &RouteSpec) -> Option<RequestBody> {
    let (media_type, schema) = if let Some(schema) = spec.json_body() {
        ("application/json", schema)
    } else if let Some(schema) = spec.form_data() {
        ("application/x-www-form-urlencoded", schema)
    } else {
        return None;
    };

    let mut content = IndexMap::new();
    content.insert(
        media_type.to_string(),
        MediaType {
            schema: Some(schema.document().clone()),
        },
    );

    Some(RequestBody {
        required: true,
        content,
    })
}

fn build_responses(spec: &RouteSpec) -> IndexMap<String, ResponseObject> {
    let mut responses = IndexMap::new();

    let success_content = spec
        .json_response()
        .map(|schema| {
            let mut content = IndexMap::new();
            content.insert(
                "application/json".to_string(),
                MediaType {
                    schema: Some(schema.document().clone()),
                },
            );
            content
        })
        .unwrap_or_default();

    responses.insert(
        "200".to_string(),
        ResponseObject {
            description: "Success".to_string(),
            content: success_content,
        },
    );

    responses.insert("400".to_string(), error_response("Invalid input"));
    if spec.auth() != &RouteAuth::None {
        responses.insert("401".to_string(), error_response("Unauthorized"));
    }
    responses.insert("405".to_string(), error_response("Method not allowed"));
    responses.insert("500".to_string(), error_response("Internal server error"));

    responses
}

fn error_response(description: &str) -> ResponseObject {
    let mut content = IndexMap::new();
    content.insert(
        "application/json".to_string(),
        MediaType {
            schema: Some(json!({ "$ref": format!("#/components/schemas/{ERROR_ENVELOPE}") })),
        },
    );
    ResponseObject {
        description: description.to_string(),
        content,
    }
}

/// Each configured scheme is an alternative security requirement.
fn build_security(spec: &RouteSpec) -> Vec<IndexMap<String, Vec<String>>> {
    match spec.auth() {
        RouteAuth::None => vec![],
        RouteAuth::Schemes(schemes) => schemes
            .iter()
            .filter(|name| name.as_str() != NO_AUTH)
            .map(|name| {
                let mut requirement = IndexMap::new();
                requirement.insert(name.clone(), Vec::new());
                requirement
            })
            .collect(),
    }
}

fn error_envelope_schema() -> Value {
    json!({
        "type": "object",
        "required": ["error"],
        "properties": {
            "error": {
                "type": "object",
                "required": ["type", "message"],
                "properties": {
                    "type": { "type": "string" },
                    "message": { "type": "string" },
                    "validation_errors": {}
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use pylon_core::{ApiResult, Identity, Request, Response, ResponseExt};
    use pylon_middleware::{build_route, Authenticator, BoxFuture, RequestContext};
    use pylon_schema::Schema;

    struct AlwaysAnonymous;

    impl Authenticator for AlwaysAnonymous {
        fn authenticate<'a>(
            &'a self,
            _request: &'a Request,
        ) -> BoxFuture<'a, Result<Identity, pylon_core::ApiError>> {
            Box::pin(async { Ok(Identity::Anonymous) })
        }
    }

    fn ok_handler(
        _ctx: &mut RequestContext,
        _req: Request,
    ) -> BoxFuture<'static, ApiResult<Response>> {
        Box::pin(async { Ok(Response::json(StatusCode::OK, &json!({}))) })
    }

    fn setup() -> Arc<SetupParams> {
        SetupParams::builder("widgets-api")
            .version("2.0.0")
            .base_url("https://api.example.com")
            .auth_scheme("auth_token", AlwaysAnonymous)
            .security_scheme(
                "auth_token",
                json!({ "type": "http", "scheme": "bearer" }),
            )
            .build()
    }

    fn list_route(setup: &Arc<SetupParams>) -> Route {
        let spec = pylon_middleware::RouteSpec::builder()
            .methods([Method::GET])
            .operation_id("listWidgets")
            .query_params(
                Schema::compile(json!({
                    "type": "object",
                    "required": ["ids"],
                    "properties": {
                        "ids": { "type": "array", "items": { "type": "string" } },
                        "limit": { "type": "string" }
                    }
                }))
                .unwrap(),
            )
            .json_response(
                Schema::compile(json!({
                    "type": "object",
                    "properties": { "widgets": { "type": "array" } }
                }))
                .unwrap(),
            )
            .build();
        build_route(setup, spec, ok_handler).unwrap()
    }

    fn create_route(setup: &Arc<SetupParams>) -> Route {
        let spec = pylon_middleware::RouteSpec::builder()
            .methods([Method::POST])
            .auth_scheme("auth_token")
            .json_body(
                Schema::compile(json!({
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                }))
                .unwrap(),
            )
            .build();
        build_route(setup, spec, ok_handler).unwrap()
    }

    #[test]
    fn document_carries_setup_metadata() {
        let setup = setup();
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .build()
            .unwrap();

        assert_eq!(doc.info.title, "widgets-api");
        assert_eq!(doc.info.version, "2.0.0");
        assert_eq!(doc.servers[0].url, "https://api.example.com");

        let components = doc.components.unwrap();
        assert!(components.schemas.contains_key("ErrorEnvelope"));
        assert!(components.security_schemes.contains_key("auth_token"));
    }

    #[test]
    fn operations_land_in_method_slots() {
        let setup = setup();
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .route("/widgets", &create_route(&setup))
            .build()
            .unwrap();

        let item = &doc.paths["/widgets"];
        assert!(item.get.is_some());
        assert!(item.post.is_some());
        assert!(item.delete.is_none());
    }

    #[test]
    fn explicit_operation_id_is_used() {
        let setup = setup();
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .build()
            .unwrap();

        let get = doc.paths["/widgets"].get.as_ref().unwrap();
        assert_eq!(get.operation_id, "listWidgets");
    }

    #[test]
    fn query_schema_fields_become_parameters() {
        let setup = setup();
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .build()
            .unwrap();

        let get = doc.paths["/widgets"].get.as_ref().unwrap();
        let ids = get.parameters.iter().find(|p| p.name == "ids").unwrap();
        let limit = get.parameters.iter().find(|p| p.name == "limit").unwrap();

        assert!(ids.required);
        assert!(!limit.required);
        assert_eq!(ids.location, ParameterIn::Query);
    }

    #[test]
    fn auth_routes_declare_security_and_401() {
        let setup = setup();
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &create_route(&setup))
            .build()
            .unwrap();

        let post = doc.paths["/widgets"].post.as_ref().unwrap();
        assert_eq!(post.security.len(), 1);
        assert!(post.security[0].contains_key("auth_token"));
        assert!(post.responses.contains_key("401"));

        // The unauthenticated GET declares neither.
        let doc = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .build()
            .unwrap();
        let get = doc.paths["/widgets"].get.as_ref().unwrap();
        assert!(get.security.is_empty());
        assert!(!get.responses.contains_key("401"));
    }

    #[test]
    fn excluded_routes_are_skipped() {
        let setup = setup();
        let spec = pylon_middleware::RouteSpec::builder()
            .methods([Method::GET])
            .exclude_from_docs(true)
            .build();
        let route = build_route(&setup, spec, ok_handler).unwrap();

        let doc = DocsBuilder::new(setup.clone())
            .route("/internal", &route)
            .build()
            .unwrap();

        assert!(!doc.paths.contains_key("/internal"));
    }

    #[test]
    fn duplicate_operations_are_rejected() {
        let setup = setup();
        let result = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .route("/widgets", &list_route(&setup))
            .build();

        assert!(matches!(
            result,
            Err(DocsError::DuplicateOperation { .. })
        ));
    }

    #[test]
    fn json_output_serializes() {
        let setup = setup();
        let json = DocsBuilder::new(setup.clone())
            .route("/widgets", &list_route(&setup))
            .build_json()
            .unwrap();

        assert!(json.contains("\"openapi\": \"3.1.0\""));
        assert!(json.contains("listWidgets"));
    }
}
