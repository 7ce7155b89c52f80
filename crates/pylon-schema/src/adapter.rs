//! Adapter over the schema validation library.
//!
//! [`Schema`] isolates the rest of Pylon from the validation library's
//! internal representation: it exposes parse/validate and the structural
//! questions the query parser asks (object shape, array/boolean fields),
//! unwrapping combinator layers (nullable unions, single-branch `allOf`,
//! `default` annotations) before answering. Unrecognized structure degrades
//! to "not an object" / "not an array" so downstream parsing falls back to
//! pass-through instead of failing.

use jsonschema::{Draft, JSONSchema, ValidationError as JsValidationError};
use pylon_core::ConfigError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Upper bound on wrapper-unwrapping passes. Wrapper nests deeper than this
/// are treated as opaque.
const MAX_UNWRAP_DEPTH: usize = 8;

/// A compiled schema plus its source document.
///
/// Cheap to clone; the compiled validator and the document are shared.
///
/// # Example
///
/// ```
/// use pylon_schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::compile(json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" },
///         "tags": { "type": "array", "items": { "type": "string" } }
///     }
/// })).unwrap();
///
/// assert!(schema.parse(&json!({ "name": "a", "tags": ["x"] })).is_ok());
/// assert!(schema.parse(&json!({ "tags": [] })).is_err());
/// ```
#[derive(Clone)]
pub struct Schema {
    document: Arc<Value>,
    compiled: Arc<JSONSchema>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("document", &self.document).finish()
    }
}

impl Schema {
    /// Compiles a JSON Schema document (draft 7).
    pub fn compile(document: Value) -> Result<Self, ConfigError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|e| ConfigError::InvalidSchema {
                reason: e.to_string(),
            })?;

        tracing::debug!("schema compiled");
        Ok(Self {
            document: Arc::new(document),
            compiled: Arc::new(compiled),
        })
    }

    /// Returns the source schema document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Validates a value, returning it on success.
    ///
    /// All violations are collected; none is silently dropped.
    pub fn parse(&self, value: &Value) -> Result<Value, SchemaViolations> {
        match self.compiled.validate(value) {
            Ok(()) => Ok(value.clone()),
            Err(errors) => Err(SchemaViolations {
                issues: errors.map(Issue::from_validation_error).collect(),
            }),
        }
    }

    /// Returns the field map of an object-shaped schema, unwrapping
    /// combinator layers first.
    ///
    /// `None` when the schema is not (or cannot be recognized as) an object
    /// shape; callers then degrade to pass-through parsing.
    #[must_use]
    pub fn shape(&self) -> Option<BTreeMap<String, FieldShape>> {
        let unwrapped = unwrap_combinators(&self.document);
        let properties = unwrapped.get("properties")?.as_object()?;

        Some(
            properties
                .iter()
                .map(|(name, field)| (name.clone(), FieldShape::new(field.clone())))
                .collect(),
        )
    }
}

/// The structural kind of one schema field, after unwrapping.
#[derive(Debug, Clone)]
pub struct FieldShape {
    schema: Value,
}

impl FieldShape {
    fn new(schema: Value) -> Self {
        Self { schema }
    }

    /// Returns `true` if the field is array-typed.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.has_type("array")
    }

    /// Returns `true` if the field is boolean-typed.
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.has_type("boolean")
    }

    fn has_type(&self, expected: &str) -> bool {
        let unwrapped = unwrap_combinators(&self.schema);
        match unwrapped.get("type") {
            Some(Value::String(t)) => t == expected,
            // A "type" list counts if the expected type is one of its members.
            Some(Value::Array(types)) => {
                types.iter().any(|t| t.as_str() == Some(expected))
            }
            _ => false,
        }
    }
}

/// Strips wrapper combinators until a concrete structural type remains.
///
/// Handles, repeatedly and in any nesting order:
/// - nullable unions: `anyOf`/`oneOf` with exactly one non-null branch
/// - refinements: single-branch `allOf`
/// - `default`-annotated wrappers (covered by the `allOf` rule)
///
/// Bails out after [`MAX_UNWRAP_DEPTH`] passes.
fn unwrap_combinators(schema: &Value) -> &Value {
    let mut current = schema;

    for _ in 0..MAX_UNWRAP_DEPTH {
        let Some(obj) = current.as_object() else {
            break;
        };

        let next = ["anyOf", "oneOf"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .and_then(|branches| sole_non_null_branch(branches))
            .or_else(|| {
                let branches = obj.get("allOf")?.as_array()?;
                (branches.len() == 1).then(|| &branches[0])
            });

        match next {
            Some(inner) => current = inner,
            None => break,
        }
    }

    current
}

/// The single non-null branch of a nullable union, if that is what this is.
fn sole_non_null_branch(branches: &[Value]) -> Option<&Value> {
    let non_null: Vec<&Value> = branches
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) != Some("null"))
        .collect();

    // Only a union that exists to express nullability is a wrapper.
    (non_null.len() == 1 && non_null.len() < branches.len()).then(|| non_null[0])
}

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Dot-separated path of the offending field; empty at the root.
    pub path: String,
    /// The validation library's message for the violation.
    pub message: String,
    /// `true` when the cause is a missing required field.
    pub missing_required: bool,
}

impl Issue {
    fn from_validation_error(error: JsValidationError<'_>) -> Self {
        // "/user/age" pointer form, converted to dot-separated segments.
        let pointer = error.instance_path.to_string();
        let mut segments: Vec<String> = pointer
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect();

        let missing_required = matches!(
            &error.kind,
            jsonschema::error::ValidationErrorKind::Required { .. }
        );

        // A required-property violation points at the parent object; extend
        // the path with the missing property's name.
        if let jsonschema::error::ValidationErrorKind::Required { property } = &error.kind {
            if let Some(name) = property.as_str() {
                segments.push(name.to_string());
            }
        }

        Self {
            path: segments.join("."),
            message: error.to_string(),
            missing_required,
        }
    }
}

/// All violations from one parse, in schema-evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("schema validation failed with {} issue(s)", issues.len())]
pub struct SchemaViolations {
    /// The individual violations.
    pub issues: Vec<Issue>,
}
