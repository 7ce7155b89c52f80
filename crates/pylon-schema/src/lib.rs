//! # Pylon Schema
//!
//! Schema handling for the Pylon route layer:
//!
//! - [`Schema`] - An adapter over a compiled JSON Schema document, exposing
//!   parse/validate plus the structural introspection the query parser needs
//!   (object shape, array/boolean fields), independent of the underlying
//!   validation library's internals
//! - [`parse_query`] - Reconciliation of the three query-string array
//!   encodings against a schema's expected shape
//! - [`translate`] - Conversion of schema violations into the uniform
//!   `invalid_input` failure

#![doc(html_root_url = "https://docs.rs/pylon-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
mod arrays;
pub mod translate;

pub use adapter::{FieldShape, Issue, Schema, SchemaViolations};
pub use arrays::{parse_query, RawParams};
