//! # Pylon Docs
//!
//! OpenAPI document generation for Pylon routes.
//!
//! Built routes keep their [`RouteSpec`](pylon_middleware::RouteSpec) and
//! [`SetupParams`](pylon_middleware::SetupParams) attached; this crate
//! walks that metadata and emits an OpenAPI 3.1 document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pylon_docs::DocsBuilder;
//!
//! let doc = DocsBuilder::new(setup.clone())
//!     .route("/widgets", &list_widgets)
//!     .route("/widgets/{id}", &get_widget)
//!     .build_json()?;
//! ```

#![doc(html_root_url = "https://docs.rs/pylon-docs/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod generator;
mod openapi;

pub use error::{DocsError, DocsResult};
pub use generator::DocsBuilder;
pub use openapi::{
    Components, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, ResponseObject, Server,
};
