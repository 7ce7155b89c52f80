//! # Pylon Core
//!
//! Core types for the Pylon declarative route layer.
//!
//! This crate provides the foundational types used throughout Pylon:
//!
//! - [`ApiError`] - The uniform request-processing failure, carrying a wire
//!   `type`, an HTTP status, and optional structured detail
//! - [`ConfigError`] - Route-construction-time misconfiguration
//! - [`Identity`] - Authenticated caller identity
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ArrayFormat`] - Query-string array encoding conventions
//! - [`Request`] / [`Response`] - The HTTP value types the layer operates on

#![doc(html_root_url = "https://docs.rs/pylon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod encoding;
mod error;
mod identity;
mod request_id;
mod types;

pub use encoding::{ArrayFormat, ArrayFormats};
pub use error::{ApiError, ApiResult, ConfigError, ErrorBody, ErrorEnvelope, ErrorKind};
pub use identity::Identity;
pub use request_id::RequestId;
pub use types::{Request, Response, ResponseExt};
