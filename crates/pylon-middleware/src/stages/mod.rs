//! Built-in middleware stages.
//!
//! Every built route runs these in a fixed order:
//!
//! 1. [`auth`] - resolve the caller identity via the route's auth schemes
//! 2. [`method`] - reject verbs outside the route's allowed set
//! 3. [`request_validation`] - content-type gate, body/query/common-params
//!    parsing
//! 4. [`response_validation`] - schema-check 2xx payloads (installed only
//!    when enabled for the route)

pub mod auth;
pub mod method;
pub mod request_validation;
pub mod response_validation;

pub use auth::AuthStage;
pub use method::MethodCheckStage;
pub use request_validation::RequestValidationStage;
pub use response_validation::ResponseValidationStage;
