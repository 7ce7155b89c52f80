//! Translation of schema violations into the uniform failure.
//!
//! Message grammar:
//!
//! - a missing required field: `<field path> is required`
//! - any other issue: `<message> for "<field path>"`, or the bare message
//!   when the path is empty
//! - one issue: that string is the whole message
//! - N issues: `<N> Input Errors: ` followed by the issue strings joined
//!   with `, `

use crate::adapter::{Issue, SchemaViolations};
use pylon_core::ApiError;
use serde_json::json;

/// Converts schema violations into an `invalid_input` failure carrying
/// structured per-field detail.
#[must_use]
pub fn invalid_input(violations: &SchemaViolations) -> ApiError {
    let mut messages: Vec<String> = violations.issues.iter().map(issue_message).collect();

    let message = if messages.len() == 1 {
        messages.swap_remove(0)
    } else {
        format!("{} Input Errors: {}", messages.len(), messages.join(", "))
    };

    let detail: Vec<_> = violations
        .issues
        .iter()
        .map(|issue| {
            json!({
                "path": issue.path,
                "message": issue.message,
            })
        })
        .collect();

    ApiError::invalid_input(message).with_validation_errors(json!(detail))
}

/// The generic failure for input that could not be parsed at all
/// (malformed JSON, undecodable form data). Not routed through the
/// per-field formatter.
#[must_use]
pub fn unparseable_input() -> ApiError {
    ApiError::invalid_input("Error while parsing input")
}

fn issue_message(issue: &Issue) -> String {
    if issue.missing_required {
        return format!("{} is required", issue.path);
    }
    if issue.path.is_empty() {
        return issue.message.clone();
    }
    format!("{} for \"{}\"", issue.message, issue.path)
}
