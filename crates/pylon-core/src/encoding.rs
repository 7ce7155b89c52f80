//! Query-string array encoding conventions.
//!
//! Three mutually non-exclusive conventions are recognized for representing
//! multiple values under one logical key:
//!
//! - `comma` — a single value split on `,`: `ids=1,2,3`
//! - `brackets` — the key suffixed with `[]`: `ids[]=1&ids[]=2&ids[]=3`
//! - `repeat` — the same bare key repeated: `ids=1&ids=2&ids=3`
//!
//! A request using an encoding outside the route's supported set is rejected
//! before parsing proceeds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One query-string array encoding convention.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ArrayFormat {
    /// Single value split on `,`.
    Comma,
    /// Key suffixed with `[]`; the value may be a literal array or a
    /// comma-joined string.
    Brackets,
    /// The same bare key appearing multiple times, collected into an array
    /// by the host framework.
    Repeat,
}

impl ArrayFormat {
    /// Returns the convention's canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comma => "comma",
            Self::Brackets => "brackets",
            Self::Repeat => "repeat",
        }
    }
}

/// The set of array encodings a route accepts.
///
/// # Example
///
/// ```
/// use pylon_core::{ArrayFormat, ArrayFormats};
///
/// let formats = ArrayFormats::only([ArrayFormat::Comma]);
/// assert!(formats.contains(ArrayFormat::Comma));
/// assert!(!formats.contains(ArrayFormat::Brackets));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayFormats(BTreeSet<ArrayFormat>);

impl ArrayFormats {
    /// All three conventions.
    #[must_use]
    pub fn all() -> Self {
        Self(BTreeSet::from([
            ArrayFormat::Comma,
            ArrayFormat::Brackets,
            ArrayFormat::Repeat,
        ]))
    }

    /// Exactly the given conventions.
    #[must_use]
    pub fn only(formats: impl IntoIterator<Item = ArrayFormat>) -> Self {
        Self(formats.into_iter().collect())
    }

    /// Returns `true` if the convention is accepted.
    #[must_use]
    pub fn contains(&self, format: ArrayFormat) -> bool {
        self.0.contains(&format)
    }

    /// Iterates the accepted conventions in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = ArrayFormat> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ArrayFormats {
    /// All conventions are accepted unless narrowed.
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_everything() {
        let formats = ArrayFormats::default();
        assert!(formats.contains(ArrayFormat::Comma));
        assert!(formats.contains(ArrayFormat::Brackets));
        assert!(formats.contains(ArrayFormat::Repeat));
    }

    #[test]
    fn only_narrows_the_set() {
        let formats = ArrayFormats::only([ArrayFormat::Repeat]);
        assert!(formats.contains(ArrayFormat::Repeat));
        assert!(!formats.contains(ArrayFormat::Comma));
        assert!(!formats.contains(ArrayFormat::Brackets));
    }

    #[test]
    fn canonical_names() {
        assert_eq!(ArrayFormat::Comma.as_str(), "comma");
        assert_eq!(ArrayFormat::Brackets.as_str(), "brackets");
        assert_eq!(ArrayFormat::Repeat.as_str(), "repeat");
    }
}
