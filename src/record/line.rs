//! # Outbound lines.
//!
//! A [`Line`] is the unit the hub broadcasts. It wraps an `Arc<str>` so that
//! fanning out to N subscribers clones a pointer, not the text.
//!
//! The text template is fixed and field order is part of the contract:
//! ```text
//! Offset=<offset>; message=<payload>
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Immutable broadcast text, cheap to clone.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Line(Arc<str>);

impl Line {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Line {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl From<&str> for Line {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for Line {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl PartialEq<str> for Line {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Line {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Builds the display line for a record at `offset`.
///
/// # Example
/// ```
/// use logcast::format_line;
///
/// assert_eq!(format_line(10, "a").as_str(), "Offset=10; message=a");
/// ```
pub fn format_line(offset: i64, payload: &str) -> Line {
    Line::from(format!("Offset={offset}; message={payload}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_field_order() {
        assert_eq!(format_line(11, "c"), "Offset=11; message=c");
    }

    #[test]
    fn test_payload_is_not_escaped() {
        let line = format_line(-1, "k=v; x=y");
        assert_eq!(line.as_str(), "Offset=-1; message=k=v; x=y");
    }

    #[test]
    fn test_clone_shares_text() {
        let a = format_line(1, "shared");
        let b = a.clone();
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }
}
