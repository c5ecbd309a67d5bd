use std::cmp::Ordering;

use crate::core::error::{Error, ErrorKind, Result};

/// A single token in a named field. Bytes rather than a string because
/// numeric fields index prefix-coded binary terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub field: String,
    pub bytes: Vec<u8>,
}

impl Term {
    pub fn new(field: &str, text: &str) -> Self {
        Term {
            field: field.to_string(),
            bytes: text.as_bytes().to_vec(),
        }
    }

    pub fn from_bytes(field: &str, bytes: Vec<u8>) -> Self {
        Term {
            field: field.to_string(),
            bytes,
        }
    }

    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes)
            .map_err(|_| Error::new(ErrorKind::Internal, "invalid UTF-8 in term".to_string()))
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        self.field
            .cmp(&other.field)
            .then_with(|| self.bytes.cmp(&other.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_field_then_bytes() {
        let a = Term::new("author", "zebra");
        let b = Term::new("body", "apple");
        assert!(a < b, "field comparison must dominate");
        assert!(Term::new("body", "apple") < Term::new("body", "banana"));
    }
}
