//! Path-tagged diagnostics shared by every pipeline stage.

use std::fmt;

use serde::Serialize;

/// One segment of a JSON path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Which stage rejected the document, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Document does not match the base grammar
    Syntax,
    /// Document is well-formed but violates a shape invariant
    Shape,
    UnknownTable,
    UnknownColumn,
    InvalidTargetType,
    DuplicateTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: Vec<PathSegment>,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(path: Vec<PathSegment>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
        }
    }

    pub fn shape(path: &[PathSegment], message: impl Into<String>) -> Self {
        Self::new(path.to_vec(), DiagnosticKind::Shape, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self.path.iter().map(|s| s.to_string()).collect();
        write!(f, "{}: {}", path.join("/"), self.message)
    }
}

/// Extend a borrowed path by one segment.
pub(crate) fn join(path: &[PathSegment], segment: impl Into<PathSegment>) -> Vec<PathSegment> {
    let mut joined = path.to_vec();
    joined.push(segment.into());
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_path() {
        let path = vec![
            PathSegment::from("properties"),
            PathSegment::from("users"),
            PathSegment::from("enum"),
            PathSegment::Index(1),
        ];
        let diag = Diagnostic::shape(&path, "bad value");
        assert_eq!(diag.to_string(), "properties/users/enum/1: bad value");
    }

    #[test]
    fn test_serialize_untagged_segments() {
        let diag = Diagnostic::new(vec!["#".into(), 0usize.into()], DiagnosticKind::Syntax, "x");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["path"], serde_json::json!(["#", 0]));
        assert_eq!(json["kind"], "syntax");
    }
}
