//! Flat relational descriptors produced by the visitor and the resolver.

use std::fmt;

use serde::Serialize;

use crate::shape::ScalarValue;

/// Scalar type of a generated column, after `format` has overridden the base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Uuid,
    String,
    Date,
    DateTime,
    Boolean,
    Number,
    Integer,
}

/// Column types a foreign key may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Uuid,
    String,
    Boolean,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ScalarValue>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<ScalarValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedReference {
    pub name: String,
    /// Raw pointer, e.g. `#/users/id`
    pub reference: String,
    /// Location of the referencing node in the source document, for diagnostics
    pub schema_path: Vec<String>,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitedTable {
    /// Ancestor path and own name joined with `_`
    pub name: String,
    /// Location of the table node in the source document
    pub schema_path: Vec<String>,
    pub required: Option<Vec<String>>,
    pub primary_key: Option<String>,
    pub columns: Vec<VisitedColumn>,
    pub unresolved_references: Vec<UnresolvedReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignTarget {
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReference {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: KeyType,
    pub target: ForeignTarget,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTable {
    pub name: String,
    pub required: Option<Vec<String>>,
    pub primary_key: Option<String>,
    pub columns: Vec<VisitedColumn>,
    pub references: Vec<ResolvedReference>,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::String => "string",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<ColumnType> for KeyType {
    type Error = ColumnType;

    fn try_from(typ: ColumnType) -> Result<Self, Self::Error> {
        match typ {
            ColumnType::Uuid => Ok(Self::Uuid),
            ColumnType::String => Ok(Self::String),
            ColumnType::Boolean => Ok(Self::Boolean),
            ColumnType::Integer => Ok(Self::Integer),
            other => Err(other),
        }
    }
}

impl From<KeyType> for ColumnType {
    fn from(typ: KeyType) -> Self {
        match typ {
            KeyType::Uuid => Self::Uuid,
            KeyType::String => Self::String,
            KeyType::Boolean => Self::Boolean,
            KeyType::Integer => Self::Integer,
        }
    }
}

impl Cardinality {
    pub fn from_array_context(in_array: bool) -> Self {
        if in_array { Self::OneToMany } else { Self::OneToOne }
    }
}

impl VisitedTable {
    pub fn column(&self, name: &str) -> Option<&VisitedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_reference(&self, name: &str) -> bool {
        self.unresolved_references.iter().any(|r| r.name == name)
    }
}

impl ResolvedTable {
    pub fn is_required(&self, column: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|req| req.iter().any(|r| r == column))
    }
}
