//! Typed shape tree produced by the parser.

use serde::Serialize;

/// Root of a schema document: top-level table name to table node, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub tables: Vec<(String, Table)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub properties: Vec<(String, Column)>,
    pub required: Option<Vec<String>>,
    /// Value of `x-primaryKey`
    pub primary_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Literal(LiteralColumn),
    String(StringColumn),
    Ref(RefColumn),
    Object(Table),
    Array(ArrayItem),
}

/// Element type of an array column. Arrays never nest directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    Literal(LiteralColumn),
    String(StringColumn),
    Ref(RefColumn),
    Object(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Boolean,
    Number,
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Uuid,
    Date,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnAttrs {
    pub default: Option<ScalarValue>,
    pub enum_values: Option<Vec<ScalarValue>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralColumn {
    pub kind: LiteralKind,
    pub attrs: ColumnAttrs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringColumn {
    pub format: Option<StringFormat>,
    pub attrs: ColumnAttrs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefColumn {
    /// Raw pointer, e.g. `#/users/id`
    pub reference: String,
}

/// A JSON scalar usable as a default or enumerated value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Table {
    pub fn property(&self, name: &str) -> Option<&Column> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Primary key: `x-primaryKey` if declared, else `id` when such a property exists.
    pub fn effective_primary_key(&self) -> Option<&str> {
        match &self.primary_key {
            Some(pk) => Some(pk.as_str()),
            None if self.property("id").is_some() => Some("id"),
            None => None,
        }
    }

    /// Copy of this table with `column` stored under `name`. An existing
    /// property of the same name is replaced in place, otherwise it is appended.
    pub fn with_property(&self, name: &str, column: Column) -> Table {
        let mut table = self.clone();
        match table.properties.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => table.properties.push((name.to_string(), column)),
        }
        table
    }

    /// First property holding an object or array.
    pub fn first_nested(&self) -> Option<(&str, &Column)> {
        self.properties
            .iter()
            .find(|(_, c)| matches!(c, Column::Object(_) | Column::Array(_)))
            .map(|(n, c)| (n.as_str(), c))
    }
}

impl Column {
    /// Name of the JSON Schema `type` keyword for this column, `$ref` for references.
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Literal(lit) => lit.kind.as_str(),
            Column::String(_) => "string",
            Column::Ref(_) => "$ref",
            Column::Object(_) => "object",
            Column::Array(_) => "array",
        }
    }
}

impl From<ArrayItem> for Column {
    fn from(item: ArrayItem) -> Self {
        match item {
            ArrayItem::Literal(c) => Column::Literal(c),
            ArrayItem::String(c) => Column::String(c),
            ArrayItem::Ref(c) => Column::Ref(c),
            ArrayItem::Object(t) => Column::Object(t),
        }
    }
}

impl LiteralKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

impl StringFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "uuid" => Some(Self::Uuid),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::DateTime => "datetime",
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_col() -> Column {
        Column::String(StringColumn {
            format: None,
            attrs: ColumnAttrs::default(),
        })
    }

    #[test]
    fn test_effective_primary_key() {
        let mut table = Table {
            properties: vec![("id".to_string(), string_col())],
            required: None,
            primary_key: None,
        };
        assert_eq!(table.effective_primary_key(), Some("id"));

        table.primary_key = Some("email".to_string());
        assert_eq!(table.effective_primary_key(), Some("email"));

        table.primary_key = None;
        table.properties.clear();
        assert_eq!(table.effective_primary_key(), None);
    }

    #[test]
    fn test_with_property_returns_copy() {
        let table = Table {
            properties: vec![("name".to_string(), string_col())],
            required: None,
            primary_key: None,
        };
        let reference = Column::Ref(RefColumn {
            reference: "#/users/id".to_string(),
        });

        let extended = table.with_property("users_id", reference.clone());
        assert_eq!(table.properties.len(), 1);
        assert_eq!(extended.properties.len(), 2);
        assert_eq!(extended.properties[1].0, "users_id");

        let replaced = extended.with_property("name", reference);
        assert_eq!(replaced.properties.len(), 2);
        assert_eq!(replaced.properties[0].1.type_name(), "$ref");
    }
}
