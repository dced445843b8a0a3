//! Coerces an untyped JSON document into the shape tree.

use log::debug;
use serde_json::{Map, Value};

use crate::diagnostic::{join, Diagnostic, PathSegment};
use crate::shape::{
    ArrayItem, Column, ColumnAttrs, Database, LiteralColumn, LiteralKind, RefColumn, ScalarValue,
    StringColumn, StringFormat, Table,
};

/// Parse a document that already passed [`crate::validator::check_syntax`].
///
/// Every malformed node is reported; the tree is only returned when the
/// whole document is well-typed.
pub fn parse_document(document: &Value) -> Result<Database, Vec<Diagnostic>> {
    let mut parser = ShapeParser { errors: Vec::new() };
    let database = parser.parse_root(document);
    match database {
        Some(database) if parser.errors.is_empty() => Ok(database),
        _ => {
            debug!("shape parsing produced {} error(s)", parser.errors.len());
            Err(parser.errors)
        }
    }
}

/// What kind of JSON scalar a column's default and enum members must be.
#[derive(Clone, Copy)]
enum ValueKind {
    Boolean,
    Number,
    Integer,
    String,
}

impl ValueKind {
    fn accepts(self, value: &ScalarValue) -> bool {
        match (self, value) {
            (Self::Boolean, ScalarValue::Bool(_)) => true,
            (Self::Number, ScalarValue::Number(_)) => true,
            (Self::Integer, ScalarValue::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (Self::String, ScalarValue::String(_)) => true,
            _ => false,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Boolean => "a boolean",
            Self::Number => "a number",
            Self::Integer => "an integer",
            Self::String => "a string",
        }
    }
}

impl From<LiteralKind> for ValueKind {
    fn from(kind: LiteralKind) -> Self {
        match kind {
            LiteralKind::Boolean => Self::Boolean,
            LiteralKind::Number => Self::Number,
            LiteralKind::Integer => Self::Integer,
        }
    }
}

struct ShapeParser {
    errors: Vec<Diagnostic>,
}

impl ShapeParser {
    fn error(&mut self, path: &[PathSegment], message: impl Into<String>) {
        self.errors.push(Diagnostic::shape(path, message));
    }

    fn parse_root(&mut self, document: &Value) -> Option<Database> {
        let root: Vec<PathSegment> = Vec::new();
        let keywords = self.expect_object(document, &root)?;
        if keywords.get("type").and_then(Value::as_str) != Some("object") {
            self.error(&join(&root, "type"), r#"Expected "object""#);
        }
        let properties_path = join(&root, "properties");
        let Some(properties) = keywords.get("properties").and_then(Value::as_object) else {
            self.error(&properties_path, "Expected an object of tables");
            return None;
        };

        let mut tables = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let path = join(&properties_path, name.as_str());
            if value.get("type").and_then(Value::as_str) != Some("object") {
                self.error(&join(&path, "type"), r#"Tables must be of type "object""#);
                continue;
            }
            if let Some(table) = self.parse_table(value, &path) {
                tables.push((name.clone(), table));
            }
        }
        Some(Database { tables })
    }

    fn expect_object<'v>(
        &mut self,
        value: &'v Value,
        path: &[PathSegment],
    ) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.error(path, "Expected an object");
        }
        object
    }

    fn parse_table(&mut self, value: &Value, path: &[PathSegment]) -> Option<Table> {
        let keywords = self.expect_object(value, path)?;

        let properties_path = join(path, "properties");
        let Some(raw_properties) = keywords.get("properties").and_then(Value::as_object) else {
            self.error(&properties_path, "Required");
            return None;
        };

        let mut properties = Vec::with_capacity(raw_properties.len());
        let mut complete = true;
        for (name, raw) in raw_properties {
            match self.parse_column(raw, &join(&properties_path, name.as_str())) {
                Some(column) => properties.push((name.clone(), column)),
                None => complete = false,
            }
        }

        let required = match keywords.get("required") {
            None => None,
            Some(value) => self.parse_string_list(value, &join(path, "required")),
        };
        let primary_key = keywords
            .get("x-primaryKey")
            .and_then(Value::as_str)
            .map(str::to_string);

        complete.then_some(Table {
            properties,
            required,
            primary_key,
        })
    }

    fn parse_string_list(&mut self, value: &Value, path: &[PathSegment]) -> Option<Vec<String>> {
        let list: Option<Vec<String>> = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect()
        });
        if list.is_none() {
            self.error(path, "Expected an array of strings");
        }
        list
    }

    fn parse_column(&mut self, value: &Value, path: &[PathSegment]) -> Option<Column> {
        let keywords = self.expect_object(value, path)?;

        match keywords.get("type") {
            Some(Value::String(typ)) => match typ.as_str() {
                "object" => self.parse_table(value, path).map(Column::Object),
                "array" => self.parse_array(keywords, path).map(Column::Array),
                "string" => self.parse_string(keywords, path).map(Column::String),
                other => match LiteralKind::from_str(other) {
                    Some(kind) => self.parse_literal(kind, keywords, path).map(Column::Literal),
                    None => {
                        self.error(
                            &join(path, "type"),
                            format!(r#"Unsupported column type "{}""#, other),
                        );
                        None
                    }
                },
            },
            Some(_) => {
                self.error(&join(path, "type"), "Columns must declare a single type");
                None
            }
            None if keywords.contains_key("$ref") => {
                self.parse_ref(keywords, path).map(Column::Ref)
            }
            None => {
                self.error(path, r#"Column must declare a "type" or a "$ref""#);
                None
            }
        }
    }

    fn parse_array(
        &mut self,
        keywords: &Map<String, Value>,
        path: &[PathSegment],
    ) -> Option<ArrayItem> {
        let items_path = join(path, "items");
        let items = match keywords.get("items") {
            Some(items @ Value::Object(_)) => items,
            Some(_) => {
                self.error(&items_path, "Expected a single item schema");
                return None;
            }
            None => {
                self.error(&items_path, "Required");
                return None;
            }
        };

        if items.get("type").and_then(Value::as_str) == Some("array") {
            self.error(&items_path, "Array items cannot be arrays");
            return None;
        }

        match self.parse_column(items, &items_path)? {
            Column::Literal(c) => Some(ArrayItem::Literal(c)),
            Column::String(c) => Some(ArrayItem::String(c)),
            Column::Ref(c) => Some(ArrayItem::Ref(c)),
            Column::Object(t) => Some(ArrayItem::Object(t)),
            Column::Array(_) => None,
        }
    }

    fn parse_ref(&mut self, keywords: &Map<String, Value>, path: &[PathSegment]) -> Option<RefColumn> {
        let ref_path = join(path, "$ref");
        let Some(reference) = keywords.get("$ref").and_then(Value::as_str) else {
            self.error(&ref_path, "Expected a string");
            return None;
        };

        let before = self.errors.len();
        if !reference.starts_with("#/") {
            self.error(&ref_path, r##"$ref must start with "#/""##);
        }
        let segments: Vec<&str> = reference.split('/').collect();
        if segments.len() < 3 {
            self.error(
                &ref_path,
                r##"$ref must include at least one table and a column, e.g. "#/users/id""##,
            );
        } else if segments[1..].iter().any(|s| s.is_empty()) {
            self.error(&ref_path, "$ref must not contain empty segments");
        }

        (self.errors.len() == before).then(|| RefColumn {
            reference: reference.to_string(),
        })
    }

    fn parse_string(
        &mut self,
        keywords: &Map<String, Value>,
        path: &[PathSegment],
    ) -> Option<StringColumn> {
        let before = self.errors.len();
        let format = match keywords.get("format") {
            None => None,
            Some(value) => {
                let format = value.as_str().and_then(StringFormat::from_str);
                if format.is_none() {
                    self.error(
                        &join(path, "format"),
                        format!(
                            r#"Unsupported format {}; expected one of "uuid", "date", "datetime""#,
                            value
                        ),
                    );
                }
                format
            }
        };
        let attrs = self.parse_attrs(keywords, path, ValueKind::String);

        (self.errors.len() == before).then_some(StringColumn { format, attrs })
    }

    fn parse_literal(
        &mut self,
        kind: LiteralKind,
        keywords: &Map<String, Value>,
        path: &[PathSegment],
    ) -> Option<LiteralColumn> {
        let before = self.errors.len();
        let attrs = self.parse_attrs(keywords, path, kind.into());

        (self.errors.len() == before).then_some(LiteralColumn { kind, attrs })
    }

    fn parse_attrs(
        &mut self,
        keywords: &Map<String, Value>,
        path: &[PathSegment],
        expected: ValueKind,
    ) -> ColumnAttrs {
        let default = keywords
            .get("default")
            .and_then(|value| self.parse_scalar(value, &join(path, "default"), expected));

        let enum_values = keywords.get("enum").and_then(|value| {
            let enum_path = join(path, "enum");
            let Some(items) = value.as_array().filter(|items| !items.is_empty()) else {
                self.error(&enum_path, "Expected a non-empty array");
                return None;
            };
            let mut values = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                if let Some(v) = self.parse_scalar(item, &join(&enum_path, i), expected) {
                    values.push(v);
                }
            }
            Some(values)
        });

        let description = match keywords.get("description") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.error(&join(path, "description"), "Expected a string");
                None
            }
        };

        ColumnAttrs {
            default,
            enum_values,
            description,
        }
    }

    fn parse_scalar(
        &mut self,
        value: &Value,
        path: &[PathSegment],
        expected: ValueKind,
    ) -> Option<ScalarValue> {
        let scalar = match value {
            Value::Bool(b) => ScalarValue::Bool(*b),
            Value::Number(n) => ScalarValue::Number(n.clone()),
            Value::String(s) => ScalarValue::String(s.clone()),
            _ => {
                self.error(path, "Expected a string, number or boolean");
                return None;
            }
        };
        if !expected.accepts(&scalar) {
            self.error(
                path,
                format!("Expected {}, found {}", expected.describe(), value),
            );
            return None;
        }
        Some(scalar)
    }
}
