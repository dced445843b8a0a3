//! Structural grammar gate and semantic invariants over the shape tree.

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::diagnostic::{join, Diagnostic, DiagnosticKind, PathSegment};
use crate::shape::{ArrayItem, Column, Database, LiteralKind, Table};

const JSON_TYPES: &[&str] = &[
    "null", "boolean", "object", "array", "number", "string", "integer",
];

/// Check `document` against the base JSON Schema grammar.
///
/// Any failure is reported as a single error at the document root: the
/// document is not typed yet so no finer location is meaningful.
pub fn check_syntax(document: &Value) -> Result<(), Diagnostic> {
    if is_schema(document) {
        Ok(())
    } else {
        debug!("document rejected by the base grammar");
        Err(Diagnostic::new(
            vec!["#".into()],
            DiagnosticKind::Syntax,
            "Invalid JSON Schema syntax",
        ))
    }
}

fn is_schema(node: &Value) -> bool {
    match node {
        Value::Bool(_) => true,
        Value::Object(keywords) => keywords_valid(keywords),
        _ => false,
    }
}

fn keywords_valid(keywords: &Map<String, Value>) -> bool {
    keywords.iter().all(|(key, value)| match key.as_str() {
        "type" => is_type_keyword(value),
        "properties" | "definitions" => value
            .as_object()
            .is_some_and(|props| props.values().all(is_schema)),
        "items" => match value {
            Value::Array(items) => items.iter().all(is_schema),
            other => is_schema(other),
        },
        "additionalProperties" => is_schema(value),
        "required" => is_unique_string_array(value),
        "enum" => value.as_array().is_some_and(|values| !values.is_empty()),
        "description" | "format" | "$ref" | "x-primaryKey" | "title" => value.is_string(),
        _ => true,
    })
}

fn is_type_keyword(value: &Value) -> bool {
    let known = |v: &Value| v.as_str().is_some_and(|s| JSON_TYPES.contains(&s));
    match value {
        Value::Array(types) => {
            !types.is_empty() && types.iter().all(known) && is_unique_string_array(value)
        }
        other => known(other),
    }
}

fn is_unique_string_array(value: &Value) -> bool {
    let Some(items) = value.as_array() else {
        return false;
    };
    let mut seen: Vec<&str> = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(s) if !seen.contains(&s) => seen.push(s),
            _ => return false,
        }
    }
    true
}

/// Check every table node of `database` against the primary-key, nesting
/// and required-field invariants. Returns one diagnostic per violation.
pub fn validate(database: &Database) -> Vec<Diagnostic> {
    let mut errors = Vec::new();
    let root: Vec<PathSegment> = vec!["properties".into()];
    for (name, table) in &database.tables {
        validate_table(table, &join(&root, name.as_str()), &mut errors);
    }
    debug!("semantic validation found {} error(s)", errors.len());
    errors
}

fn validate_table(table: &Table, path: &[PathSegment], errors: &mut Vec<Diagnostic>) {
    trace!("validating table at {:?}", path);

    if table.primary_key.is_none() {
        if let Some(id) = table.property("id") {
            const PREFIX: &str = r#""id" is considered a primary key when "x-primaryKey" is missing"#;
            if let Some(reason) = key_violation(id) {
                errors.push(Diagnostic::shape(path, format!("{} and {}", PREFIX, reason)));
            }
        }
    }

    if let Some((nested_name, nested)) = table.first_nested() {
        if table.effective_primary_key().is_none() {
            errors.push(Diagnostic::shape(
                path,
                format!(
                    r#"Must have an "id" property or a custom primary key via "x-primaryKey" because it has nested "{}" of type "{}""#,
                    nested_name,
                    nested.type_name()
                ),
            ));
        }
    }

    for field in table.required.iter().flatten() {
        if table.property(field).is_none() {
            errors.push(Diagnostic::shape(
                path,
                format!(r#"Requires missing field "{}""#, field),
            ));
        }
    }

    if let Some(pk) = &table.primary_key {
        match table.property(pk) {
            None => errors.push(Diagnostic::shape(
                path,
                format!(r#"Refers to unknown field "{}""#, pk),
            )),
            Some(column) => {
                if let Some(reason) = key_violation(column) {
                    errors.push(Diagnostic::shape(path, format!("Primary key {}", reason)));
                }
            }
        }
    }

    let properties = join(path, "properties");
    for (name, column) in &table.properties {
        match column {
            Column::Object(child) => {
                validate_table(child, &join(&properties, name.as_str()), errors);
            }
            Column::Array(ArrayItem::Object(child)) => {
                let item_path = join(&join(&properties, name.as_str()), "items");
                validate_table(child, &item_path, errors);
            }
            _ => {}
        }
    }
}

/// Why `column` cannot serve as a primary key, if it cannot.
fn key_violation(column: &Column) -> Option<String> {
    match column {
        Column::Ref(_) => Some(r#"cannot be a "$ref""#.to_string()),
        Column::Object(_) | Column::Array(_) => {
            Some(format!(r#"cannot be of type "{}""#, column.type_name()))
        }
        Column::Literal(lit) if lit.kind == LiteralKind::Number => {
            Some(r#"cannot be of type "number""#.to_string())
        }
        Column::String(s) => s
            .format
            .filter(|f| f.is_temporal())
            .map(|f| format!(r#"cannot be of type "string" format "{}""#, f.as_str())),
        Column::Literal(_) => None,
    }
}
