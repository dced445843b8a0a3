//! Flattens the nested shape tree into a list of first-normal-form tables.
//!
//! Every object node becomes one table named after its ancestor path. Nested
//! objects and arrays are replaced by child tables that carry a synthetic
//! reference back to their parent's primary key. Arrays of scalars or
//! references are wrapped in a one-column `value` table first, so every array
//! ends up as a child table.
//!
//! Tables are emitted in post-order: a child always precedes its parent.

use log::{debug, trace};

use crate::ir::{Cardinality, ColumnType, UnresolvedReference, VisitedColumn, VisitedTable};
use crate::shape::{
    ArrayItem, Column, ColumnAttrs, Database, LiteralColumn, LiteralKind, RefColumn, StringColumn,
    StringFormat, Table,
};

/// Flatten every table of `database`.
pub fn visit(database: &Database) -> Vec<VisitedTable> {
    let mut visitor = Visitor::default();
    let schema_path = vec!["properties".to_string()];
    for (name, table) in &database.tables {
        visitor.visit_table(name, table, &[], &schema_path, Origin::Property);
    }
    debug!("visited {} table(s)", visitor.tables.len());
    visitor.tables
}

/// Where a table node sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Object property, or a top-level table
    Property,
    /// `items` schema of an array of objects
    ArrayItem,
    /// Synthetic `value` table around an array of scalars or references
    Wrapper,
}

#[derive(Default)]
struct Visitor {
    tables: Vec<VisitedTable>,
}

impl Visitor {
    /// Visit `table` found under `path`. Tables produced from array elements
    /// make all of their references one-to-many.
    fn visit_table(
        &mut self,
        name: &str,
        table: &Table,
        path: &[String],
        schema_path: &[String],
        origin: Origin,
    ) {
        let own_path = extend(path, [name]);
        let qualified = own_path.join("_");
        trace!("visiting table {}", qualified);

        let mut table_schema_path = extend(schema_path, [name]);
        if origin != Origin::Property {
            table_schema_path.push("items".to_string());
        }
        let properties_path = extend(&table_schema_path, ["properties"]);

        let cardinality = Cardinality::from_array_context(origin != Origin::Property);
        let mut visited = VisitedTable {
            name: qualified,
            schema_path: table_schema_path.clone(),
            required: table.required.clone(),
            primary_key: table.effective_primary_key().map(str::to_string),
            columns: Vec::new(),
            unresolved_references: Vec::new(),
        };

        for (column_name, column) in &table.properties {
            match column {
                Column::Literal(lit) => visited.columns.push(literal_column(column_name, lit)),
                Column::String(s) => visited.columns.push(string_column(column_name, s)),
                Column::Ref(r) => {
                    // The wrapped reference is the `items` node itself.
                    let schema_path = match origin {
                        Origin::Wrapper => table_schema_path.clone(),
                        _ => extend(&properties_path, [column_name.as_str()]),
                    };
                    visited.unresolved_references.push(UnresolvedReference {
                        name: column_name.clone(),
                        reference: r.reference.clone(),
                        schema_path,
                        cardinality,
                    });
                }
                Column::Object(child) => {
                    let child = with_back_reference(child, table, &own_path);
                    self.visit_table(
                        column_name,
                        &child,
                        &own_path,
                        &properties_path,
                        Origin::Property,
                    );
                }
                Column::Array(ArrayItem::Object(child)) => {
                    let child = with_back_reference(child, table, &own_path);
                    self.visit_table(
                        column_name,
                        &child,
                        &own_path,
                        &properties_path,
                        Origin::ArrayItem,
                    );
                }
                Column::Array(item) => {
                    let wrapper = Table {
                        properties: vec![("value".to_string(), Column::from(item.clone()))],
                        required: None,
                        primary_key: None,
                    };
                    let wrapper = with_back_reference(&wrapper, table, &own_path);
                    self.visit_table(
                        column_name,
                        &wrapper,
                        &own_path,
                        &properties_path,
                        Origin::Wrapper,
                    );
                }
            }
        }

        self.tables.push(visited);
    }
}

/// Copy of `child` with a reference to `parent`'s key, named `<path>_<key>`.
fn with_back_reference(child: &Table, parent: &Table, parent_path: &[String]) -> Table {
    let key = parent.primary_key.as_deref().unwrap_or("id");
    let name = extend(parent_path, [key]).join("_");
    let reference = format!("#/{}/{}", parent_path.join("/"), key);
    child.with_property(&name, Column::Ref(RefColumn { reference }))
}

fn extend<const N: usize>(path: &[String], segments: [&str; N]) -> Vec<String> {
    let mut extended = path.to_vec();
    extended.extend(segments.iter().map(|s| s.to_string()));
    extended
}

fn literal_column(name: &str, column: &LiteralColumn) -> VisitedColumn {
    let typ = match column.kind {
        LiteralKind::Boolean => ColumnType::Boolean,
        LiteralKind::Number => ColumnType::Number,
        LiteralKind::Integer => ColumnType::Integer,
    };
    scalar_column(name, typ, &column.attrs)
}

fn string_column(name: &str, column: &StringColumn) -> VisitedColumn {
    let typ = match column.format {
        Some(StringFormat::Uuid) => ColumnType::Uuid,
        Some(StringFormat::Date) => ColumnType::Date,
        Some(StringFormat::DateTime) => ColumnType::DateTime,
        None => ColumnType::String,
    };
    scalar_column(name, typ, &column.attrs)
}

fn scalar_column(name: &str, typ: ColumnType, attrs: &ColumnAttrs) -> VisitedColumn {
    VisitedColumn {
        name: name.to_string(),
        typ,
        default: attrs.default.clone(),
        enum_values: attrs.enum_values.clone(),
        description: attrs.description.clone(),
    }
}
