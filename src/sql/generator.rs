//! CREATE TABLE / ALTER TABLE statement generation.

use log::debug;

use super::dialect::{string_literal, Dialect};
use super::types::map_type;
use crate::ir::{Cardinality, ColumnType, ResolvedReference, ResolvedTable, VisitedColumn};
use crate::shape::ScalarValue;

/// Generate DDL for `tables`, each statement terminated by `;`.
///
/// All tables are created first, in collection order, with their foreign-key
/// columns but no foreign-key constraints. A second pass adds the constraints,
/// so reference cycles and forward references never depend on creation order.
pub fn generate(tables: &[ResolvedTable], dialect: Dialect) -> Vec<String> {
    let mut statements = Vec::new();

    for table in tables {
        statements.push(create_table(table, dialect));
        if dialect == Dialect::PostgreSQL {
            statements.extend(column_comments(table));
        }
    }

    for table in tables.iter().filter(|t| !t.references.is_empty()) {
        statements.push(add_foreign_keys(table, dialect));
    }

    debug!("generated {} statement(s) for {} table(s)", statements.len(), tables.len());
    statements
}

fn create_table(table: &ResolvedTable, dialect: Dialect) -> String {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|column| column_definition(table, column, dialect))
        .collect();

    for reference in &table.references {
        let mut def = format!(
            "{} {}",
            dialect.quote(&reference.name),
            map_type(ColumnType::from(reference.typ), dialect)
        );
        if table.is_required(&reference.name) {
            def.push_str(" NOT NULL");
        }
        definitions.push(def);
    }

    for column in &table.columns {
        if let Some(values) = &column.enum_values {
            let values: Vec<String> = values.iter().map(literal).collect();
            definitions.push(format!(
                "CHECK ({} IN ({}))",
                dialect.quote(&column.name),
                values.join(", ")
            ));
        }
    }

    if let Some(pk) = primary_key(table) {
        definitions.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            dialect.quote(&format!("{}_pkey", table.name)),
            dialect.quote(pk)
        ));
    }

    format!(
        "CREATE TABLE {} ({});",
        dialect.quote(&table.name),
        definitions.join(", ")
    )
}

/// Explicit key first, then a column named `id`.
fn primary_key(table: &ResolvedTable) -> Option<&str> {
    table
        .primary_key
        .as_deref()
        .or_else(|| table.columns.iter().any(|c| c.name == "id").then_some("id"))
}

fn column_definition(table: &ResolvedTable, column: &VisitedColumn, dialect: Dialect) -> String {
    let mut def = format!(
        "{} {}",
        dialect.quote(&column.name),
        map_type(column.typ, dialect)
    );
    if table.is_required(&column.name) {
        def.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        def.push_str(" DEFAULT ");
        def.push_str(&literal(default));
    }
    if dialect == Dialect::MySQL {
        if let Some(description) = &column.description {
            def.push_str(" COMMENT ");
            def.push_str(&string_literal(description));
        }
    }
    def
}

fn column_comments(table: &ResolvedTable) -> Vec<String> {
    let dialect = Dialect::PostgreSQL;
    table
        .columns
        .iter()
        .filter_map(|column| {
            column.description.as_ref().map(|description| {
                format!(
                    "COMMENT ON COLUMN {}.{} IS {};",
                    dialect.quote(&table.name),
                    dialect.quote(&column.name),
                    string_literal(description)
                )
            })
        })
        .collect()
}

fn add_foreign_keys(table: &ResolvedTable, dialect: Dialect) -> String {
    let clauses: Vec<String> = table
        .references
        .iter()
        .flat_map(|reference| foreign_key_clauses(table, reference, dialect))
        .collect();
    format!(
        "ALTER TABLE {} {};",
        dialect.quote(&table.name),
        clauses.join(", ")
    )
}

fn foreign_key_clauses(
    table: &ResolvedTable,
    reference: &ResolvedReference,
    dialect: Dialect,
) -> Vec<String> {
    let column = dialect.quote(&reference.name);
    let mut clauses = vec![format!(
        "ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        dialect.quote(&format!("{}_{}_foreign", table.name, reference.name)),
        column,
        dialect.quote(&reference.target.table),
        dialect.quote(&reference.target.column)
    )];
    if reference.cardinality == Cardinality::OneToOne {
        clauses.push(format!(
            "ADD CONSTRAINT {} UNIQUE ({})",
            dialect.quote(&format!("{}_{}_unique", table.name, reference.name)),
            column
        ));
    }
    clauses
}

fn literal(value: &ScalarValue) -> String {
    match value {
        ScalarValue::String(s) => string_literal(s),
        ScalarValue::Number(n) => n.to_string(),
        ScalarValue::Bool(b) => b.to_string(),
    }
}
