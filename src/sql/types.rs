//! Column type to SQL type mapping.

use super::Dialect;
use crate::ir::ColumnType;

/// Map a column type to the dialect's SQL type.
pub fn map_type(typ: ColumnType, dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::PostgreSQL => map_postgres_type(typ),
        Dialect::MySQL => map_mysql_type(typ),
    }
}

fn map_postgres_type(typ: ColumnType) -> &'static str {
    match typ {
        ColumnType::Uuid => "uuid",
        ColumnType::String => "varchar(255)",
        ColumnType::Boolean => "boolean",
        ColumnType::Date => "date",
        ColumnType::DateTime => "timestamptz",
        ColumnType::Number => "real",
        ColumnType::Integer => "integer",
    }
}

fn map_mysql_type(typ: ColumnType) -> &'static str {
    match typ {
        // No native uuid type
        ColumnType::Uuid => "char(36)",
        ColumnType::String => "varchar(255)",
        ColumnType::Boolean => "boolean",
        ColumnType::Date => "date",
        ColumnType::DateTime => "datetime",
        ColumnType::Number => "float",
        ColumnType::Integer => "int",
    }
}
