//! Target SQL dialects.

/// SQL dialect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL
    #[default]
    PostgreSQL,
    /// MySQL
    MySQL,
}

impl Dialect {
    /// Parse dialect from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Some(Self::PostgreSQL),
            "mysql" => Some(Self::MySQL),
            _ => None,
        }
    }

    /// Quote an identifier.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::PostgreSQL => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::MySQL => format!("`{}`", ident.replace('`', "``")),
        }
    }
}

/// Render `value` as a single-quoted SQL string literal.
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
