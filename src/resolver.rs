//! Resolves symbolic `$ref` pointers into typed foreign keys.

use std::collections::HashMap;

use log::{debug, trace};
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::ir::{
    ForeignTarget, KeyType, ResolvedReference, ResolvedTable, UnresolvedReference, VisitedTable,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(r#"Duplicate table name "{table}""#)]
    DuplicateTable { path: Vec<String>, table: String },
    #[error(r#"Unknown table "{table}" in reference "{reference}""#)]
    UnknownTable {
        path: Vec<String>,
        reference: String,
        table: String,
    },
    #[error(r#"Unknown column "{column}" on table "{table}" in reference "{reference}""#)]
    UnknownColumn {
        path: Vec<String>,
        reference: String,
        table: String,
        column: String,
    },
    #[error(
        r#"Reference "{reference}" cannot target column "{column}" of type "{typ}"; foreign keys must target uuid, string, boolean or integer columns"#
    )]
    InvalidTargetType {
        path: Vec<String>,
        reference: String,
        column: String,
        typ: String,
    },
}

impl ResolveError {
    /// Location of the referencing node, or of the repeated table node.
    pub fn path(&self) -> Vec<String> {
        match self {
            Self::DuplicateTable { path, .. }
            | Self::UnknownTable { path, .. }
            | Self::UnknownColumn { path, .. }
            | Self::InvalidTargetType { path, .. } => path.clone(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::DuplicateTable { .. } => DiagnosticKind::DuplicateTable,
            Self::UnknownTable { .. } => DiagnosticKind::UnknownTable,
            Self::UnknownColumn { .. } => DiagnosticKind::UnknownColumn,
            Self::InvalidTargetType { .. } => DiagnosticKind::InvalidTargetType,
        }
    }
}

impl From<ResolveError> for Diagnostic {
    fn from(err: ResolveError) -> Self {
        let path = err.path().into_iter().map(Into::into).collect();
        Diagnostic::new(path, err.kind(), err.to_string())
    }
}

/// Resolve every reference of every table. Either all tables resolve, or
/// every failing reference in the collection is reported.
pub fn resolve(tables: Vec<VisitedTable>) -> Result<Vec<ResolvedTable>, Vec<ResolveError>> {
    let mut errors = Vec::new();

    let mut index: HashMap<&str, &VisitedTable> = HashMap::with_capacity(tables.len());
    for table in &tables {
        if index.insert(table.name.as_str(), table).is_some() {
            errors.push(ResolveError::DuplicateTable {
                path: table.schema_path.clone(),
                table: table.name.clone(),
            });
        }
    }

    let mut resolved_refs: Vec<Vec<ResolvedReference>> = Vec::with_capacity(tables.len());
    for table in &tables {
        let mut resolved = Vec::with_capacity(table.unresolved_references.len());
        for reference in &table.unresolved_references {
            match resolve_reference(&index, reference) {
                Ok(r) => resolved.push(r),
                Err(e) => errors.push(e),
            }
        }
        resolved_refs.push(resolved);
    }

    if !errors.is_empty() {
        debug!("reference resolution failed with {} error(s)", errors.len());
        return Err(errors);
    }

    Ok(tables
        .into_iter()
        .zip(resolved_refs)
        .map(|(table, references)| ResolvedTable {
            name: table.name,
            required: table.required,
            primary_key: table.primary_key,
            columns: table.columns,
            references,
        })
        .collect())
}

/// Split `#/seg0/.../segN` into the qualified table name and column name.
fn split_pointer(pointer: &str) -> (String, &str) {
    let body = pointer.strip_prefix("#/").unwrap_or(pointer);
    match body.rsplit_once('/') {
        Some((table, column)) => (table.replace('/', "_"), column),
        None => (String::new(), body),
    }
}

fn resolve_reference(
    index: &HashMap<&str, &VisitedTable>,
    reference: &UnresolvedReference,
) -> Result<ResolvedReference, ResolveError> {
    let (table_name, column_name) = split_pointer(&reference.reference);
    trace!("resolving {} -> {}.{}", reference.name, table_name, column_name);

    let path = || reference.schema_path.clone();

    let Some(target) = index.get(table_name.as_str()) else {
        return Err(ResolveError::UnknownTable {
            path: path(),
            reference: reference.reference.clone(),
            table: table_name,
        });
    };

    let Some(column) = target.column(column_name) else {
        if target.has_reference(column_name) {
            return Err(ResolveError::InvalidTargetType {
                path: path(),
                reference: reference.reference.clone(),
                column: column_name.to_string(),
                typ: "$ref".to_string(),
            });
        }
        return Err(ResolveError::UnknownColumn {
            path: path(),
            reference: reference.reference.clone(),
            table: table_name,
            column: column_name.to_string(),
        });
    };

    let typ = KeyType::try_from(column.typ).map_err(|typ| ResolveError::InvalidTargetType {
        path: path(),
        reference: reference.reference.clone(),
        column: column_name.to_string(),
        typ: typ.to_string(),
    })?;

    Ok(ResolvedReference {
        name: reference.name.clone(),
        typ,
        target: ForeignTarget {
            table: table_name,
            column: column_name.to_string(),
        },
        cardinality: reference.cardinality,
    })
}
