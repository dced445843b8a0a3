pub mod diagnostic;
pub mod ir;
pub mod parser;
pub mod resolver;
pub mod shape;
pub mod sql;
pub mod validator;
pub mod visitor;

use log::debug;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use diagnostic::Diagnostic;
use ir::ResolvedTable;
use sql::Dialect;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Schema has {} error(s)", .0.len())]
    Invalid(Vec<Diagnostic>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub dialect: Dialect,
}

/// Validate, flatten and resolve `document`.
///
/// Returns either every resolved table or every diagnostic of the first
/// failing stage, never a partial result.
pub fn compile(document: &Value) -> Result<Vec<ResolvedTable>, Vec<Diagnostic>> {
    validator::check_syntax(document).map_err(|e| vec![e])?;

    let database = parser::parse_document(document)?;
    let errors = validator::validate(&database);
    if !errors.is_empty() {
        return Err(errors);
    }

    let visited = visitor::visit(&database);
    let resolved = resolver::resolve(visited)
        .map_err(|errors| errors.into_iter().map(Diagnostic::from).collect::<Vec<_>>())?;

    debug!("compiled {} table(s)", resolved.len());
    Ok(resolved)
}

/// [`compile`] a JSON document given as text.
pub fn compile_str(source: &str) -> Result<Vec<ResolvedTable>, CompileError> {
    let document: Value = serde_json::from_str(source)?;
    compile(&document).map_err(CompileError::Invalid)
}

/// Compile `document` and generate DDL statements for it.
pub fn generate_sql(
    document: &Value,
    options: &CompileOptions,
) -> Result<Vec<String>, Vec<Diagnostic>> {
    let tables = compile(document)?;
    Ok(sql::generate(&tables, options.dialect))
}

/// [`generate_sql`] for a JSON document given as text.
pub fn generate_sql_str(source: &str, options: &CompileOptions) -> Result<Vec<String>, CompileError> {
    let tables = compile_str(source)?;
    Ok(sql::generate(&tables, options.dialect))
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Compile a JSON Schema document to DDL statements.
///
/// On invalid input the error is a JSON array of diagnostics.
#[wasm_bindgen(js_name = "jsonSchemaToSql")]
pub fn json_schema_to_sql(source: &str, dialect: Option<String>) -> Result<js_sys::Array, JsValue> {
    let dialect = match dialect.as_deref() {
        None => Dialect::default(),
        Some(name) => Dialect::from_str(name)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown dialect: {}", name)))?,
    };

    match generate_sql_str(source, &CompileOptions { dialect }) {
        Ok(statements) => Ok(statements.iter().map(|s| JsValue::from_str(s)).collect()),
        Err(CompileError::Invalid(diagnostics)) => {
            let json = serde_json::to_string(&diagnostics)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Err(JsValue::from_str(&json))
        }
        Err(e) => Err(JsValue::from_str(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::ir::{Cardinality, ColumnType, KeyType};
    use serde_json::json;

    fn users_with_posts() -> Value {
        json!({
            "type": "object",
            "properties": {
                "users": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "name": {"type": "string"},
                        "posts": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "id": {"type": "string", "format": "uuid"},
                                    "title": {"type": "string"}
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_compile_users_with_posts() {
        let tables = compile(&users_with_posts()).unwrap();
        assert_eq!(tables.len(), 2);

        let users = tables.iter().find(|t| t.name == "users").unwrap();
        assert_eq!(users.primary_key.as_deref(), Some("id"));
        let columns: Vec<(&str, ColumnType)> =
            users.columns.iter().map(|c| (c.name.as_str(), c.typ)).collect();
        assert_eq!(columns, vec![("id", ColumnType::Uuid), ("name", ColumnType::String)]);
        assert!(users.references.is_empty());

        let posts = tables.iter().find(|t| t.name == "users_posts").unwrap();
        let columns: Vec<(&str, ColumnType)> =
            posts.columns.iter().map(|c| (c.name.as_str(), c.typ)).collect();
        assert_eq!(columns, vec![("id", ColumnType::Uuid), ("title", ColumnType::String)]);
        assert_eq!(posts.references.len(), 1);
        let fk = &posts.references[0];
        assert_eq!(fk.name, "users_id");
        assert_eq!(fk.typ, KeyType::Uuid);
        assert_eq!(fk.target.table, "users");
        assert_eq!(fk.target.column, "id");
        assert_eq!(fk.cardinality, Cardinality::OneToMany);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let doc = users_with_posts();
        assert_eq!(compile(&doc).unwrap(), compile(&doc).unwrap());
        let options = CompileOptions::default();
        assert_eq!(
            generate_sql(&doc, &options).unwrap(),
            generate_sql(&doc, &options).unwrap()
        );
    }

    #[test]
    fn test_number_primary_key_rejected() {
        let doc = json!({
            "type": "object",
            "properties": {
                "orders": {
                    "type": "object",
                    "x-primaryKey": "status",
                    "properties": {"status": {"type": "number"}}
                }
            }
        });
        let errors = generate_sql(&doc, &CompileOptions::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(r#"cannot be of type "number""#));
        assert_eq!(errors[0].kind, DiagnosticKind::Shape);
    }

    #[test]
    fn test_unknown_column_reference() {
        let doc = json!({
            "type": "object",
            "properties": {
                "users": {
                    "type": "object",
                    "properties": {"id": {"type": "string", "format": "uuid"}}
                },
                "posts": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "author": {"$ref": "#/users/email"}
                    }
                }
            }
        });
        let errors = compile(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::UnknownColumn);
        let path: Vec<String> = errors[0].path.iter().map(|s| s.to_string()).collect();
        assert_eq!(path, vec!["properties", "posts", "properties", "author"]);
    }

    #[test]
    fn test_syntax_error_halts_with_single_root_error() {
        let errors = compile(&json!({"type": 7})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::Syntax);
        assert_eq!(errors[0].to_string(), "#: Invalid JSON Schema syntax");
    }

    #[test]
    fn test_array_item_references_are_one_to_many() {
        let doc = json!({
            "type": "object",
            "properties": {
                "tags": {
                    "type": "object",
                    "properties": {"id": {"type": "integer"}}
                },
                "articles": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "labels": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {"tag": {"$ref": "#/tags/id"}}
                            }
                        },
                        "cover": {
                            "type": "object",
                            "properties": {"tag": {"$ref": "#/tags/id"}}
                        }
                    }
                }
            }
        });
        let tables = compile(&doc).unwrap();

        let labels = tables.iter().find(|t| t.name == "articles_labels").unwrap();
        assert!(labels
            .references
            .iter()
            .all(|r| r.cardinality == Cardinality::OneToMany && r.typ == KeyType::Integer));

        let cover = tables.iter().find(|t| t.name == "articles_cover").unwrap();
        assert!(cover
            .references
            .iter()
            .all(|r| r.cardinality == Cardinality::OneToOne));
    }

    #[test]
    fn test_reference_cycles_are_accepted() {
        let doc = json!({
            "type": "object",
            "properties": {
                "a": {
                    "type": "object",
                    "properties": {"id": {"type": "integer"}, "b": {"$ref": "#/b/id"}}
                },
                "b": {
                    "type": "object",
                    "properties": {"id": {"type": "integer"}, "a": {"$ref": "#/a/id"}}
                }
            }
        });
        let statements = generate_sql(&doc, &CompileOptions::default()).unwrap();
        assert_eq!(
            statements,
            vec![
                r#"CREATE TABLE "a" ("id" integer, "b" integer, CONSTRAINT "a_pkey" PRIMARY KEY ("id"));"#,
                r#"CREATE TABLE "b" ("id" integer, "a" integer, CONSTRAINT "b_pkey" PRIMARY KEY ("id"));"#,
                r#"ALTER TABLE "a" ADD CONSTRAINT "a_b_foreign" FOREIGN KEY ("b") REFERENCES "b" ("id"), ADD CONSTRAINT "a_b_unique" UNIQUE ("b");"#,
                r#"ALTER TABLE "b" ADD CONSTRAINT "b_a_foreign" FOREIGN KEY ("a") REFERENCES "a" ("id"), ADD CONSTRAINT "b_a_unique" UNIQUE ("a");"#,
            ]
        );
    }

    #[test]
    fn test_duplicate_qualified_table_name() {
        let doc = json!({
            "type": "object",
            "properties": {
                "users": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "profile": {
                            "type": "object",
                            "properties": {"bio": {"type": "string"}}
                        }
                    }
                },
                "users_profile": {
                    "type": "object",
                    "properties": {"bio": {"type": "string"}}
                }
            }
        });
        let errors = compile(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::DuplicateTable);
        assert_eq!(
            errors[0].to_string(),
            r#"properties/users_profile: Duplicate table name "users_profile""#
        );
    }

    #[test]
    fn test_wrapped_reference_reports_items_path() {
        let doc = json!({
            "type": "object",
            "properties": {
                "u": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "f": {"type": "array", "items": {"$ref": "#/ghost/id"}}
                    }
                }
            }
        });
        let errors = compile(&doc).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::UnknownTable);
        let path: Vec<String> = errors[0].path.iter().map(|s| s.to_string()).collect();
        assert_eq!(path, vec!["properties", "u", "properties", "f", "items"]);
    }

    #[test]
    fn test_generate_sql_str() {
        let source = users_with_posts().to_string();
        let statements = generate_sql_str(&source, &CompileOptions::default()).unwrap();
        assert_eq!(
            statements,
            vec![
                r#"CREATE TABLE "users_posts" ("id" uuid, "title" varchar(255), "users_id" uuid, CONSTRAINT "users_posts_pkey" PRIMARY KEY ("id"));"#,
                r#"CREATE TABLE "users" ("id" uuid, "name" varchar(255), CONSTRAINT "users_pkey" PRIMARY KEY ("id"));"#,
                r#"ALTER TABLE "users_posts" ADD CONSTRAINT "users_posts_users_id_foreign" FOREIGN KEY ("users_id") REFERENCES "users" ("id");"#,
            ]
        );

        assert!(matches!(
            generate_sql_str("{not json", &CompileOptions::default()),
            Err(CompileError::Json(_))
        ));
    }
}
