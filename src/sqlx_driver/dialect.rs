//! Per-backend DDL generation for schema sync

use super::definition::{FieldDefinition, FieldType, ModelDefinition, RelationKind};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Database backend types supported by the sqlx driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Postgres,
    MySQL,
    SQLite,
}

impl DatabaseBackend {
    /// Quote an identifier (table name, column name) for this database
    pub fn quote_identifier(&self, identifier: &str) -> String {
        match self {
            DatabaseBackend::MySQL => format!("`{}`", identifier.replace('`', "``")),
            DatabaseBackend::Postgres | DatabaseBackend::SQLite => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    fn column_type(&self, field: &FieldDefinition) -> String {
        let length = field.length.unwrap_or(255);
        match (self, field.field_type) {
            (DatabaseBackend::SQLite, FieldType::Integer | FieldType::BigInt) => {
                "INTEGER".to_string()
            }
            (_, FieldType::Integer) => "INTEGER".to_string(),
            (_, FieldType::BigInt) => "BIGINT".to_string(),
            (DatabaseBackend::Postgres, FieldType::Float) => "DOUBLE PRECISION".to_string(),
            (DatabaseBackend::MySQL, FieldType::Float) => "DOUBLE".to_string(),
            (DatabaseBackend::SQLite, FieldType::Float) => "REAL".to_string(),
            (DatabaseBackend::MySQL, FieldType::Boolean) => "TINYINT(1)".to_string(),
            (DatabaseBackend::SQLite, FieldType::Boolean) => "INTEGER".to_string(),
            (DatabaseBackend::Postgres, FieldType::Boolean) => "BOOLEAN".to_string(),
            (DatabaseBackend::SQLite, FieldType::String) => "TEXT".to_string(),
            (_, FieldType::String) => format!("VARCHAR({})", length),
            (_, FieldType::Text) => "TEXT".to_string(),
            (DatabaseBackend::Postgres, FieldType::Timestamp) => "TIMESTAMP".to_string(),
            (DatabaseBackend::MySQL, FieldType::Timestamp) => "DATETIME".to_string(),
            (DatabaseBackend::SQLite, FieldType::Timestamp) => "TEXT".to_string(),
            (DatabaseBackend::Postgres, FieldType::Json) => "JSONB".to_string(),
            (DatabaseBackend::MySQL, FieldType::Json) => "JSON".to_string(),
            (DatabaseBackend::SQLite, FieldType::Json) => "TEXT".to_string(),
        }
    }

    fn auto_increment_syntax(&self, field: &FieldDefinition) -> &'static str {
        match (self, field.field_type) {
            (DatabaseBackend::Postgres, FieldType::BigInt) => "BIGSERIAL PRIMARY KEY",
            (DatabaseBackend::Postgres, _) => "SERIAL PRIMARY KEY",
            (DatabaseBackend::MySQL, FieldType::BigInt) => "BIGINT AUTO_INCREMENT PRIMARY KEY",
            (DatabaseBackend::MySQL, _) => "INTEGER AUTO_INCREMENT PRIMARY KEY",
            (DatabaseBackend::SQLite, _) => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    fn default_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(flag) => match self {
                DatabaseBackend::Postgres => flag.to_string().to_uppercase(),
                DatabaseBackend::MySQL | DatabaseBackend::SQLite => u8::from(*flag).to_string(),
            },
            Value::Number(number) => number.to_string(),
            Value::String(text) => format!("'{}'", text.replace('\'', "''")),
            Value::Array(_) | Value::Object(_) => {
                format!("'{}'", value.to_string().replace('\'', "''"))
            }
        }
    }

    fn column_sql(&self, column: &str, field: &FieldDefinition, inline_key: bool) -> String {
        let mut sql = self.quote_identifier(column);
        sql.push(' ');

        if field.auto {
            sql.push_str(self.auto_increment_syntax(field));
            return sql;
        }

        sql.push_str(&self.column_type(field));
        if inline_key {
            sql.push_str(" PRIMARY KEY");
        }
        if !field.nullable && !inline_key {
            sql.push_str(" NOT NULL");
        }
        if field.unique && !inline_key {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = &field.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.default_literal(default));
        }
        sql
    }

    /// `CREATE TABLE IF NOT EXISTS` for a model, with foreign keys for its
    /// resolved belongs_to relations
    pub fn create_table_sql(&self, model: &ModelDefinition) -> String {
        let primary_key = model.primary_key();
        let single_key = primary_key.len() == 1;

        let mut parts: Vec<String> = model
            .fields
            .iter()
            .map(|(column, field)| {
                self.column_sql(column, field, single_key && field.primary_key)
            })
            .collect();

        if primary_key.len() > 1 {
            let columns: Vec<_> = primary_key
                .iter()
                .map(|column| self.quote_identifier(column))
                .collect();
            parts.push(format!("PRIMARY KEY ({})", columns.join(", ")));
        }

        for association in model.associations() {
            if association.kind == RelationKind::BelongsTo {
                parts.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.quote_identifier(&association.foreign_key),
                    self.quote_identifier(&association.table),
                    self.quote_identifier(&association.target_key)
                ));
            }
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote_identifier(&model.table_name()),
            parts.join(", ")
        )
    }

    pub fn drop_table_sql(&self, model: &ModelDefinition) -> String {
        format!(
            "DROP TABLE IF EXISTS {}",
            self.quote_identifier(&model.table_name())
        )
    }
}

/// Order models so that every belongs_to target is created before the
/// models referencing it. Cycles fall back to load order.
pub fn creation_order(models: &[Arc<ModelDefinition>]) -> Vec<Arc<ModelDefinition>> {
    fn visit(
        index: usize,
        models: &[Arc<ModelDefinition>],
        visiting: &mut HashSet<usize>,
        done: &mut HashSet<usize>,
        ordered: &mut Vec<Arc<ModelDefinition>>,
    ) {
        if done.contains(&index) || !visiting.insert(index) {
            return;
        }

        for association in models[index].associations() {
            if association.kind != RelationKind::BelongsTo {
                continue;
            }
            if let Some(target) = models.iter().position(|m| m.name == association.model) {
                visit(target, models, visiting, done, ordered);
            }
        }

        visiting.remove(&index);
        if done.insert(index) {
            ordered.push(Arc::clone(&models[index]));
        }
    }

    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    let mut ordered = Vec::with_capacity(models.len());
    for index in 0..models.len() {
        visit(index, models, &mut visiting, &mut done, &mut ordered);
    }
    ordered
}
