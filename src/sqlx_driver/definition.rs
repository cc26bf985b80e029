//! YAML model definitions
//!
//! One file describes one model:
//!
//! ```yaml
//! name: Post
//! table: posts
//! fields:
//!   id: { type: integer, primary_key: true, auto: true }
//!   user_id: { type: integer, nullable: false }
//!   title: { type: string, length: 200 }
//!   published: { type: boolean, default: false }
//! relations:
//!   - kind: belongs_to
//!     model: User
//!     foreign_key: user_id
//! ```

use crate::driver::{Model, ModelMap};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::OnceLock;

/// Column types understood by the schema sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    BigInt,
    Float,
    Boolean,
    String,
    Text,
    Timestamp,
    Json,
}

/// Field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub primary_key: bool,

    /// Auto-increment (integer primary keys only)
    #[serde(default)]
    pub auto: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Length for `string` columns, 255 when omitted
    pub length: Option<u32>,

    pub default: Option<serde_json::Value>,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::BelongsTo => write!(f, "belongs_to"),
            RelationKind::HasOne => write!(f, "has_one"),
            RelationKind::HasMany => write!(f, "has_many"),
        }
    }
}

/// Relation as declared in the model file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationDefinition {
    pub kind: RelationKind,
    /// Name of the target model
    pub model: String,
    pub foreign_key: Option<String>,
}

/// Relation resolved against the loaded models
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub kind: RelationKind,
    pub model: String,
    /// Table of the target model
    pub table: String,
    pub foreign_key: String,
    /// Primary key column of the target model
    pub target_key: String,
}

/// A model loaded from a YAML definition file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefinition {
    pub name: String,

    /// Table name, defaults to the lowercased model name
    table: Option<String>,

    pub fields: IndexMap<String, FieldDefinition>,

    #[serde(default)]
    pub relations: Vec<RelationDefinition>,

    #[serde(skip)]
    associations: OnceLock<Vec<Association>>,
}

impl ModelDefinition {
    /// Parse and check a definition
    pub fn from_yaml(content: &str) -> Result<Self> {
        let definition: Self = serde_yaml::from_str(content)?;
        definition.check()?;
        Ok(definition)
    }

    fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::model_load("Model name must not be empty"));
        }
        if self.fields.is_empty() {
            return Err(Error::model_load(format!(
                "Model '{}' must declare at least one field",
                self.name
            )));
        }
        for (column, field) in &self.fields {
            if field.auto && !(field.primary_key && is_integer(field.field_type)) {
                return Err(Error::model_load(format!(
                    "Model '{}': only integer primary keys can be auto-incremented ('{}')",
                    self.name, column
                )));
            }
        }
        if self.fields.values().filter(|f| f.auto).count() > 1 {
            return Err(Error::model_load(format!(
                "Model '{}' declares more than one auto-increment column",
                self.name
            )));
        }
        Ok(())
    }

    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    /// Primary key columns in declaration order
    pub fn primary_key(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(_, field)| field.primary_key)
            .map(|(column, _)| column.as_str())
            .collect()
    }

    /// Relations resolved by [`Model::associate`], empty before that
    pub fn associations(&self) -> &[Association] {
        self.associations.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn association(&self, model: &str) -> Option<&Association> {
        self.associations().iter().find(|a| a.model == model)
    }

    fn resolve(&self, relation: &RelationDefinition, models: &ModelMap) -> Result<Association> {
        let target = models
            .get(&relation.model)
            .and_then(|model| model.downcast_ref::<ModelDefinition>())
            .ok_or_else(|| {
                Error::model_load(format!(
                    "Model '{}' declares a {} relation to unknown model '{}'",
                    self.name, relation.kind, relation.model
                ))
            })?;

        let foreign_key = match (&relation.foreign_key, relation.kind) {
            (Some(key), _) => key.clone(),
            (None, RelationKind::BelongsTo) => format!("{}_id", target.name.to_lowercase()),
            (None, _) => format!("{}_id", self.name.to_lowercase()),
        };

        // belongs_to keeps the key on this model, has_one/has_many on the target
        let owner = match relation.kind {
            RelationKind::BelongsTo => self,
            RelationKind::HasOne | RelationKind::HasMany => target,
        };
        if !owner.fields.contains_key(&foreign_key) {
            return Err(Error::model_load(format!(
                "Relation {} '{}' -> '{}': model '{}' has no field '{}'",
                relation.kind, self.name, target.name, owner.name, foreign_key
            )));
        }

        let referenced = match relation.kind {
            RelationKind::BelongsTo => target,
            RelationKind::HasOne | RelationKind::HasMany => self,
        };
        let target_key = match referenced.primary_key().as_slice() {
            [key] => key.to_string(),
            _ => {
                return Err(Error::model_load(format!(
                    "Relation {} '{}' -> '{}': model '{}' needs exactly one primary key",
                    relation.kind, self.name, target.name, referenced.name
                )))
            }
        };

        Ok(Association {
            kind: relation.kind,
            model: target.name.clone(),
            table: target.table_name(),
            foreign_key,
            target_key,
        })
    }
}

impl Model for ModelDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn associate(&self, models: &ModelMap) -> Result<()> {
        let resolved = self
            .relations
            .iter()
            .map(|relation| self.resolve(relation, models))
            .collect::<Result<Vec<_>>>()?;

        self.associations.set(resolved).map_err(|_| {
            Error::internal(format!("Model '{}' was already associated", self.name))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn is_integer(field_type: FieldType) -> bool {
    matches!(field_type, FieldType::Integer | FieldType::BigInt)
}
