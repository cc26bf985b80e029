//! Registry of named database handles
//!
//! The declared name order is fixed when the plugin validates its options,
//! while handles are exposed one by one as their setup completes. The
//! default database is therefore always the first *declared* entry that
//! made it into the registry, never the first to finish connecting.

use crate::database::Database;
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

/// Registry for managing multiple named database handles
#[derive(Default)]
pub struct DatabaseRegistry {
    /// Map of database name to handle
    handles: DashMap<String, Arc<Database>>,
    /// Names in the order they were declared
    order: RwLock<Vec<String>>,
}

impl DatabaseRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record declared names ahead of their handles.
    ///
    /// Names already declared keep their first position.
    pub fn declare<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = self.order.write().unwrap_or_else(|e| e.into_inner());
        for name in names {
            let name = name.into();
            if !order.contains(&name) {
                order.push(name);
            }
        }
    }

    /// Publish a ready handle under its name
    pub fn expose(&self, name: impl Into<String>, database: Arc<Database>) {
        let name = name.into();
        self.declare([name.clone()]);
        log::info!("Exposing database '{}'", name);
        self.handles.insert(name, database);
    }

    /// Get a handle by name
    pub fn get(&self, name: &str) -> Option<Arc<Database>> {
        self.handles.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Handle of the first declared database that is registered
    pub fn first(&self) -> Option<Arc<Database>> {
        let order = self.order.read().unwrap_or_else(|e| e.into_inner());
        order.iter().find_map(|name| self.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handles.contains_key(name)
    }

    /// Registered names in declaration order
    pub fn names(&self) -> Vec<String> {
        let order = self.order.read().unwrap_or_else(|e| e.into_inner());
        order
            .iter()
            .filter(|name| self.handles.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Get statistics about the registry
    pub fn stats(&self) -> RegistryStats {
        let database_names = self.names();
        RegistryStats {
            total_databases: database_names.len(),
            default_database: database_names.first().cloned(),
            database_names,
        }
    }
}

/// Statistics about the database registry
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Total number of registered databases
    pub total_databases: usize,
    /// Name of the default database (if any)
    pub default_database: Option<String>,
    /// List of all database names
    pub database_names: Vec<String>,
}
