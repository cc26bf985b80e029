//! Database handle exposed to request handlers

use crate::driver::{Driver, Model, ModelMap};
use std::fmt;
use std::sync::Arc;

/// A ready-to-use database: the driver plus every model loaded for it
pub struct Database {
    name: String,
    driver: Arc<dyn Driver>,
    models: ModelMap,
}

impl Database {
    pub fn new(name: impl Into<String>, driver: Arc<dyn Driver>, models: ModelMap) -> Self {
        Self {
            name: name.into(),
            driver,
            models,
        }
    }

    /// Name of the configuration this handle was built from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Downcast the driver to its concrete type
    pub fn driver_as<T: Driver + 'static>(&self) -> Option<&T> {
        self.driver.downcast_ref::<T>()
    }

    pub fn models(&self) -> &ModelMap {
        &self.models
    }

    /// Get a loaded model by name
    pub fn model(&self, name: &str) -> Option<&Arc<dyn Model>> {
        self.models.get(name)
    }

    /// Get a loaded model by name, downcast to its concrete type
    pub fn model_as<T: Model + 'static>(&self, name: &str) -> Option<&T> {
        self.models.get(name).and_then(|model| model.downcast_ref::<T>())
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("models", &self.model_names())
            .finish_non_exhaustive()
    }
}
