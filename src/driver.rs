//! Driver and model contracts
//!
//! A driver is the ORM-side collaborator behind a named database: it
//! authenticates the connection, turns model definition files into loaded
//! models, and synchronizes the schema of every model it has imported.

use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

/// Loaded models of one database, keyed by model name in load order
pub type ModelMap = IndexMap<String, Arc<dyn Model>>;

/// Options forwarded to [`Driver::sync`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Drop and recreate tables instead of only creating missing ones
    pub force: bool,
}

/// A model definition returned by [`Driver::import`]
pub trait Model: Send + Sync {
    /// Name the model is registered under
    fn name(&self) -> &str;

    /// Declare relations against the other models of the same database.
    ///
    /// Called exactly once, after every model of the database has been
    /// loaded. Models without relations keep the default no-op.
    fn associate(&self, _models: &ModelMap) -> Result<()> {
        Ok(())
    }

    /// Return self as Any for downcasting to the concrete model type
    fn as_any(&self) -> &dyn Any;
}

/// Unified database driver trait
#[async_trait]
pub trait Driver: Send + Sync {
    /// Verify that the database is reachable with the configured credentials
    async fn authenticate(&self) -> Result<()>;

    /// Import a single model definition file
    async fn import(&self, path: &Path) -> Result<Arc<dyn Model>>;

    /// Forget every model imported so far.
    ///
    /// Called when loading or associating models fails, so a later
    /// [`Driver::sync`] never sees a partial model set.
    async fn discard_models(&self) {}

    /// Synchronize the schema of every imported model
    async fn sync(&self, options: SyncOptions) -> Result<()>;

    /// Get the underlying driver as Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl dyn Model {
    /// Downcast to a concrete model type
    pub fn downcast_ref<T: Model + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl dyn Driver {
    /// Downcast to a concrete driver type
    pub fn downcast_ref<T: Driver + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
