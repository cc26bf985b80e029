//! Per-request database lookup
//!
//! Every decorated request carries a [`DbAccessor`] in its extensions.
//! Handlers reach it through [`DbRequestExt`]:
//!
//! ```rust,ignore
//! async fn handle(req: Request<Body>) -> Result<Response<Body>> {
//!     let main = req.get_db(None)?;            // first declared database
//!     let analytics = req.get_db(Some("analytics"))?;
//!     // ...
//! }
//! ```

use crate::database::Database;
use crate::error::{Error, Result};
use crate::registry::DatabaseRegistry;
use std::sync::Arc;

/// Lookup function handed to each request
#[derive(Clone)]
pub struct DbAccessor {
    registry: Arc<DatabaseRegistry>,
}

impl DbAccessor {
    pub fn new(registry: Arc<DatabaseRegistry>) -> Self {
        Self { registry }
    }

    /// Look up a database by name, or the default one when no name is given.
    ///
    /// # Returns
    /// * `Ok(Some(db))` - The named database, or the first declared one
    /// * `Ok(None)` - No name given and nothing registered yet
    /// * `Err(Error::DatabaseNotFound)` - The name is not registered
    pub fn get_db(&self, name: Option<&str>) -> Result<Option<Arc<Database>>> {
        match name {
            None => Ok(self.registry.first()),
            Some(name) => self.database(name).map(Some),
        }
    }

    /// Get a database by name, failing when it is not registered
    pub fn database(&self, name: &str) -> Result<Arc<Database>> {
        self.registry
            .get(name)
            .ok_or_else(|| Error::database_not_found(name))
    }

    /// The first declared database, if any is registered
    pub fn default_db(&self) -> Option<Arc<Database>> {
        self.registry.first()
    }

    pub fn registry(&self) -> &Arc<DatabaseRegistry> {
        &self.registry
    }
}

/// Database lookup on decorated hyper requests
pub trait DbRequestExt {
    /// The accessor inserted by the databases plugin
    fn db_accessor(&self) -> Result<&DbAccessor>;

    /// Same contract as [`DbAccessor::get_db`]
    fn get_db(&self, name: Option<&str>) -> Result<Option<Arc<Database>>> {
        self.db_accessor()?.get_db(name)
    }
}

impl<B> DbRequestExt for hyper::Request<B> {
    fn db_accessor(&self) -> Result<&DbAccessor> {
        self.extensions().get::<DbAccessor>().ok_or_else(|| {
            Error::internal("Request was not decorated by the databases plugin")
        })
    }
}
