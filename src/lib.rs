//! rustf-databases - named multi-database registration for hyper servers
//!
//! The plugin takes one or more database configurations and, for each of
//! them:
//! - authenticates the driver connection
//! - loads model definition files matched by glob patterns
//! - lets the models declare relations against each other
//! - optionally synchronizes the schema
//! - exposes the resulting handle under the configuration name
//!
//! Requests decorated by the plugin can then look databases up by name, or
//! take the first declared one by default:
//!
//! ```rust,ignore
//! use rustf_databases::prelude::*;
//!
//! let plugin = DatabasesPlugin::register(vec![
//!     DatabaseOptions::new("main", Arc::new(SqlxDriver::connect_lazy(main_url, 10)?))
//!         .models(["models/*.yaml"])
//!         .sync(true),
//!     DatabaseOptions::new("analytics", Arc::new(SqlxDriver::connect_lazy(analytics_url, 4)?)),
//! ])
//! .await?;
//!
//! plugin.decorate(&mut req);
//! let main = req.get_db(None)?;
//! let analytics = req.get_db(Some("analytics"))?;
//! ```

// No panicking shortcuts outside tests
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod accessor;
pub mod config;
pub mod configurator;
pub mod database;
pub mod driver;
pub mod error;
pub mod models;
pub mod plugin;
pub mod registry;
pub mod schema;
pub mod sqlx_driver;

// Re-export main types for public API
pub use accessor::{DbAccessor, DbRequestExt};
pub use config::{
    ConnectFuture, DatabaseOptions, DatabaseSettings, DatabasesSettings, OnConnect,
    PluginOptions,
};
pub use database::Database;
pub use driver::{Driver, Model, ModelMap, SyncOptions};
pub use error::{Error, Result};
pub use plugin::{DatabasesPlugin, PLUGIN_NAME, VERSION};
pub use registry::{DatabaseRegistry, RegistryStats};
pub use sqlx_driver::{DatabaseBackend, ModelDefinition, SqlxDriver};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::*;
    pub use std::sync::Arc;
}
