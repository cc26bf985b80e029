//! Databases plugin
//!
//! Registration validates every entry up front, then configures all
//! databases concurrently. Each database is exposed in the plugin's
//! registry as soon as its own setup succeeds, so a failed registration
//! still leaves the successful databases reachable.

use crate::accessor::DbAccessor;
use crate::config::{DatabaseOptions, DatabasesSettings, PluginOptions};
use crate::configurator::configure;
use crate::error::{Error, Result};
use crate::registry::DatabaseRegistry;
use crate::schema;
use futures::future::join_all;
use std::sync::Arc;

/// Name the plugin is known under
pub const PLUGIN_NAME: &str = env!("CARGO_PKG_NAME");

/// Version of the plugin
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plugin owning the registry of named databases
#[derive(Clone, Default)]
pub struct DatabasesPlugin {
    registry: Arc<DatabaseRegistry>,
}

impl DatabasesPlugin {
    /// Create a plugin with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plugin and register the given databases
    ///
    /// # Example
    /// ```rust,ignore
    /// let plugin = DatabasesPlugin::register(vec![
    ///     DatabaseOptions::new("main", main_driver).models(["models/*.yaml"]).sync(true),
    ///     DatabaseOptions::new("analytics", analytics_driver),
    /// ])
    /// .await?;
    /// ```
    pub async fn register(options: impl Into<PluginOptions>) -> Result<Self> {
        let plugin = Self::new();
        plugin.register_into(options).await?;
        Ok(plugin)
    }

    /// Build sqlx drivers from file settings and register them
    pub async fn from_settings(settings: DatabasesSettings) -> Result<Self> {
        let options = settings.into_options()?;
        Self::register(options).await
    }

    /// Register databases into this plugin's registry.
    ///
    /// Completes once every database has settled. A single failure is
    /// returned as is; several are returned as [`Error::Multiple`] in
    /// declaration order.
    pub async fn register_into(&self, options: impl Into<PluginOptions>) -> Result<()> {
        let list = schema::validate(options)?;

        // Handles are write-once: a live database is never replaced
        if let Some(taken) = list.iter().find(|entry| self.registry.contains(&entry.name)) {
            return Err(Error::validation(format!(
                "Database \"{}\" is already registered",
                taken.name
            )));
        }

        self.registry.declare(list.iter().map(|entry| entry.name.clone()));

        log::info!("{} v{}: registering {} database(s)", PLUGIN_NAME, VERSION, list.len());

        let outcomes = join_all(list.iter().map(|entry| self.setup(entry))).await;

        let failures: Vec<Error> = outcomes.into_iter().filter_map(Result::err).collect();
        match Error::aggregate(failures) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn setup(&self, entry: &DatabaseOptions) -> Result<()> {
        match configure(entry).await {
            Ok(database) => {
                self.registry.expose(entry.name.clone(), database);
                Ok(())
            }
            Err(e) => {
                log::error!("Database '{}' failed to register: {}", entry.name, e);
                Err(e)
            }
        }
    }

    /// Accessor handed to each request
    pub fn accessor(&self) -> DbAccessor {
        DbAccessor::new(Arc::clone(&self.registry))
    }

    /// Attach the database accessor to an incoming request
    pub fn decorate<B>(&self, req: &mut hyper::Request<B>) {
        req.extensions_mut().insert(self.accessor());
    }

    pub fn registry(&self) -> &Arc<DatabaseRegistry> {
        &self.registry
    }
}
