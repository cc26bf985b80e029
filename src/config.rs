//! Database configuration structures and parsing
//!
//! Entries are either built in code with [`DatabaseOptions`] around an
//! already constructed driver, or read from a TOML file through
//! [`DatabasesSettings`], which builds sqlx drivers from connection URLs.

use crate::database::Database;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::sqlx_driver::SqlxDriver;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Future returned by an asynchronous onConnect callback
pub type ConnectFuture = BoxFuture<'static, Result<()>>;

/// Callback invoked once a database handle is ready
#[derive(Clone)]
pub enum OnConnect {
    /// Runs inline; its failure aborts the database setup
    Sync(Arc<dyn Fn(&Database) -> Result<()> + Send + Sync>),
    /// Returns a future that is awaited before the setup finishes
    Async(Arc<dyn Fn(Arc<Database>) -> ConnectFuture + Send + Sync>),
}

impl OnConnect {
    pub fn sync<F>(callback: F) -> Self
    where
        F: Fn(&Database) -> Result<()> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(callback))
    }

    pub fn future<F, Fut>(callback: F) -> Self
    where
        F: Fn(Arc<Database>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::Async(Arc::new(move |database| Box::pin(callback(database))))
    }

    /// Run the callback against a ready handle
    pub(crate) async fn run(&self, database: &Arc<Database>) -> Result<()> {
        match self {
            OnConnect::Sync(callback) => callback(database),
            OnConnect::Async(callback) => callback(Arc::clone(database)).await,
        }
    }
}

impl fmt::Debug for OnConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnConnect::Sync(_) => f.write_str("OnConnect::Sync"),
            OnConnect::Async(_) => f.write_str("OnConnect::Async"),
        }
    }
}

/// Configuration for a single named database
#[derive(Clone)]
pub struct DatabaseOptions {
    /// Unique name the handle is exposed under
    pub name: String,
    /// Glob patterns of model definition files
    pub models: Vec<String>,
    /// Externally constructed driver instance
    pub driver: Arc<dyn Driver>,
    /// Synchronize the schema once models are loaded
    pub sync: bool,
    /// Drop and recreate tables when syncing
    pub force_sync: bool,
    /// Log every setup step at info level
    pub debug: bool,
    pub on_connect: Option<OnConnect>,
}

impl DatabaseOptions {
    /// Create options for a database with no models and no sync
    pub fn new(name: impl Into<String>, driver: Arc<dyn Driver>) -> Self {
        Self {
            name: name.into(),
            models: Vec::new(),
            driver,
            sync: false,
            force_sync: false,
            debug: false,
            on_connect: None,
        }
    }

    /// Set the model file glob patterns
    pub fn models<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn force_sync(mut self, force_sync: bool) -> Self {
        self.force_sync = force_sync;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn on_connect(mut self, callback: OnConnect) -> Self {
        self.on_connect = Some(callback);
        self
    }
}

impl fmt::Debug for DatabaseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseOptions")
            .field("name", &self.name)
            .field("models", &self.models)
            .field("sync", &self.sync)
            .field("force_sync", &self.force_sync)
            .field("debug", &self.debug)
            .field("on_connect", &self.on_connect)
            .finish_non_exhaustive()
    }
}

/// Plugin options: a single database or a list of them
#[derive(Debug, Clone)]
pub enum PluginOptions {
    Single(DatabaseOptions),
    List(Vec<DatabaseOptions>),
}

impl PluginOptions {
    /// Normalize to a list, preserving declaration order
    pub fn into_list(self) -> Vec<DatabaseOptions> {
        match self {
            PluginOptions::Single(options) => vec![options],
            PluginOptions::List(list) => list,
        }
    }
}

impl From<DatabaseOptions> for PluginOptions {
    fn from(options: DatabaseOptions) -> Self {
        PluginOptions::Single(options)
    }
}

impl From<Vec<DatabaseOptions>> for PluginOptions {
    fn from(list: Vec<DatabaseOptions>) -> Self {
        PluginOptions::List(list)
    }
}

/// File-based settings for one database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    pub name: String,

    /// Database connection URL (postgres://, mysql://, sqlite:)
    pub url: String,

    #[serde(default)]
    pub models: Vec<String>,

    #[serde(default)]
    pub sync: bool,

    #[serde(default)]
    pub force_sync: bool,

    #[serde(default)]
    pub debug: bool,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// Build options with a lazily connecting sqlx driver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn into_options(self) -> Result<DatabaseOptions> {
        let driver = SqlxDriver::connect_lazy(&self.url, self.max_connections)?;

        Ok(DatabaseOptions::new(self.name, Arc::new(driver))
            .models(self.models)
            .sync(self.sync)
            .force_sync(self.force_sync)
            .debug(self.debug))
    }
}

/// Settings for every database of the application
///
/// ```toml
/// [[databases]]
/// name = "main"
/// url = "postgres://app@localhost/main"
/// models = ["models/*.yaml"]
/// sync = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabasesSettings {
    #[serde(default)]
    pub databases: Vec<DatabaseSettings>,
}

impl DatabasesSettings {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::validation(format!(
                "Failed to read database settings '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Build plugin options for every configured database
    pub fn into_options(self) -> Result<PluginOptions> {
        let list = self
            .databases
            .into_iter()
            .map(DatabaseSettings::into_options)
            .collect::<Result<Vec<_>>>()?;
        Ok(PluginOptions::List(list))
    }
}

fn default_max_connections() -> u32 {
    10
}
