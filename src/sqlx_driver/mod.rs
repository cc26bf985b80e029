//! sqlx-backed driver
//!
//! Wraps a PostgreSQL, MySQL or SQLite pool chosen from the URL scheme.
//! Model definition files are YAML (see [`definition`]) and `sync` creates
//! the tables of every model imported through this driver.

pub mod definition;
pub mod dialect;

use crate::driver::{Driver, Model, SyncOptions};
use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{MySqlPool, PgPool, SqlitePool};
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use definition::{
    Association, FieldDefinition, FieldType, ModelDefinition, RelationDefinition, RelationKind,
};
pub use dialect::DatabaseBackend;

#[derive(Clone)]
enum Pool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

/// Driver over a lazily connecting sqlx pool
pub struct SqlxDriver {
    pool: Pool,
    /// Models imported through this driver, in import order
    models: RwLock<IndexMap<String, Arc<ModelDefinition>>>,
}

impl SqlxDriver {
    /// Create a driver without opening any connection.
    ///
    /// The backend is picked from the URL scheme; the first connection is
    /// only attempted by [`Driver::authenticate`]. In-memory SQLite URLs
    /// are pinned to a single connection that never expires, since every
    /// new connection would see an empty database.
    pub fn connect_lazy(url: &str, max_connections: u32) -> Result<Self> {
        let invalid = |e: sqlx::Error| {
            Error::validation(format!("Invalid database URL '{}': {}", sanitize_url(url), e))
        };

        let pool = if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Pool::Postgres(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(url)
                    .map_err(invalid)?,
            )
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            let url = url.replacen("mariadb://", "mysql://", 1);
            Pool::MySql(
                MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy(&url)
                    .map_err(invalid)?,
            )
        } else if url.starts_with("sqlite:") {
            let options = if is_memory_sqlite(url) {
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                SqlitePoolOptions::new().max_connections(max_connections)
            };
            Pool::Sqlite(options.connect_lazy(url).map_err(invalid)?)
        } else {
            return Err(Error::validation(format!(
                "Unsupported database URL scheme: {}",
                sanitize_url(url)
            )));
        };

        log::debug!("Created lazy pool for {}", sanitize_url(url));

        Ok(Self {
            pool,
            models: RwLock::new(IndexMap::new()),
        })
    }

    /// Wrap an existing PostgreSQL pool
    pub fn from_pg_pool(pool: PgPool) -> Self {
        Self::from_pool(Pool::Postgres(pool))
    }

    /// Wrap an existing MySQL pool
    pub fn from_mysql_pool(pool: MySqlPool) -> Self {
        Self::from_pool(Pool::MySql(pool))
    }

    /// Wrap an existing SQLite pool
    pub fn from_sqlite_pool(pool: SqlitePool) -> Self {
        Self::from_pool(Pool::Sqlite(pool))
    }

    fn from_pool(pool: Pool) -> Self {
        Self {
            pool,
            models: RwLock::new(IndexMap::new()),
        }
    }

    /// Get the backend type
    pub fn backend(&self) -> DatabaseBackend {
        match &self.pool {
            Pool::Postgres(_) => DatabaseBackend::Postgres,
            Pool::MySql(_) => DatabaseBackend::MySQL,
            Pool::Sqlite(_) => DatabaseBackend::SQLite,
        }
    }

    /// Get the PostgreSQL pool if this is a Postgres connection
    pub fn pg_pool(&self) -> Option<&PgPool> {
        match &self.pool {
            Pool::Postgres(pool) => Some(pool),
            _ => None,
        }
    }

    /// Get the MySQL pool if this is a MySQL connection
    pub fn mysql_pool(&self) -> Option<&MySqlPool> {
        match &self.pool {
            Pool::MySql(pool) => Some(pool),
            _ => None,
        }
    }

    /// Get the SQLite pool if this is a SQLite connection
    pub fn sqlite_pool(&self) -> Option<&SqlitePool> {
        match &self.pool {
            Pool::Sqlite(pool) => Some(pool),
            _ => None,
        }
    }

    /// Models imported so far, in import order
    pub async fn definitions(&self) -> Vec<Arc<ModelDefinition>> {
        self.models.read().await.values().cloned().collect()
    }

    /// Execute a statement that returns no rows
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        log::debug!("{:?} EXECUTE: {}", self.backend(), sql);

        let result = match &self.pool {
            Pool::Postgres(pool) => sqlx::query(sql).execute(pool).await.map(|r| r.rows_affected()),
            Pool::MySql(pool) => sqlx::query(sql).execute(pool).await.map(|r| r.rows_affected()),
            Pool::Sqlite(pool) => sqlx::query(sql).execute(pool).await.map(|r| r.rows_affected()),
        };

        result.map_err(|e| Error::database_query(format!("{:?} execute failed: {}", self.backend(), e)))
    }
}

#[async_trait]
impl Driver for SqlxDriver {
    async fn authenticate(&self) -> Result<()> {
        self.execute("SELECT 1").await.map(|_| ())
    }

    async fn import(&self, path: &Path) -> Result<Arc<dyn Model>> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::model_load(format!("Failed to read model file '{}': {}", path.display(), e))
        })?;

        let definition = ModelDefinition::from_yaml(&content).map_err(|e| {
            Error::model_load(format!("Invalid model file '{}': {}", path.display(), e))
        })?;
        let definition = Arc::new(definition);

        let mut models = self.models.write().await;
        if models.contains_key(&definition.name) {
            return Err(Error::model_load(format!(
                "Model '{}' from '{}' is already imported",
                definition.name,
                path.display()
            )));
        }
        models.insert(definition.name.clone(), Arc::clone(&definition));

        Ok(definition as Arc<dyn Model>)
    }

    async fn discard_models(&self) {
        let mut models = self.models.write().await;
        log::debug!("Discarding {} imported model(s)", models.len());
        models.clear();
    }

    async fn sync(&self, options: SyncOptions) -> Result<()> {
        let backend = self.backend();
        let ordered = dialect::creation_order(&self.definitions().await);

        if options.force {
            for model in ordered.iter().rev() {
                self.execute(&backend.drop_table_sql(model))
                    .await
                    .map_err(|e| Error::sync(format!("Dropping '{}': {}", model.name, e)))?;
            }
        }

        for model in &ordered {
            self.execute(&backend.create_table_sql(model))
                .await
                .map_err(|e| Error::sync(format!("Creating '{}': {}", model.name, e)))?;
        }

        log::debug!("Synchronized {} model(s) on {:?}", ordered.len(), backend);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn is_memory_sqlite(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains(":memory:") || url.contains("mode=memory")
}

/// Mask the password of a connection URL before logging it
pub(crate) fn sanitize_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut sanitized = parsed.clone();
        if sanitized.password().is_some() {
            let _ = sanitized.set_password(Some("***"));
        }
        sanitized.to_string()
    } else {
        "[invalid URL]".to_string()
    }
}
