//! Per-database setup sequence
//!
//! authenticate -> load models -> apply relations -> sync -> handle -> onConnect

use crate::config::DatabaseOptions;
use crate::database::Database;
use crate::driver::{ModelMap, SyncOptions};
use crate::error::{Error, Result};
use crate::models;
use log::Level;
use std::sync::Arc;

/// Run the full setup for one database entry
pub async fn configure(options: &DatabaseOptions) -> Result<Arc<Database>> {
    let name = options.name.as_str();
    let level = if options.debug {
        Level::Info
    } else {
        Level::Debug
    };

    log::log!(level, "[{}] authenticating", name);
    options
        .driver
        .authenticate()
        .await
        .map_err(|e| Error::database_connection(name, e.to_string()))?;

    let models = if options.models.is_empty() {
        ModelMap::new()
    } else {
        let files = models::get_files(&options.models)?;
        log::log!(level, "[{}] loading {} model file(s)", name, files.len());

        let loaded = models::load(&files, options.driver.as_ref())
            .await
            .and_then(models::apply_relations);
        match loaded {
            Ok(map) => map,
            Err(e) => {
                options.driver.discard_models().await;
                return Err(e);
            }
        }
    };

    if options.sync {
        log::log!(
            level,
            "[{}] synchronizing schema (force: {})",
            name,
            options.force_sync
        );
        options
            .driver
            .sync(SyncOptions {
                force: options.force_sync,
            })
            .await?;
    }

    let database = Arc::new(Database::new(
        name,
        Arc::clone(&options.driver),
        models,
    ));

    if let Some(on_connect) = &options.on_connect {
        log::log!(level, "[{}] running onConnect callback", name);
        on_connect.run(&database).await?;
    }

    log::log!(level, "[{}] ready", name);
    Ok(database)
}
