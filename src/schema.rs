//! Plugin option validation
//!
//! Options are checked as a whole before any driver method runs, so a
//! malformed entry anywhere in the list rejects the entire registration.

use crate::config::{DatabaseOptions, PluginOptions};
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Validate and normalize plugin options into an ordered list
pub fn validate(options: impl Into<PluginOptions>) -> Result<Vec<DatabaseOptions>> {
    let list = options.into().into_list();

    if list.is_empty() {
        return Err(Error::validation("Missing database plugin options"));
    }

    let mut seen = HashSet::with_capacity(list.len());
    for (index, entry) in list.iter().enumerate() {
        validate_entry(index, entry)?;

        if !seen.insert(entry.name.as_str()) {
            return Err(Error::validation(format!(
                "[{}].name \"{}\" is duplicated, database names must be unique",
                index, entry.name
            )));
        }
    }

    Ok(list)
}

fn validate_entry(index: usize, entry: &DatabaseOptions) -> Result<()> {
    if entry.name.trim().is_empty() {
        return Err(Error::validation(format!(
            "[{}].name is required and must not be empty",
            index
        )));
    }

    for (position, pattern) in entry.models.iter().enumerate() {
        if pattern.trim().is_empty() {
            return Err(Error::validation(format!(
                "[{}].models[{}] must not be empty",
                index, position
            )));
        }

        glob::Pattern::new(pattern).map_err(|e| {
            Error::validation(format!(
                "[{}].models[{}] \"{}\" is not a valid glob pattern: {}",
                index, position, pattern, e
            ))
        })?;
    }

    Ok(())
}
