//! Model file discovery and loading
//!
//! Glob patterns are expanded into a deduplicated file list, every file is
//! imported through the database's driver, and finally each model gets a
//! single chance to declare relations against the others.

use crate::driver::{Driver, ModelMap};
use crate::error::{Error, Result};
use indexmap::IndexSet;
use std::path::PathBuf;

/// Expand glob patterns into model files, keeping first-seen order
pub fn get_files(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = IndexSet::new();

    for pattern in patterns {
        let entries = glob::glob(pattern).map_err(|e| {
            Error::model_load(format!("Invalid model pattern '{}': {}", pattern, e))
        })?;

        for entry in entries {
            let path = entry.map_err(|e| {
                Error::model_load(format!(
                    "Failed to read '{}' while expanding '{}': {}",
                    e.path().display(),
                    pattern,
                    e.error()
                ))
            })?;

            if path.is_file() {
                files.insert(path);
            }
        }
    }

    log::debug!("Resolved {} model file(s) from {:?}", files.len(), patterns);
    Ok(files.into_iter().collect())
}

/// Import every file through the driver.
///
/// The first failing import aborts the whole load; driver errors are
/// returned as they are.
pub async fn load(files: &[PathBuf], driver: &dyn Driver) -> Result<ModelMap> {
    let mut models = ModelMap::with_capacity(files.len());

    for path in files {
        let model = driver.import(path).await?;
        let name = model.name().to_string();

        if models.contains_key(&name) {
            return Err(Error::model_load(format!(
                "Model '{}' from '{}' is already defined",
                name,
                path.display()
            )));
        }

        log::debug!("Loaded model '{}' from {}", name, path.display());
        models.insert(name, model);
    }

    Ok(models)
}

/// Let every model declare its relations against the full model map
pub fn apply_relations(models: ModelMap) -> Result<ModelMap> {
    for model in models.values() {
        model.associate(&models)?;
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "name: x\n").unwrap();
        path
    }

    fn pattern(dir: &TempDir, tail: &str) -> String {
        format!("{}/{}", dir.path().display(), tail)
    }

    #[test]
    fn test_get_files_deduplicates() {
        let dir = TempDir::new().unwrap();
        let users = touch(&dir, "users.yaml");
        let posts = touch(&dir, "posts.yaml");

        let files = get_files(&[
            pattern(&dir, "users.yaml"),
            pattern(&dir, "*.yaml"),
        ])
        .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0], users);
        assert!(files.contains(&posts));
    }

    #[test]
    fn test_get_files_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested.yaml")).unwrap();
        let file = touch(&dir, "nested.yaml/users.yaml");

        let files = get_files(&[pattern(&dir, "**/*.yaml")]).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_get_files_no_match() {
        let dir = TempDir::new().unwrap();
        let files = get_files(&[pattern(&dir, "*.yaml")]).unwrap();
        assert!(files.is_empty());
    }
}
