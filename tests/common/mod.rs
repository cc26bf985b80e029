#![allow(dead_code)]

use async_trait::async_trait;
use rustf_databases::{Driver, Error, Model, ModelMap, Result, SyncOptions};
use std::any::Any;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Shared call journal, so ordering can be checked across drivers and models
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Driver that records every call and can be told to fail
#[derive(Default)]
pub struct MockDriver {
    pub label: String,
    pub journal: Journal,
    pub fail_authenticate: bool,
    pub fail_sync: bool,
    pub delay: Option<Duration>,
    pub authenticate_calls: AtomicUsize,
    pub import_calls: AtomicUsize,
    pub sync_calls: AtomicUsize,
    pub discard_calls: AtomicUsize,
    pub last_sync: Mutex<Option<SyncOptions>>,
}

impl MockDriver {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub fn failing_authenticate(mut self) -> Self {
        self.fail_authenticate = true;
        self
    }

    pub fn failing_sync(mut self) -> Self {
        self.fail_sync = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn total_calls(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
            + self.import_calls.load(Ordering::SeqCst)
            + self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn synced(&self) -> bool {
        self.sync_calls.load(Ordering::SeqCst) > 0
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn authenticate(&self) -> Result<()> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.journal.record(format!("{}:authenticate", self.label));

        if self.fail_authenticate {
            Err(Error::database_query("connection refused"))
        } else {
            Ok(())
        }
    }

    async fn import(&self, path: &Path) -> Result<Arc<dyn Model>> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);

        let content = tokio::fs::read_to_string(path).await?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        self.journal.record(format!("{}:import:{}", self.label, name));

        if content.trim() == "broken" {
            return Err(Error::model_load(format!("cannot import {}", name)));
        }

        let references = content
            .lines()
            .filter_map(|line| line.strip_prefix("references "))
            .map(str::to_string)
            .collect();

        Ok(Arc::new(MockModel {
            name,
            references,
            journal: self.journal.clone(),
            seen: Mutex::new(Vec::new()),
            associate_calls: AtomicUsize::new(0),
        }))
    }

    async fn discard_models(&self) {
        self.discard_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("{}:discard", self.label));
    }

    async fn sync(&self, options: SyncOptions) -> Result<()> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sync.lock().unwrap() = Some(options);
        self.journal
            .record(format!("{}:sync:force={}", self.label, options.force));

        if self.fail_sync {
            Err(Error::sync("table already exists"))
        } else {
            Ok(())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Model named after its file; `references X` lines must resolve on associate
pub struct MockModel {
    pub name: String,
    pub references: Vec<String>,
    journal: Journal,
    /// Model names visible when associate ran
    pub seen: Mutex<Vec<String>>,
    pub associate_calls: AtomicUsize,
}

impl Model for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn associate(&self, models: &ModelMap) -> Result<()> {
        self.associate_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("associate:{}", self.name));
        *self.seen.lock().unwrap() = models.keys().cloned().collect();

        for reference in &self.references {
            if !models.contains_key(reference) {
                return Err(Error::model_load(format!(
                    "{} references unknown model {}",
                    self.name, reference
                )));
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
