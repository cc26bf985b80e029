mod common;

use common::init_logging;
use rustf_databases::prelude::*;
use rustf_databases::sqlx_driver::{ModelDefinition, RelationKind};
use std::fs;
use tempfile::TempDir;

const USER: &str = r#"
name: User
table: users
fields:
  id: { type: integer, primary_key: true, auto: true }
  email: { type: string, length: 120, unique: true, nullable: false }
  active: { type: boolean, default: true }
relations:
  - kind: has_many
    model: Post
"#;

const POST: &str = r#"
name: Post
table: posts
fields:
  id: { type: integer, primary_key: true, auto: true }
  user_id: { type: integer, nullable: false }
  title: { type: string }
  body: { type: text }
relations:
  - kind: belongs_to
    model: User
"#;

fn model_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("post.yaml"), POST).unwrap();
    fs::write(dir.path().join("user.yaml"), USER).unwrap();
    dir
}

fn yaml_pattern(dir: &TempDir) -> String {
    format!("{}/*.yaml", dir.path().display())
}

async fn table_exists(driver: &SqlxDriver, table: &str) -> bool {
    let pool = driver.sqlite_pool().unwrap();
    sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
    )
    .bind(table)
    .fetch_optional(pool)
    .await
    .unwrap()
    .is_some()
}

async fn count_rows(driver: &SqlxDriver, table: &str) -> i64 {
    let pool = driver.sqlite_pool().unwrap();
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM \"{}\"", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_register_and_sync_sqlite_models() {
    init_logging();
    let dir = model_dir();
    let synced = Arc::new(SqlxDriver::connect_lazy("sqlite::memory:", 5).unwrap());
    let plain = Arc::new(SqlxDriver::connect_lazy("sqlite::memory:", 5).unwrap());

    let plugin = DatabasesPlugin::register(vec![
        DatabaseOptions::new("main", synced.clone())
            .models([yaml_pattern(&dir)])
            .sync(true)
            .debug(true),
        DatabaseOptions::new("scratch", plain.clone()).models([yaml_pattern(&dir)]),
    ])
    .await
    .unwrap();

    assert!(table_exists(&synced, "users").await);
    assert!(table_exists(&synced, "posts").await);
    assert!(!table_exists(&plain, "users").await);

    let main = plugin.accessor().get_db(None).unwrap().unwrap();
    assert_eq!(main.name(), "main");
    assert_eq!(main.model_names(), vec!["Post", "User"]);

    let post = main.model_as::<ModelDefinition>("Post").unwrap();
    let author = post.association("User").unwrap();
    assert_eq!(author.kind, RelationKind::BelongsTo);
    assert_eq!(author.table, "users");
    assert_eq!(author.foreign_key, "user_id");

    let driver = main.driver_as::<SqlxDriver>().unwrap();
    assert_eq!(driver.backend(), DatabaseBackend::SQLite);
}

#[tokio::test]
async fn test_force_sync_recreates_tables() {
    let dir = model_dir();
    let driver = Arc::new(SqlxDriver::connect_lazy("sqlite::memory:", 1).unwrap());

    DatabasesPlugin::register(
        DatabaseOptions::new("main", driver.clone())
            .models([yaml_pattern(&dir)])
            .sync(true),
    )
    .await
    .unwrap();

    driver
        .execute("INSERT INTO users (email) VALUES ('ada@example.com')")
        .await
        .unwrap();
    assert_eq!(count_rows(&driver, "users").await, 1);

    // additive sync keeps existing rows
    driver.sync(SyncOptions { force: false }).await.unwrap();
    assert_eq!(count_rows(&driver, "users").await, 1);

    driver.sync(SyncOptions { force: true }).await.unwrap();
    assert_eq!(count_rows(&driver, "users").await, 0);
    assert!(table_exists(&driver, "posts").await);
}

#[tokio::test]
async fn test_authentication_failure_names_database() {
    let driver = SqlxDriver::connect_lazy("sqlite:///nonexistent-dir/rustf-databases/app.db", 1)
        .unwrap();

    let result = DatabasesPlugin::register(DatabaseOptions::new("broken", Arc::new(driver))).await;

    match result {
        Err(Error::DatabaseConnection { name, .. }) => assert_eq!(name, "broken"),
        other => panic!("expected connection error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_invalid_model_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.yaml"), "name: Bad\nfields: [1, 2]\n").unwrap();
    let driver = Arc::new(SqlxDriver::connect_lazy("sqlite::memory:", 1).unwrap());

    let result = DatabasesPlugin::register(
        DatabaseOptions::new("main", driver).models([yaml_pattern(&dir)]),
    )
    .await;

    match result {
        Err(Error::ModelLoad(msg)) => assert!(msg.contains("bad.yaml")),
        other => panic!("expected model load error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_from_settings() {
    let dir = model_dir();
    let settings = DatabasesSettings::from_toml_str(&format!(
        r#"
        [[databases]]
        name = "main"
        url = "sqlite::memory:"
        models = ["{}"]
        sync = true

        [[databases]]
        name = "cache"
        url = "sqlite::memory:"
        "#,
        yaml_pattern(&dir)
    ))
    .unwrap();

    let plugin = DatabasesPlugin::from_settings(settings).await.unwrap();
    let stats = plugin.registry().stats();
    assert_eq!(stats.total_databases, 2);
    assert_eq!(stats.default_database.as_deref(), Some("main"));

    let main = plugin.accessor().database("main").unwrap();
    let driver = main.driver_as::<SqlxDriver>().unwrap();
    assert!(table_exists(driver, "users").await);

    let cache = plugin.accessor().database("cache").unwrap();
    assert!(cache.models().is_empty());
}

#[tokio::test]
async fn test_failed_load_leaves_nothing_to_sync() {
    let dir = model_dir();
    fs::write(dir.path().join("zz_bad.yaml"), "name: Bad\nfields: [1, 2]\n").unwrap();
    let driver = Arc::new(SqlxDriver::connect_lazy("sqlite::memory:", 1).unwrap());

    let result = DatabasesPlugin::register(
        DatabaseOptions::new("main", driver.clone()).models([yaml_pattern(&dir)]),
    )
    .await;
    assert!(matches!(result, Err(Error::ModelLoad(_))));

    // post.yaml and user.yaml were imported before the failure
    assert!(driver.definitions().await.is_empty());

    driver.sync(SyncOptions::default()).await.unwrap();
    assert!(!table_exists(&driver, "users").await);
    assert!(!table_exists(&driver, "posts").await);
}
