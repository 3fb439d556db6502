#![allow(clippy::unwrap_used)]

use std::path::Path;

use collectra_config::{
    Config, ConfigError, DataSourceConfig, build_manager, load_collections, load_config_from, save_config_to,
};
use collectra_core::CoreError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

const MAIN_JSON: &str = r#"[
  {
    "name": "users",
    "title": "Users",
    "fields": [
      { "name": "nickname", "type": "string", "interface": "input" },
      { "name": "roles", "type": "belongsToMany", "target": "roles", "interface": "m2m" }
    ]
  },
  { "name": "roles", "fields": [{ "name": "title", "type": "string" }] }
]"#;

const CRM_YAML: &str = "
- name: accounts
  title: Accounts
  fields:
    - name: owner
      type: belongsTo
      target: users
      targetDataSource: main
";

// ── Config file ─────────────────────────────────────────────────────

#[test]
fn config_loads_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "config.toml",
        r#"
reload_interval_secs = 30

[defaults]
output = "json"

[data_sources.crm]
display_name = "CRM"
collections = ["collections/crm.yaml"]
"#,
    );

    let cfg = load_config_from(&path).unwrap();

    assert_eq!(cfg.default_data_source, "main");
    assert_eq!(cfg.reload_interval_secs, 30);
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.color, "auto");
    assert_eq!(cfg.data_sources["crm"].display_name.as_deref(), Some("CRM"));
}

#[test]
fn missing_config_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn non_main_default_data_source_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "config.toml", "default_data_source = \"crm\"\n");
    assert!(matches!(load_config_from(&path), Err(ConfigError::Validation { .. })));
}

#[test]
fn saved_config_reads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut cfg = Config::default();
    cfg.data_sources.insert(
        "main".into(),
        DataSourceConfig {
            display_name: Some("Main".into()),
            collections: vec!["collections/main.json".into()],
        },
    );

    save_config_to(&cfg, &path).unwrap();

    assert_eq!(load_config_from(&path).unwrap(), cfg);
}

// ── Collection files ────────────────────────────────────────────────

#[test]
fn json_and_yaml_collection_files_parse() {
    let dir = TempDir::new().unwrap();
    let main = load_collections(&write(dir.path(), "main.json", MAIN_JSON)).unwrap();
    let crm = load_collections(&write(dir.path(), "crm.yml", CRM_YAML)).unwrap();

    let names: Vec<&str> = main.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["users", "roles"]);
    assert_eq!(main[0].fields[1].target.as_deref(), Some("roles"));
    assert_eq!(crm[0].fields[0].target_data_source.as_deref(), Some("main"));
}

#[test]
fn unknown_extension_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "main.txt", MAIN_JSON);
    assert!(matches!(load_collections(&path), Err(ConfigError::UnsupportedFormat { .. })));
}

#[test]
fn nameless_collection_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "main.json", r#"[{ "name": "", "title": "No name" }]"#);
    let err = load_collections(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Core(CoreError::InvalidOptions { .. })));
}

#[test]
fn malformed_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "main.json", "[{");
    let err = load_collections(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("main.json"));
}

// ── Manager assembly ────────────────────────────────────────────────

fn two_source_config() -> Config {
    let mut cfg = Config::default();
    cfg.data_sources.insert(
        "main".into(),
        DataSourceConfig {
            display_name: Some("Main".into()),
            collections: vec!["collections/main.json".into()],
        },
    );
    cfg.data_sources.insert(
        "crm".into(),
        DataSourceConfig {
            display_name: Some("CRM".into()),
            collections: vec!["collections/crm.yaml".into()],
        },
    );
    cfg
}

#[test]
fn build_manager_loads_every_data_source() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "collections/main.json", MAIN_JSON);
    write(dir.path(), "collections/crm.yaml", CRM_YAML);

    let manager = build_manager(&two_source_config(), dir.path()).unwrap();

    assert_eq!(manager.main().display_name(), "Main");
    assert_eq!(manager.get_collections(None).len(), 2);
    assert_eq!(
        manager.get_data_source(Some("crm")).unwrap().display_name(),
        "CRM"
    );
    let owner = manager.get_collection("accounts.owner", Some("crm")).unwrap();
    assert_eq!(owner.name(), "users");
    assert_eq!(owner.data_source_key(), "main");
}

#[tokio::test]
async fn reload_all_rereads_collection_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "collections/main.json", MAIN_JSON);
    write(dir.path(), "collections/crm.yaml", CRM_YAML);
    let manager = build_manager(&two_source_config(), dir.path()).unwrap();

    write(dir.path(), "collections/main.json", r#"[{ "name": "posts" }]"#);
    write(dir.path(), "collections/crm.yaml", "- name: leads\n");
    let mut reloaded = manager.reload_all().await.unwrap();
    reloaded.sort();

    assert_eq!(reloaded, vec!["crm", "main"]);
    let main: Vec<String> = manager
        .get_collections(None)
        .iter()
        .map(|c| c.name().to_owned())
        .collect();
    assert_eq!(main, vec!["posts"]);
    assert!(manager.get_collection("leads", Some("crm")).is_some());
    assert!(manager.get_collection("accounts", Some("crm")).is_none());
}

#[tokio::test]
async fn broken_file_fails_reload_without_touching_state() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "collections/main.json", MAIN_JSON);
    write(dir.path(), "collections/crm.yaml", CRM_YAML);
    let manager = build_manager(&two_source_config(), dir.path()).unwrap();

    write(dir.path(), "collections/main.json", "not json");
    let err = manager.reload_main().await.unwrap_err();

    assert!(matches!(err, CoreError::Provider { .. }));
    assert!(manager.get_collection("users", None).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reloads_run_from_spawned_tasks() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "collections/main.json", MAIN_JSON);
    write(dir.path(), "collections/crm.yaml", CRM_YAML);
    let manager = build_manager(&two_source_config(), dir.path()).unwrap();

    write(dir.path(), "collections/main.json", r#"[{ "name": "posts" }]"#);
    let (main, crm) = (manager.clone(), manager.clone());
    let (main, crm) = tokio::join!(
        tokio::spawn(async move { main.reload_main().await }),
        tokio::spawn(async move { crm.reload_third_data_sources().await }),
    );

    assert_eq!(main.unwrap().unwrap(), vec!["main"]);
    assert_eq!(crm.unwrap().unwrap(), vec!["crm"]);
    assert!(manager.get_collection("posts", None).is_some());
    assert!(manager.get_collection("accounts", Some("crm")).is_some());
}
