//! CLI tests that run the compiled `esync` binary against temporary sync roots.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use sync_fs::NormalizedPath;
use sync_store::EntityStore;
use sync_test_utils::Site;
use tempfile::TempDir;
use uuid::Uuid;

fn esync(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("esync").unwrap();
    cmd.env_remove("ESYNC_STORE")
        .env_remove("ESYNC_CONFIG")
        .env_remove("RUST_LOG")
        .env("ESYNC_ROOT", root)
        .env("NO_COLOR", "1");
    cmd
}

/// A root with a seeded `store.json` and no documents yet.
fn seeded_root() -> TempDir {
    let temp = TempDir::new().unwrap();
    let store = EntityStore::open(NormalizedPath::new(temp.path()).join("store.json")).unwrap();
    Site::seed(&store);
    temp
}

fn entities(root: &Path) -> std::path::PathBuf {
    root.join("usync").join("entities")
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_lists_commands() {
    let temp = TempDir::new().unwrap();
    esync(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("clean-marker"));
}

#[test]
fn no_command_prints_hint() {
    let temp = TempDir::new().unwrap();
    esync(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("esync --help"));
}

#[test]
fn export_writes_one_document_per_item() {
    let temp = seeded_root();

    esync(temp.path())
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export"))
        .stdout(predicate::str::contains("4 item(s)"));

    for name in ["home", "about", "contact", "post"] {
        assert!(entities(temp.path()).join(format!("{name}.config")).is_file(), "{name}");
    }
}

#[test]
fn report_after_export_has_no_changes() {
    let temp = seeded_root();
    esync(temp.path()).arg("export").assert().success();

    let value = json_stdout(esync(temp.path()).args(["report", "--json"]));

    assert_eq!(value["summary"]["total"], 4);
    assert_eq!(value["summary"]["changed"], 0);
    assert_eq!(value["summary"]["failed"], 0);
    assert!(
        value["actions"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a["change"] == "NoChange")
    );
}

#[test]
fn import_into_another_store() {
    let temp = seeded_root();
    esync(temp.path()).arg("export").assert().success();
    let target = temp.path().join("target.json");

    let value = json_stdout(
        esync(temp.path())
            .args(["import", "--json", "--store"])
            .arg(&target),
    );

    assert_eq!(value["summary"]["by_change"]["Create"], 4);
    let store = EntityStore::open(NormalizedPath::new(&target)).unwrap();
    assert!(store.get(Site::ABOUT).is_some());
    assert!(store.get(Site::POST).is_some());
}

#[test]
fn failed_document_exits_non_zero() {
    let temp = seeded_root();
    esync(temp.path()).arg("export").assert().success();
    fs::write(entities(temp.path()).join("broken.config"), "<not a document/>").unwrap();

    esync(temp.path())
        .arg("import")
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken.config"))
        .stderr(predicate::str::contains("item(s) failed"));
}

#[test]
fn export_item_unknown_key_fails() {
    let temp = seeded_root();

    esync(temp.path())
        .args(["export-item", "00000000-0000-0000-0000-00000000ffff"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Item not found"));
}

#[test]
fn export_item_writes_one_file() {
    let temp = seeded_root();

    esync(temp.path())
        .args(["export-item", &Site::CONTACT.to_string()])
        .assert()
        .success();

    assert!(entities(temp.path()).join("contact.config").is_file());
    assert!(!entities(temp.path()).join("home.config").exists());
}

#[test]
fn deps_lists_ancestors_first() {
    let temp = seeded_root();

    let value = json_stdout(esync(temp.path()).args(["deps", &Site::ABOUT.to_string(), "--ancestors", "--json"]));

    let keys: Vec<Uuid> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["key"].as_str().unwrap().parse().unwrap())
        .collect();
    assert_eq!(keys, vec![Site::HOME, Site::ABOUT]);
}

#[test]
fn unknown_handler_is_an_error() {
    let temp = seeded_root();

    esync(temp.path())
        .args(["report", "--handler", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown handler: nope"));
}

#[test]
fn several_handlers_need_a_selection() {
    let temp = seeded_root();
    fs::write(
        temp.path().join("sync.toml"),
        r#"
[[handlers]]
alias = "entityHandler"
name = "Entities"
folder = "entities"
entity_type = "Entity"

[[handlers]]
alias = "mediaHandler"
name = "Media"
folder = "media"
entity_type = "Media"
"#,
    )
    .unwrap();

    esync(temp.path())
        .args(["deps", &Site::HOME.to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--handler"));

    esync(temp.path())
        .args(["deps", &Site::HOME.to_string(), "--handler", "Entity"])
        .assert()
        .success();
}

#[test]
fn clean_marker_removes_items_without_documents() {
    let temp = seeded_root();
    esync(temp.path()).arg("export").assert().success();
    fs::remove_file(entities(temp.path()).join("contact.config")).unwrap();

    esync(temp.path())
        .args(["clean-marker", &Uuid::nil().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("_clean.config"));
    esync(temp.path()).arg("import").assert().success();

    let store = EntityStore::open(NormalizedPath::new(temp.path()).join("store.json")).unwrap();
    assert!(store.get(Site::CONTACT).is_none());
    assert!(store.get(Site::HOME).is_some());
}

#[test]
fn handlers_lists_configured_handlers() {
    let temp = seeded_root();
    fs::write(
        temp.path().join("sync.toml"),
        r#"
[handler_sets.default.handlers.entityHandler]
actions = ["Report", "Export"]
"#,
    )
    .unwrap();

    let value = json_stdout(esync(temp.path()).args(["handlers", "--json"]));

    assert_eq!(value[0]["alias"], "entityHandler");
    assert_eq!(value[0]["actions"], serde_json::json!(["Report", "Export"]));
}

#[test]
fn completions_need_no_workspace() {
    let temp = TempDir::new().unwrap();
    esync(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("esync"));
}
