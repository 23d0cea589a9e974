use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;
use tidy_fs::{ConfigFormat, ConfigStore, Error, NormalizedPath};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Rules {
    quarantine_dir: String,
    max_actions: usize,
}

#[rstest]
#[case("rules.toml", "quarantine_dir = \"Q\"\nmax_actions = 5\n")]
#[case("rules.json", r#"{"quarantine_dir": "Q", "max_actions": 5}"#)]
#[case("rules.yaml", "quarantine_dir: Q\nmax_actions: 5\n")]
#[case("rules.YML", "quarantine_dir: Q\nmax_actions: 5\n")]
fn test_load_each_format(#[case] name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join(name);
    fs::write(&file_path, content).unwrap();

    let loaded: Rules = ConfigStore::new()
        .load(&NormalizedPath::new(&file_path))
        .unwrap();

    assert_eq!(
        loaded,
        Rules {
            quarantine_dir: "Q".into(),
            max_actions: 5
        }
    );
}

#[test]
fn test_save_then_load_json() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("plans/plan.json"));
    let rules = Rules {
        quarantine_dir: "99_QUARANTINE".into(),
        max_actions: 200,
    };

    let store = ConfigStore::new();
    store.save(&path, &rules).unwrap();

    let raw = fs::read_to_string(path.to_native()).unwrap();
    assert!(raw.contains("\"max_actions\": 200"));
    assert_eq!(store.load::<Rules>(&path).unwrap(), rules);
}

#[test]
fn test_malformed_content_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("plan.json");
    fs::write(&file_path, "{ not json").unwrap();

    let result: Result<Rules, _> = ConfigStore::new().load(&NormalizedPath::new(&file_path));

    match result {
        Err(Error::ConfigParse { format, .. }) => assert_eq!(format, "JSON"),
        other => panic!("expected ConfigParse, got {:?}", other),
    }
}

#[test]
fn test_unknown_extension_is_rejected() {
    let path = NormalizedPath::new("rules.ini");
    assert!(matches!(
        ConfigFormat::from_path(&path),
        Err(Error::UnsupportedFormat { .. })
    ));
}
