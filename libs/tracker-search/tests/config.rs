#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use figment::Figment;
use figment::providers::{Format, Yaml};
use tracker_search::{ConfigError, SearchConfig};

#[test]
fn loads_search_section_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "server:\n  port: 8080\nsearch:\n  default_page_size: 40\n  max_page_size: 200\n"
    )
    .unwrap();

    let cfg = SearchConfig::load(Some(file.path())).unwrap();
    assert_eq!(cfg.default_page_size, 40);
    assert_eq!(cfg.max_page_size, 200);
    assert_eq!(cfg.max_order_fields, 5);
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SearchConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(cfg, SearchConfig::default());
}

#[test]
fn wrong_types_are_reported() {
    let figment = Figment::new().merge(Yaml::string("search:\n  max_page_size: lots\n"));
    let err = SearchConfig::from_figment(figment).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
    assert!(err.to_string().contains("max_page_size"), "{err}");
}
