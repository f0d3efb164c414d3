use std::fs;

use stacker_content::{ContentBundle, ContentFactory};
use stacker_core::{EntityKind, MessageSource, SettingsProvider};
use stacker_core::env::STACK_DISPLAY;

#[test]
fn empty_directory_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = ContentFactory::new(dir.path()).load_bundle().unwrap();
    let defaults = ContentBundle::defaults().unwrap();

    assert_eq!(bundle.config, defaults.config);
    assert_eq!(bundle.settings.len(), defaults.settings.len());
}

#[test]
fn files_in_directory_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[loot]\napproximation_threshold = 10\napproximation_amount = 5\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("entity_settings.ron"),
        r#"[(kind: zombie, display_name: "Walker", max_stack_size: 4)]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("locale.toml"),
        r#"entity-stack-display = "%name% x%amount%""#,
    )
    .unwrap();

    let bundle = ContentFactory::new(dir.path()).load_bundle().unwrap();

    assert_eq!(bundle.config.loot.approximation_threshold, 10);
    assert_eq!(bundle.settings.len(), 1);
    let zombie = bundle.settings.settings(EntityKind::Zombie).unwrap();
    assert_eq!(zombie.display_name, "Walker");
    assert_eq!(zombie.max_stack_size, 4);
    assert_eq!(
        bundle
            .messages
            .message(STACK_DISPLAY, &[("amount", "3"), ("name", "Walker")]),
        "Walker x3"
    );
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("entity_settings.ron"), "[(kind: dragon)]").unwrap();

    let err = ContentFactory::new(dir.path()).load_settings().unwrap_err();
    assert!(err.to_string().contains("entity_settings.ron"));
}
