use atomizer::config::{should_include_file, MigrateConfig, CORPUS_DIR};
use atomizer::types::SourceKind;

#[test]
fn test_source_defaults() {
    let notion = MigrateConfig::for_source(SourceKind::Notion);
    assert_eq!(notion.filter.min_word_count, 50);
    assert_eq!(notion.tag_prefix, "notion-migrated");
    assert!(notion.filter.exclude_date_like);
    assert!(notion.preserve_dates);
    assert!(!notion.dry_run);

    let roam = MigrateConfig::for_source(SourceKind::Roam);
    assert_eq!(roam.filter.min_word_count, 50);
    assert_eq!(roam.flatten_depth, 2);

    let obsidian = MigrateConfig::for_source(SourceKind::Obsidian);
    assert_eq!(
        obsidian.filter.min_word_count, 30,
        "vault notes are short, the threshold should be lower"
    );
    assert_eq!(obsidian.tag_prefix, "obsidian-migrated");
}

#[test]
fn test_include_patterns_select_markdown() {
    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    assert!(should_include_file("idea.md", &config));
    assert!(should_include_file("notes/idea.md", &config));
    assert!(should_include_file("a/b/c/idea.md", &config));
    assert!(!should_include_file("notes/photo.png", &config));
    assert!(!should_include_file("notes/export.csv", &config));
}

#[test]
fn test_exclude_patterns_take_precedence() {
    let mut config = MigrateConfig::for_source(SourceKind::Notion);
    config.exclude.push("archive/**".to_string());

    assert!(!should_include_file("archive/old.md", &config));
    assert!(should_include_file("current/new.md", &config));
}

#[test]
fn test_invalid_pattern_is_ignored() {
    let mut config = MigrateConfig::for_source(SourceKind::Notion);
    config.exclude.push("[".to_string());

    assert!(should_include_file("notes/idea.md", &config));
}

#[test]
fn test_no_include_patterns_matches_nothing() {
    let mut config = MigrateConfig::for_source(SourceKind::Notion);
    config.include.clear();

    assert!(!should_include_file("notes/idea.md", &config));
}

#[test]
fn test_config_serde_roundtrip() {
    let mut config = MigrateConfig::for_source(SourceKind::Roam);
    config.org_name = "acme".to_string();
    config
        .filter
        .exclude_types
        .insert("reference".to_string());

    let json = serde_json::to_string(&config).expect("failed to serialize config");
    let back: MigrateConfig = serde_json::from_str(&json).expect("failed to deserialize config");
    assert_eq!(config, back);
}

#[test]
fn test_corpus_dir_name() {
    assert_eq!(CORPUS_DIR, "context-library");
}
