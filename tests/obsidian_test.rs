use std::fs;

use atomizer::adapters::{ObsidianAdapter, SourceAdapter};
use atomizer::config::MigrateConfig;
use atomizer::types::{MigrationStats, ScanOutput, SourceKind};
use tempfile::TempDir;

/// Enough filler to clear the vault's 30-word minimum.
fn filler() -> String {
    "word ".repeat(40)
}

fn scan(dir: &TempDir, config: &MigrateConfig, stats: &mut MigrationStats) -> ScanOutput {
    ObsidianAdapter
        .scan(dir.path(), config, stats)
        .expect("failed to scan vault")
}

#[test]
fn test_frontmatter_fields_parsed() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!(
        "---\ntitle: Deep Work Notes\ncreated: 2026-01-10\ntags:\n  - focus\n  - Deep Work\nauthor: casey\nstatus: draft\n---\n\n{}",
        filler()
    );
    fs::write(dir.path().join("Deep Work.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(output.documents.len(), 1);
    let doc = &output.documents[0];
    assert_eq!(doc.title, "Deep Work Notes");
    assert_eq!(
        doc.created.map(|d| d.format("%Y-%m-%d").to_string()),
        Some("2026-01-10".to_string())
    );
    assert_eq!(doc.updated, None, "frontmatter dates leave updated unset");
    assert!(doc.tags.contains("focus"));
    assert!(doc.tags.contains("deep-work"));
    assert_eq!(doc.source_id.as_deref(), Some("deep work"));
    assert!(doc.preserved.contains_key("author"));
    assert!(doc.preserved.contains_key("status"));
    assert!(!doc.preserved.contains_key("tags"));
    assert!(!doc.body.contains("---"), "frontmatter should be split off");
}

#[test]
fn test_comma_string_tags() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!("---\ntags: focus, deep work\n---\n\n{}", filler());
    fs::write(dir.path().join("Note.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    let doc = &output.documents[0];
    assert!(doc.tags.contains("focus"));
    assert!(doc.tags.contains("deep-work"));
}

#[test]
fn test_inline_tags_collected() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!("{} #gardening and #winter-prep", filler());
    fs::write(dir.path().join("Garden.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    let doc = &output.documents[0];
    assert!(doc.tags.contains("gardening"));
    assert!(doc.tags.contains("winter-prep"));
}

#[test]
fn test_title_falls_back_to_stem() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("Evergreen Thought.md"), filler()).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    let doc = &output.documents[0];
    assert_eq!(doc.title, "Evergreen Thought");
    assert_eq!(doc.source_id.as_deref(), Some("evergreen thought"));
}

#[test]
fn test_date_key_overrides_created() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!(
        "---\ncreated: 2026-01-10\ndate: 2026-02-14\n---\n\n{}",
        filler()
    );
    fs::write(dir.path().join("Note.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(
        output.documents[0]
            .created
            .map(|d| d.format("%Y-%m-%d").to_string()),
        Some("2026-02-14".to_string())
    );
}

#[test]
fn test_datetime_frontmatter_forms() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(
        dir.path().join("A.md"),
        format!("---\ncreated: 2026-01-10T09:30:00Z\n---\n\n{}", filler()),
    )
    .expect("failed to write note");
    fs::write(
        dir.path().join("B.md"),
        format!("---\ncreated: 2026-01-11 09:30:00\n---\n\n{}", filler()),
    )
    .expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    let format = |i: usize| {
        output.documents[i]
            .created
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
    };
    assert_eq!(format(0), Some("2026-01-10 09:30".to_string()));
    assert_eq!(format(1), Some("2026-01-11 09:30".to_string()));
}

#[test]
fn test_fs_timestamps_when_frontmatter_has_none() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("Note.md"), filler()).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);
    assert!(output.documents[0].created.is_some());
    assert!(output.documents[0].updated.is_some());

    let mut config = MigrateConfig::for_source(SourceKind::Obsidian);
    config.preserve_dates = false;
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);
    assert_eq!(output.documents[0].created, None);
}

#[test]
fn test_daily_notes_skipped() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("2026-01-10.md"), filler()).expect("failed to write note");
    fs::write(dir.path().join("01-15-2026.md"), filler()).expect("failed to write note");
    fs::write(
        dir.path().join("Morning Pages.md"),
        format!("## Journal\n\n{}", filler()),
    )
    .expect("failed to write note");
    fs::write(dir.path().join("Keeper.md"), filler()).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.documents[0].title, "Keeper");
    assert_eq!(stats.skipped, 3);
}

#[test]
fn test_daily_notes_kept_when_filter_disabled() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("2026-01-10.md"), filler()).expect("failed to write note");

    let mut config = MigrateConfig::for_source(SourceKind::Obsidian);
    config.filter.exclude_date_like = false;
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(output.documents.len(), 1);
}

#[test]
fn test_attachment_dirs_not_scanned() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let attachments = dir.path().join("attachments");
    fs::create_dir(&attachments).expect("failed to create dir");
    fs::write(attachments.join("stray.md"), filler()).expect("failed to write note");
    fs::write(dir.path().join("Real Note.md"), filler()).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(output.documents.len(), 1);
    assert_eq!(output.documents[0].title, "Real Note");
    assert_eq!(stats.total_scanned, 1);
}

#[test]
fn test_malformed_frontmatter_becomes_body() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!("---\ntitle: [unclosed\n---\n\n{}", filler());
    fs::write(dir.path().join("Odd.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    assert_eq!(output.documents.len(), 1, "bad yaml is not an error");
    let doc = &output.documents[0];
    assert_eq!(doc.title, "Odd", "title falls back to the stem");
    assert!(doc.body.starts_with("---\ntitle:"), "the block stays in the body");
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_empty_frontmatter_block() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let content = format!("---\n---\n\n{}", filler());
    fs::write(dir.path().join("Bare.md"), content).expect("failed to write note");

    let config = MigrateConfig::for_source(SourceKind::Obsidian);
    let mut stats = MigrationStats::default();
    let output = scan(&dir, &config, &mut stats);

    let doc = &output.documents[0];
    assert_eq!(doc.title, "Bare");
    assert!(!doc.body.starts_with("---"));
}

#[test]
fn test_assets_from_attachment_dirs_only() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let attachments = dir.path().join("attachments");
    let assets_dir = dir.path().join("assets");
    fs::create_dir(&attachments).expect("failed to create dir");
    fs::create_dir(&assets_dir).expect("failed to create dir");
    fs::write(attachments.join("diagram.png"), [0x89, 0x50]).expect("failed to write asset");
    fs::write(attachments.join("song.mp3"), [0x00]).expect("failed to write asset");
    fs::write(attachments.join("readme.txt"), "text").expect("failed to write file");
    fs::write(assets_dir.join("logo.svg"), "<svg/>").expect("failed to write asset");
    fs::write(dir.path().join("loose.png"), [0x89]).expect("failed to write file");

    let assets = ObsidianAdapter.assets(dir.path());
    let names: Vec<_> = assets
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(assets.len(), 3, "got: {:?}", names);
    assert!(names.contains(&"diagram.png".to_string()));
    assert!(names.contains(&"song.mp3".to_string()));
    assert!(names.contains(&"logo.svg".to_string()));
    assert!(
        !names.contains(&"loose.png".to_string()),
        "files outside attachment dirs are left alone"
    );
}
