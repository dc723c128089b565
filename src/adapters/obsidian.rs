use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use walkdir::WalkDir;

use crate::classify::classify;
use crate::config::{should_include_file, MigrateConfig};
use crate::errors::{MigrateError, Result};
use crate::types::{Document, MigrationStats, ScanOutput, SourceKind};

use super::{file_timestamps, normalize_tag, passes_filters, SourceAdapter};

/// Vault directories that hold attachments rather than notes.
const ATTACHMENT_DIRS: [&str; 4] = ["attachments", "assets", "images", "files"];

/// Frontmatter keys carried into the migrated note unchanged.
const PRESERVED_KEYS: [&str; 4] = ["aliases", "author", "status", "project"];

const ASSET_EXTENSIONS: [&str; 9] = [
    "png", "jpg", "jpeg", "gif", "svg", "pdf", "webp", "mp3", "mp4",
];

/// Daily-note title shapes.
static DAILY_TITLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"),
        Regex::new(r"^\d{4}\.\d{2}\.\d{2}$").expect("valid regex"),
        Regex::new(r"^\d{2}-\d{2}-\d{4}$").expect("valid regex"),
    ]
});

/// Inline `#tag` occurrences in body text.
static INLINE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)#([a-zA-Z][a-zA-Z0-9_-]*)").expect("valid regex"));

/// Reads an Obsidian vault: markdown with YAML frontmatter and wiki links.
pub struct ObsidianAdapter;

impl SourceAdapter for ObsidianAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Obsidian
    }

    fn scan(
        &self,
        input_root: &Path,
        config: &MigrateConfig,
        stats: &mut MigrationStats,
    ) -> Result<ScanOutput> {
        let mut documents = Vec::new();

        let walker = WalkDir::new(input_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !(e.file_type().is_dir() && is_attachment_dir(e.file_name()))
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let rel = path.strip_prefix(input_root).unwrap_or(path);
            if !should_include_file(&rel.to_string_lossy(), config) {
                continue;
            }

            stats.total_scanned += 1;
            match parse_note(path, config) {
                Ok(mut doc) => {
                    doc.note_type = classify(&doc);
                    let date_like = is_daily_title(&doc.title);
                    if passes_filters(&doc, date_like, config, stats) {
                        documents.push(doc);
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("failed to parse {}: {}", path.display(), e);
                }
            }
        }

        Ok(ScanOutput {
            documents,
            block_index: None,
        })
    }

    fn assets(&self, input_root: &Path) -> Vec<PathBuf> {
        let mut assets = Vec::new();
        for dir in ATTACHMENT_DIRS {
            let root = input_root.join(dir);
            if !root.is_dir() {
                continue;
            }
            let walker = WalkDir::new(&root).sort_by_file_name();
            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let is_asset = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
                if is_asset {
                    assets.push(entry.path().to_path_buf());
                }
            }
        }
        assets
    }
}

fn is_attachment_dir(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| ATTACHMENT_DIRS.contains(&n))
}

fn is_daily_title(title: &str) -> bool {
    DAILY_TITLES.iter().any(|p| p.is_match(title))
}

fn parse_note(path: &Path, config: &MigrateConfig) -> Result<Document> {
    let content = fs::read_to_string(path).map_err(|e| MigrateError::Parse {
        message: e.to_string(),
        unit: path.display().to_string(),
    })?;

    let (frontmatter, body) = split_frontmatter(&content);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

    let title = frontmatter
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| stem.to_string());

    let mut created = frontmatter.get("created").and_then(parse_fm_date);
    if let Some(date) = frontmatter.get("date").and_then(parse_fm_date) {
        created = Some(date);
    }
    let mut updated = None;
    if created.is_none() && config.preserve_dates {
        let (fs_created, fs_modified) = file_timestamps(path);
        created = fs_created;
        updated = fs_modified;
    }

    let tags = extract_tags(&frontmatter, &body);

    let mut preserved = BTreeMap::new();
    for key in PRESERVED_KEYS {
        if let Some(value) = frontmatter.get(key) {
            preserved.insert(key.to_string(), value.clone());
        }
    }

    Ok(Document {
        source_path: path.display().to_string(),
        title,
        body,
        created,
        updated,
        tags,
        source_id: Some(stem.to_lowercase()),
        preserved,
        ..Document::default()
    })
}

/// Splits a leading YAML frontmatter block from the body.
///
/// Malformed YAML is not an error: the block is left in place and treated as
/// body text, matching how Obsidian itself renders it.
fn split_frontmatter(content: &str) -> (Value, String) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (Value::Null, content.to_string());
    };
    // An immediately-closed block has no "\n---" to find.
    if rest == "---" {
        return (Value::Null, String::new());
    }
    if let Some(body) = rest.strip_prefix("---\n") {
        return (Value::Null, body.trim().to_string());
    }
    let Some(end) = rest.find("\n---") else {
        return (Value::Null, content.to_string());
    };

    let raw = &rest[..end];
    let body = rest[end + 4..].trim().to_string();
    if raw.trim().is_empty() {
        return (Value::Null, body);
    }

    match serde_yaml::from_str::<Value>(raw) {
        Ok(value) => (value, body),
        Err(e) => {
            tracing::debug!("ignoring malformed frontmatter: {}", e);
            (Value::Null, content.to_string())
        }
    }
}

/// Frontmatter dates come as `2026-01-10`, `2026-01-10 09:30:00`, or RFC
/// 3339 strings.
fn parse_fm_date(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Tags come from the frontmatter `tags` key (list or comma string) plus
/// inline `#tag` markers in the body.
fn extract_tags(frontmatter: &Value, body: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    match frontmatter.get("tags") {
        Some(Value::Sequence(seq)) => {
            for item in seq {
                if let Some(s) = item.as_str() {
                    let tag = normalize_tag(s);
                    if !tag.is_empty() {
                        tags.insert(tag);
                    }
                }
            }
        }
        Some(Value::String(s)) => {
            for raw in s.split(',') {
                let tag = normalize_tag(raw);
                if !tag.is_empty() {
                    tags.insert(tag);
                }
            }
        }
        _ => {}
    }

    for caps in INLINE_TAG.captures_iter(body) {
        tags.insert(normalize_tag(&caps[1]));
    }

    tags
}
