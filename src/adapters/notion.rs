use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::classify::classify;
use crate::config::{should_include_file, MigrateConfig};
use crate::errors::{MigrateError, Result};
use crate::types::{Document, MigrationStats, ScanOutput, SourceKind};

use super::{file_timestamps, normalize_tag, passes_filters, SourceAdapter};

/// The 32-hex-digit page id Notion appends to exported filenames.
static PAGE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-f0-9]{32}").expect("valid regex"));

/// A `Tags: a, b` line anywhere in the page.
static TAGS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tags?:\s*([^\n]+)").expect("valid regex"));

/// Coarse content shapes that contribute a classification tag. Only the
/// first matching shape applies.
static TYPE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "decision",
            Regex::new(r"(?i)decision|decided|choosing|option").expect("valid regex"),
        ),
        (
            "playbook",
            Regex::new(r"(?i)playbook|process|how.?to|steps|procedure").expect("valid regex"),
        ),
        (
            "meeting",
            Regex::new(r"(?i)meeting|standup|retro|sync|notes").expect("valid regex"),
        ),
        (
            "reference",
            Regex::new(r"(?i)reference|resource|link|documentation").expect("valid regex"),
        ),
    ]
});

const ASSET_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "svg", "pdf", "webp"];

/// Reads Notion's "Export as Markdown & CSV" directory layout.
pub struct NotionAdapter;

impl SourceAdapter for NotionAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Notion
    }

    fn scan(
        &self,
        input_root: &Path,
        config: &MigrateConfig,
        stats: &mut MigrationStats,
    ) -> Result<ScanOutput> {
        let mut documents = Vec::new();

        // Sorted traversal keeps identifier assignment repeatable.
        let walker = WalkDir::new(input_root).sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
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
            match parse_page(path, input_root, config) {
                Ok(mut doc) => {
                    doc.note_type = classify(&doc);
                    if passes_filters(&doc, false, config, stats) {
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
        let walker = WalkDir::new(input_root).sort_by_file_name();
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
        assets
    }
}

fn parse_page(path: &Path, input_root: &Path, config: &MigrateConfig) -> Result<Document> {
    let content = fs::read_to_string(path).map_err(|e| MigrateError::Parse {
        message: e.to_string(),
        unit: path.display().to_string(),
    })?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let (title, source_id) = split_title_and_id(stem);
    let body = strip_title_heading(&content, &title);
    let tags = extract_tags(&body);

    let (created, updated) = if config.preserve_dates {
        file_timestamps(path)
    } else {
        (None, None)
    };

    // The export mirrors the workspace hierarchy as nested directories.
    let source_parent = path
        .parent()
        .and_then(|p| p.strip_prefix(input_root).ok())
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty());

    Ok(Document {
        source_path: path.display().to_string(),
        title,
        body,
        created,
        updated,
        tags,
        source_id,
        source_parent,
        ..Document::default()
    })
}

/// Splits `My Page 0123...cdef` into the human title and the native page id.
fn split_title_and_id(stem: &str) -> (String, Option<String>) {
    let source_id = PAGE_ID.find(stem).map(|m| m.as_str().to_string());
    let title = PAGE_ID
        .replace_all(stem, "")
        .trim_matches(|c: char| c == ' ' || c == '-' || c == '_')
        .to_string();
    if title.is_empty() {
        (stem.to_string(), source_id)
    } else {
        (title, source_id)
    }
}

/// Drops the redundant `# Title` heading Notion writes as the first line.
fn strip_title_heading(content: &str, title: &str) -> String {
    if let Some(rest) = content.strip_prefix("# ") {
        if let Some((first_line, remainder)) = rest.split_once('\n') {
            if first_line.trim() == title {
                return remainder.trim_start_matches('\n').to_string();
            }
        } else if rest.trim() == title {
            return String::new();
        }
    }
    content.to_string()
}

fn extract_tags(content: &str) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    if let Some(caps) = TAGS_LINE.captures(content) {
        for raw in caps[1].split(',') {
            let tag = normalize_tag(raw);
            if !tag.is_empty() {
                tags.insert(tag);
            }
        }
    }

    for (tag, pattern) in TYPE_PATTERNS.iter() {
        if pattern.is_match(content) {
            tags.insert((*tag).to_string());
            break;
        }
    }

    tags
}
