use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::classify::classify;
use crate::config::{should_include_file, MigrateConfig};
use crate::errors::Result;
use crate::identity::BlockIndex;
use crate::types::{Document, MigrationStats, ScanOutput, SourceKind};

use super::{file_timestamps, normalize_tag, passes_filters, SourceAdapter};

/// Filename of Roam's JSON graph export.
const JSON_EXPORT: &str = "roam-export.json";

/// Long-form daily note titles like `January 5th, 2026`.
static DAILY_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d+(?:st|nd|rd|th)?,?\s+\d{4}$",
    )
    .expect("valid regex")
});

/// `#[[Page Tag]]` page tags.
static PAGE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\[\[([^\]]+)\]\]").expect("valid regex"));

/// Bare `#tag` tags.
static BARE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([a-zA-Z][a-zA-Z0-9_-]*)").expect("valid regex"));

/// `Key:: value` attribute lines, with their list marker kept out of the key.
static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\s*(?:- )?)([^:\n]+)::(.+)$").expect("valid regex"));

/// One page in a Roam JSON export.
#[derive(Debug, Clone, Deserialize)]
struct RoamPage {
    title: Option<String>,
    #[serde(default)]
    children: Vec<RoamBlock>,
    #[serde(rename = "create-time")]
    create_time: Option<i64>,
    #[serde(rename = "edit-time")]
    edit_time: Option<i64>,
}

/// A nested block within a page.
#[derive(Debug, Clone, Deserialize)]
struct RoamBlock {
    #[serde(default)]
    string: String,
    uid: Option<String>,
    #[serde(default)]
    children: Vec<RoamBlock>,
}

/// Reads Roam Research exports, preferring the JSON graph export and falling
/// back to a directory of markdown files.
pub struct RoamAdapter;

impl SourceAdapter for RoamAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Roam
    }

    fn scan(
        &self,
        input_root: &Path,
        config: &MigrateConfig,
        stats: &mut MigrationStats,
    ) -> Result<ScanOutput> {
        let export = input_root.join(JSON_EXPORT);
        if export.is_file() {
            scan_json_export(&export, config, stats)
        } else {
            scan_markdown_export(input_root, config, stats)
        }
    }
}

fn scan_json_export(
    export: &Path,
    config: &MigrateConfig,
    stats: &mut MigrationStats,
) -> Result<ScanOutput> {
    let mut documents = Vec::new();
    let mut index = BlockIndex::new();

    let pages = match read_pages(export) {
        Ok(pages) => pages,
        Err(e) => {
            stats.errors += 1;
            tracing::warn!("failed to read {}: {}", export.display(), e);
            return Ok(ScanOutput {
                documents,
                block_index: Some(index),
            });
        }
    };

    for page in pages {
        stats.total_scanned += 1;
        let title = page.title.clone().unwrap_or_else(|| "Untitled".to_string());

        if config.filter.exclude_date_like && DAILY_TITLE.is_match(&title) {
            stats.skipped += 1;
            tracing::debug!("skipping daily page: {}", title);
            continue;
        }

        let flattened = flatten_blocks(&page.children, config.flatten_depth, stats);
        let mut tags = BTreeSet::new();
        let body = normalize_outline(&flattened, &mut tags);

        let created = page
            .create_time
            .or(page.edit_time)
            .and_then(millis_to_datetime);

        let mut doc = Document {
            source_path: title.clone(),
            title,
            body,
            created,
            tags,
            ..Document::default()
        };
        doc.note_type = classify(&doc);

        if !passes_filters(&doc, false, config, stats) {
            continue;
        }

        // Only pages that made it into the corpus are referenceable, so the
        // index is populated after filtering.
        index_blocks(&page.children, &doc.title, &mut index);
        documents.push(doc);
    }

    Ok(ScanOutput {
        documents,
        block_index: Some(index),
    })
}

fn scan_markdown_export(
    input_root: &Path,
    config: &MigrateConfig,
    stats: &mut MigrationStats,
) -> Result<ScanOutput> {
    let mut documents = Vec::new();

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
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        if config.filter.exclude_date_like && DAILY_TITLE.is_match(&title) {
            stats.skipped += 1;
            tracing::debug!("skipping daily page: {}", title);
            continue;
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                stats.errors += 1;
                tracing::warn!("failed to read {}: {}", path.display(), e);
                continue;
            }
        };

        let mut tags = BTreeSet::new();
        let body = normalize_outline(&content, &mut tags);
        let created = if config.preserve_dates {
            file_timestamps(path).0
        } else {
            None
        };

        let mut doc = Document {
            source_path: path.display().to_string(),
            title,
            body,
            created,
            tags,
            ..Document::default()
        };
        doc.note_type = classify(&doc);

        if passes_filters(&doc, false, config, stats) {
            documents.push(doc);
        }
    }

    // Markdown exports carry no block UIDs, so the index stays empty and
    // `((uid))` references fall back to their unresolved form.
    Ok(ScanOutput {
        documents,
        block_index: Some(BlockIndex::new()),
    })
}

fn read_pages(export: &Path) -> Result<Vec<RoamPage>> {
    let raw = fs::read_to_string(export)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Flattens a block tree into an indented bullet list.
///
/// The walk is iterative so pathological nesting cannot blow the stack.
/// Indentation clamps at `flatten_depth` and descent stops one level past
/// it; anything deeper is dropped from the rendered body.
fn flatten_blocks(blocks: &[RoamBlock], flatten_depth: usize, stats: &mut MigrationStats) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut stack: Vec<(&RoamBlock, usize)> = Vec::new();
    for block in blocks.iter().rev() {
        stack.push((block, 0));
    }

    while let Some((block, depth)) = stack.pop() {
        stats.blocks_processed += 1;

        if !block.string.is_empty() {
            let indent = "  ".repeat(depth.min(flatten_depth));
            lines.push(format!("{}- {}", indent, block.string));
        }

        if depth < flatten_depth + 1 {
            for child in block.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    lines.join("\n")
}

/// Records every block UID in the tree against its container page, at any
/// depth. Block references can point below the flattening cutoff.
fn index_blocks(blocks: &[RoamBlock], container_title: &str, index: &mut BlockIndex) {
    let mut stack: Vec<&RoamBlock> = blocks.iter().collect();
    while let Some(block) = stack.pop() {
        if let Some(uid) = &block.uid {
            index.record(uid, container_title);
        }
        stack.extend(block.children.iter());
    }
}

/// Normalizes Roam-only markup: page tags keep their reference and join the
/// tag set, bare tags become inline code, attributes become bold labels.
fn normalize_outline(content: &str, tags: &mut BTreeSet<String>) -> String {
    let content = PAGE_TAG.replace_all(content, |caps: &Captures| {
        tags.insert(normalize_tag(&caps[1]));
        format!("[[{}]]", &caps[1])
    });
    let content = BARE_TAG.replace_all(&content, |caps: &Captures| {
        tags.insert(normalize_tag(&caps[1]));
        format!("`#{}`", &caps[1])
    });
    let content = ATTRIBUTE.replace_all(&content, |caps: &Captures| {
        format!("{}**{}**: {}", &caps[1], caps[2].trim(), caps[3].trim())
    });
    content.into_owned()
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
