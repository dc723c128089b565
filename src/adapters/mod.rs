mod notion;
mod obsidian;
mod roam;

pub use notion::NotionAdapter;
pub use obsidian::ObsidianAdapter;
pub use roam::RoamAdapter;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::MigrateConfig;
use crate::errors::Result;
use crate::types::{Document, MigrationStats, ScanOutput, SourceKind};

/// Content markers that flag a note as a daily/journal entry when found near
/// the top of the body.
const JOURNAL_MARKERS: [&str; 2] = ["daily note", "## journal"];

/// How far into the body the journal markers are searched for.
const JOURNAL_SCAN_CHARS: usize = 500;

/// A reader for one source tool's export format.
///
/// Adapters enumerate the export, turn each unit into a [`Document`], apply
/// the scan-time filters, and (for outliner sources) record the block index.
/// They never touch identifiers or references; that happens downstream.
pub trait SourceAdapter {
    /// Which source tool this adapter reads.
    fn kind(&self) -> SourceKind;

    /// Scans an export rooted at `input_root`.
    ///
    /// Malformed units are counted and skipped; the scan itself only fails
    /// when the export cannot be enumerated at all.
    fn scan(
        &self,
        input_root: &Path,
        config: &MigrateConfig,
        stats: &mut MigrationStats,
    ) -> Result<ScanOutput>;

    /// Asset files the writer should copy into the corpus.
    fn assets(&self, _input_root: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Returns the adapter for a source kind.
pub fn adapter_for(kind: SourceKind) -> Box<dyn SourceAdapter> {
    match kind {
        SourceKind::Notion => Box::new(NotionAdapter),
        SourceKind::Roam => Box::new(RoamAdapter),
        SourceKind::Obsidian => Box::new(ObsidianAdapter),
    }
}

/// Whitespace-separated word count used by the minimum-length filter.
pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub(crate) fn has_journal_markers(body: &str) -> bool {
    let head: String = body.chars().take(JOURNAL_SCAN_CHARS).collect();
    let head = head.to_lowercase();
    JOURNAL_MARKERS.iter().any(|marker| head.contains(marker))
}

/// Applies the scan-time exclusion filters to a parsed document.
///
/// Returns true when the document should migrate. Skips are counted; the
/// caller passes whether the title already matched its date-pattern set.
pub(crate) fn passes_filters(
    doc: &Document,
    title_is_date_like: bool,
    config: &MigrateConfig,
    stats: &mut MigrationStats,
) -> bool {
    if config.filter.exclude_date_like && (title_is_date_like || has_journal_markers(&doc.body)) {
        stats.skipped += 1;
        tracing::debug!("skipping daily/journal note: {}", doc.title);
        return false;
    }

    if word_count(&doc.body) < config.filter.min_word_count {
        stats.skipped += 1;
        tracing::debug!(
            "skipping short note ({} words): {}",
            word_count(&doc.body),
            doc.title
        );
        return false;
    }

    if config.filter.exclude_types.contains(doc.note_type.as_str()) {
        stats.skipped += 1;
        tracing::debug!(
            "skipping excluded type {}: {}",
            doc.note_type.as_str(),
            doc.title
        );
        return false;
    }

    true
}

/// Lowercases a raw tag and hyphenates its spaces.
pub(crate) fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "-")
}

/// Creation and modification times from file metadata, for exports that do
/// not carry their own timestamps. Filesystems without a birth time fall
/// back to the modification time.
pub(crate) fn file_timestamps(path: &Path) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let Ok(metadata) = fs::metadata(path) else {
        return (None, None);
    };
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let created = metadata
        .created()
        .ok()
        .map(DateTime::<Utc>::from)
        .or(modified);
    (created, modified)
}
