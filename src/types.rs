use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::identity::BlockIndex;

/// Source tools an export can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Notion,
    Roam,
    Obsidian,
}

#[allow(clippy::should_implement_trait)]
impl SourceKind {
    /// Returns the string representation of this source kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Notion => "notion",
            SourceKind::Roam => "roam",
            SourceKind::Obsidian => "obsidian",
        }
    }

    /// Parses a source kind from its string representation.
    pub fn from_str(s: &str) -> Option<SourceKind> {
        match s {
            "notion" => Some(SourceKind::Notion),
            "roam" => Some(SourceKind::Roam),
            "obsidian" => Some(SourceKind::Obsidian),
            _ => None,
        }
    }

    /// Value written to the `source` frontmatter field of migrated notes.
    pub fn source_label(&self) -> &'static str {
        match self {
            SourceKind::Notion => "notion-migration",
            SourceKind::Roam => "roam-migration",
            SourceKind::Obsidian => "obsidian-migration",
        }
    }

    /// Default tag added to every note migrated from this source.
    pub fn default_tag_prefix(&self) -> &'static str {
        match self {
            SourceKind::Notion => "notion-migrated",
            SourceKind::Roam => "roam-migrated",
            SourceKind::Obsidian => "obsidian-migrated",
        }
    }

    /// Human-readable tool name used in the generated index.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Notion => "Notion",
            SourceKind::Roam => "Roam Research",
            SourceKind::Obsidian => "Obsidian",
        }
    }
}

/// Note types a migrated document can be classified as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    #[default]
    Atomic,
    Map,
    Playbook,
    Decision,
    Reference,
    Synthesis,
}

#[allow(clippy::should_implement_trait)]
impl NoteType {
    /// Returns the string representation of this note type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Atomic => "atomic",
            NoteType::Map => "map",
            NoteType::Playbook => "playbook",
            NoteType::Decision => "decision",
            NoteType::Reference => "reference",
            NoteType::Synthesis => "synthesis",
        }
    }

    /// Parses a note type from its string representation.
    pub fn from_str(s: &str) -> Option<NoteType> {
        match s {
            "atomic" => Some(NoteType::Atomic),
            "map" => Some(NoteType::Map),
            "playbook" => Some(NoteType::Playbook),
            "decision" => Some(NoteType::Decision),
            "reference" => Some(NoteType::Reference),
            "synthesis" => Some(NoteType::Synthesis),
            _ => None,
        }
    }

    /// Corpus subdirectory notes of this type are written into.
    pub fn dir_name(&self) -> &'static str {
        match self {
            NoteType::Atomic => "atomic",
            NoteType::Map => "maps",
            NoteType::Playbook => "playbooks",
            NoteType::Decision => "decisions",
            NoteType::Reference => "references",
            NoteType::Synthesis => "synthesis",
        }
    }

    /// Prefix used when minting canonical identifiers for this type.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NoteType::Atomic => "ATOM",
            NoteType::Map => "MAP",
            NoteType::Playbook => "PLAY",
            NoteType::Decision => "DEC",
            NoteType::Reference => "REF",
            NoteType::Synthesis => "SYNTH",
        }
    }
}

/// Normalized in-memory representation of one source note.
///
/// Adapters produce these during the scan; every later phase reads them.
/// `canonical_id` starts out empty and is set exactly once by the identity
/// resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Where the note came from; a page title for JSON exports without files.
    pub source_path: String,
    pub title: String,
    pub body: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// Normalized lowercase, hyphenated tags.
    pub tags: BTreeSet<String>,
    /// Format-native unique identifier (Notion page id, Obsidian file stem).
    pub source_id: Option<String>,
    /// Parent grouping within the export, when the layout has one.
    pub source_parent: Option<String>,
    /// Frontmatter fields carried through to the migrated note verbatim.
    pub preserved: BTreeMap<String, serde_yaml::Value>,
    pub note_type: NoteType,
    pub canonical_id: Option<String>,
}

/// Everything a scan produces: the documents that passed filtering plus,
/// for outliner sources, the block-to-container index recorded on the way.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub documents: Vec<Document>,
    pub block_index: Option<BlockIndex>,
}

/// An outbound reference discovered while rewriting a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRef {
    Resolved { canonical_id: String, display: String },
    Unresolved { display: String },
}

/// Result of rewriting one document body.
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub body: String,
    pub resolved: u64,
    pub unresolved: u64,
    pub block_refs_resolved: u64,
    pub outbound: Vec<OutboundRef>,
}

/// Counters accumulated across a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
    pub total_scanned: u64,
    pub migrated: u64,
    pub skipped: u64,
    pub errors: u64,
    pub links_resolved: u64,
    pub links_unresolved: u64,
    pub blocks_processed: u64,
    pub block_refs_resolved: u64,
    pub key_collisions: u64,
    pub assets_copied: u64,
}

impl MigrationStats {
    /// Folds another set of counters into this one.
    pub fn merge(&mut self, other: &MigrationStats) {
        self.total_scanned += other.total_scanned;
        self.migrated += other.migrated;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.links_resolved += other.links_resolved;
        self.links_unresolved += other.links_unresolved;
        self.blocks_processed += other.blocks_processed;
        self.block_refs_resolved += other.block_refs_resolved;
        self.key_collisions += other.key_collisions;
        self.assets_copied += other.assets_copied;
    }
}

/// Summary of a completed migration run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub stats: MigrationStats,
    pub duration_ms: u64,
}

impl MigrationReport {
    /// True when any unit failed to parse or write. The run still completes
    /// best-effort; callers use this for the process exit status.
    pub fn failed(&self) -> bool {
        self.stats.errors > 0
    }
}

/// Converts text to the lowercase hyphenated slug used as a reference key.
///
/// Runs of non-alphanumeric characters collapse into a single hyphen and
/// leading/trailing hyphens are dropped, so `"Q3 Planning (Draft)"` becomes
/// `"q3-planning-draft"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
