use std::collections::BTreeSet;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::types::SourceKind;

/// Name of the corpus directory created under the output root.
pub const CORPUS_DIR: &str = "context-library";

/// Configuration for a migration run.
///
/// Controls filtering, reference handling, and output behavior. A config is
/// built per run from CLI flags via [`MigrateConfig::for_source`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrateConfig {
    /// Organization name used in the generated index document.
    pub org_name: String,
    /// Tag added first to every migrated note's tag list.
    pub tag_prefix: String,
    /// Fall back to filesystem timestamps when the export carries none.
    pub preserve_dates: bool,
    /// Preview mode: run the full pipeline without writing any file.
    pub dry_run: bool,
    /// Maximum outline depth preserved when flattening block trees.
    pub flatten_depth: usize,
    /// Glob patterns for source files to include during the scan.
    pub include: Vec<String>,
    /// Glob patterns for source files to exclude during the scan.
    pub exclude: Vec<String>,
    /// Exclusion filters applied while scanning.
    pub filter: FilterConfig,
}

/// Scan-time exclusion filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Minimum body word count for a note to be migrated.
    pub min_word_count: usize,
    /// Skip daily/journal notes recognized by title patterns or content markers.
    pub exclude_date_like: bool,
    /// Note types (by their string form) excluded from migration.
    pub exclude_types: BTreeSet<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_word_count: 50,
            exclude_date_like: true,
            exclude_types: BTreeSet::new(),
        }
    }
}

impl MigrateConfig {
    /// Returns the default configuration for a source tool.
    ///
    /// Obsidian vaults tend to hold short evergreen notes, so their word
    /// threshold is lower than the Notion/Roam default.
    pub fn for_source(kind: SourceKind) -> Self {
        let min_word_count = match kind {
            SourceKind::Obsidian => 30,
            SourceKind::Notion | SourceKind::Roam => 50,
        };

        Self {
            org_name: String::new(),
            tag_prefix: kind.default_tag_prefix().to_string(),
            preserve_dates: true,
            dry_run: false,
            flatten_depth: 2,
            include: vec!["**/*.md".to_string()],
            exclude: Vec::new(),
            filter: FilterConfig {
                min_word_count,
                ..FilterConfig::default()
            },
        }
    }
}

/// Determines whether a scanned file should be considered based on the
/// configuration's include and exclude glob patterns.
///
/// A file is included only if it matches at least one include pattern and
/// does not match any exclude pattern. Exclude patterns take precedence.
pub fn should_include_file(file_path: &str, config: &MigrateConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    // Exclude patterns win over includes.
    for pattern_str in &config.exclude {
        if let Ok(pattern) = Pattern::new(pattern_str) {
            if pattern.matches_with(file_path, match_opts) {
                return false;
            }
        }
    }

    for pattern_str in &config.include {
        if let Ok(pattern) = Pattern::new(pattern_str) {
            if pattern.matches_with(file_path, match_opts) {
                return true;
            }
        }
    }

    false
}
