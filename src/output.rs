use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::{MigrateConfig, CORPUS_DIR};
use crate::errors::{MigrateError, Result};
use crate::types::{Document, MigrationStats, NoteType, SourceKind};

/// Order in which note types are listed in the generated index.
const INDEX_TYPE_ORDER: [NoteType; 5] = [
    NoteType::Map,
    NoteType::Playbook,
    NoteType::Atomic,
    NoteType::Decision,
    NoteType::Reference,
];

/// Maximum notes listed per type before the index truncates.
const INDEX_MAX_PER_TYPE: usize = 15;

/// Writes migrated notes, copied assets, and the index document into the
/// corpus layout under `<output>/context-library/`.
pub struct OutputWriter {
    output_root: PathBuf,
    dry_run: bool,
}

impl OutputWriter {
    pub fn new(output_root: &Path, dry_run: bool) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            dry_run,
        }
    }

    /// Corpus root directory.
    pub fn corpus_dir(&self) -> PathBuf {
        self.output_root.join(CORPUS_DIR)
    }

    /// Creates the per-type corpus directories plus `assets/`.
    pub fn create_structure(&self) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let corpus = self.corpus_dir();
        for note_type in [
            NoteType::Atomic,
            NoteType::Map,
            NoteType::Playbook,
            NoteType::Decision,
            NoteType::Reference,
            NoteType::Synthesis,
        ] {
            fs::create_dir_all(corpus.join(note_type.dir_name()))?;
        }
        fs::create_dir_all(corpus.join("assets"))?;
        Ok(())
    }

    /// Destination path for one migrated note.
    pub fn note_path(&self, doc: &Document) -> Result<PathBuf> {
        let id = doc
            .canonical_id
            .as_deref()
            .ok_or_else(|| MigrateError::Write {
                message: "document has no canonical id".to_string(),
                path: doc.source_path.clone(),
            })?;
        Ok(self
            .corpus_dir()
            .join(doc.note_type.dir_name())
            .join(format!("{}.md", id)))
    }

    /// Writes one note; dry runs resolve the path but skip the write.
    pub fn write_note(&self, doc: &Document, content: &str) -> Result<PathBuf> {
        let path = self.note_path(doc)?;
        if !self.dry_run {
            fs::write(&path, content).map_err(|e| MigrateError::Write {
                message: e.to_string(),
                path: path.display().to_string(),
            })?;
            tracing::debug!("wrote {}", path.display());
        }
        Ok(path)
    }

    /// Copies asset files into `assets/`, flattened to their filenames.
    /// Individual failures are counted and logged, never fatal.
    pub fn copy_assets(&self, files: &[PathBuf], stats: &mut MigrationStats) {
        let assets_dir = self.corpus_dir().join("assets");
        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            if !self.dry_run {
                if let Err(e) = fs::copy(file, assets_dir.join(name)) {
                    stats.errors += 1;
                    tracing::warn!("failed to copy asset {}: {}", file.display(), e);
                    continue;
                }
            }
            stats.assets_copied += 1;
        }
    }

    /// Writes `00-INDEX.md`, the entry point for the migrated corpus.
    pub fn write_index(
        &self,
        documents: &[Document],
        stats: &MigrationStats,
        kind: SourceKind,
        config: &MigrateConfig,
    ) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        let content = render_index(documents, stats, kind, config);
        let path = self.corpus_dir().join("00-INDEX.md");
        fs::write(&path, content).map_err(|e| MigrateError::Write {
            message: e.to_string(),
            path: path.display().to_string(),
        })?;
        tracing::debug!("wrote index {}", path.display());
        Ok(())
    }
}

fn render_index(
    documents: &[Document],
    stats: &MigrationStats,
    kind: SourceKind,
    config: &MigrateConfig,
) -> String {
    let today = Utc::now().format("%Y-%m-%d");
    let mut content = String::new();

    content.push_str("---\n");
    content.push_str("id: INDEX-00\n");
    content.push_str("type: index\n");
    content.push_str(&format!("created: {}\n", today));
    content.push_str(&format!("updated: {}\n", today));
    content.push_str("---\n\n");

    content.push_str(&format!(
        "# {} Context Library\n\n",
        title_case(&config.org_name)
    ));
    content.push_str(&format!(
        "Knowledge migrated from {} on {}.\n\n",
        kind.display_name(),
        today
    ));

    content.push_str("## Statistics\n\n");
    content.push_str(&format!("- **Total Notes**: {}\n", documents.len()));
    content.push_str(&format!("- **Links Resolved**: {}\n", stats.links_resolved));
    content.push_str(&format!(
        "- **Links Unresolved**: {}\n",
        stats.links_unresolved
    ));
    content.push_str(&format!("- **Source**: {} export\n\n", kind.display_name()));

    content.push_str("## By Type\n\n");
    for note_type in INDEX_TYPE_ORDER {
        let notes: Vec<&Document> = documents
            .iter()
            .filter(|d| d.note_type == note_type)
            .collect();
        if notes.is_empty() {
            continue;
        }

        content.push_str(&format!(
            "### {} ({})\n\n",
            title_case(note_type.dir_name()),
            notes.len()
        ));
        for doc in notes.iter().take(INDEX_MAX_PER_TYPE) {
            if let Some(id) = &doc.canonical_id {
                content.push_str(&format!("- [[{}|{}]]\n", id, doc.title));
            }
        }
        if notes.len() > INDEX_MAX_PER_TYPE {
            content.push_str(&format!(
                "- ...and {} more\n",
                notes.len() - INDEX_MAX_PER_TYPE
            ));
        }
        content.push('\n');
    }

    content.push_str("## Post-Migration Tasks\n\n");
    content.push_str("1. Review migrated notes for quality\n");
    content.push_str("2. Fix unresolved reference markers\n");
    content.push_str("3. Add cross-references between related notes\n");
    content.push_str("4. Create map notes for major topic areas\n");

    content
}

/// Uppercases the first letter of each word, leaving the rest alone.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}
