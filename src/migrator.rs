use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::adapters::adapter_for;
use crate::config::MigrateConfig;
use crate::errors::{MigrateError, Result};
use crate::frontmatter;
use crate::identity::IdentityResolver;
use crate::output::OutputWriter;
use crate::rewrite::{normalize_sections, ReferenceRewriter};
use crate::types::{MigrationReport, MigrationStats, SourceKind};

/// Orchestrates a full migration run.
///
/// The run is two-phase: the scan and identity assignment must finish for
/// the whole corpus before any document body is rewritten, because
/// references can point at documents that appear later in scan order.
pub struct Migrator {
    kind: SourceKind,
    input_root: PathBuf,
    output_root: PathBuf,
    config: MigrateConfig,
}

impl Migrator {
    /// Creates a migrator, verifying the input root is readable up front.
    /// This is the only unrecoverable error in a run.
    pub fn new(
        kind: SourceKind,
        input_root: &Path,
        output_root: &Path,
        config: MigrateConfig,
    ) -> Result<Self> {
        fs::read_dir(input_root).map_err(|e| MigrateError::Scan {
            message: format!("cannot read input directory: {}", e),
            path: input_root.display().to_string(),
        })?;

        Ok(Self {
            kind,
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
            config,
        })
    }

    /// Runs the migration end to end and returns its report. Unit-level
    /// failures are counted in the report rather than aborting the run.
    pub fn run(&self) -> Result<MigrationReport> {
        let start = Instant::now();
        let mut stats = MigrationStats::default();
        let adapter = adapter_for(self.kind);

        tracing::info!(
            "migrating {} export from {}",
            self.kind.as_str(),
            self.input_root.display()
        );

        // 1. Scan the export into normalized documents.
        let mut scan = adapter.scan(&self.input_root, &self.config, &mut stats)?;
        tracing::info!(
            "scanned {} units, {} to migrate",
            stats.total_scanned,
            scan.documents.len()
        );

        // 2. Assign identifiers over the whole corpus, then seal the block
        // index against the finished map.
        let mut resolver = IdentityResolver::new();
        let map = resolver.assign(&mut scan.documents, &mut stats);
        if let Some(index) = scan.block_index.as_mut() {
            index.seal(&map);
        }

        // 3. Lay down the corpus directories.
        let writer = OutputWriter::new(&self.output_root, self.config.dry_run);
        writer.create_structure()?;

        // 4. Rewrite references and write each note.
        let rewriter = ReferenceRewriter::for_source(self.kind);
        for doc in &scan.documents {
            let outcome = rewriter.rewrite(doc, &map, scan.block_index.as_ref());
            stats.links_resolved += outcome.resolved;
            stats.links_unresolved += outcome.unresolved;
            stats.block_refs_resolved += outcome.block_refs_resolved;

            let body = normalize_sections(&outcome.body, &outcome.outbound);
            let rendered = match frontmatter::render_document(doc, &body, self.kind, &self.config) {
                Ok(rendered) => rendered,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("failed to render {}: {}", doc.title, e);
                    continue;
                }
            };

            match writer.write_note(doc, &rendered) {
                Ok(_) => stats.migrated += 1,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("failed to write {}: {}", doc.title, e);
                }
            }
        }

        // 5. Copy binary assets, flattened into assets/.
        let assets = adapter.assets(&self.input_root);
        writer.copy_assets(&assets, &mut stats);

        // 6. Generate the corpus index.
        if let Err(e) = writer.write_index(&scan.documents, &stats, self.kind, &self.config) {
            stats.errors += 1;
            tracing::warn!("failed to write index: {}", e);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "migration finished: {} notes in {}ms",
            stats.migrated,
            duration_ms
        );

        Ok(MigrationReport { stats, duration_ms })
    }
}
