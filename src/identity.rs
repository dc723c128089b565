use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::types::{slugify, Document, MigrationStats, NoteType};

/// Global mapping from reference keys to canonical identifiers.
///
/// Three kinds of key point at each document: its format-native id (when the
/// source has one), the slug of its title, and its lowercased raw title. All
/// lookups during rewriting go through this map.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    keys: HashMap<String, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reference key for a canonical identifier.
    ///
    /// Last registration wins. A key that already points at a different
    /// identifier is counted as a collision and logged so duplicate titles
    /// are observable rather than silent.
    pub fn register(&mut self, key: &str, canonical_id: &str, stats: &mut MigrationStats) {
        if key.is_empty() {
            return;
        }
        if let Some(existing) = self.keys.get(key) {
            if existing != canonical_id {
                stats.key_collisions += 1;
                tracing::warn!(
                    "reference key collision: '{}' remapped {} -> {}",
                    key,
                    existing,
                    canonical_id
                );
            }
        }
        self.keys.insert(key.to_string(), canonical_id.to_string());
    }

    /// Looks up the canonical identifier for a reference key.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(|id| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Index from outliner block UIDs to the page that contains them.
///
/// Adapters record `uid -> container title` while flattening block trees.
/// After identity assignment the index is sealed against the finished map, at
/// which point each surviving entry carries the container's canonical id.
/// Blocks whose container was filtered out of the migration drop during
/// sealing, so references to them stay unresolved.
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    containers: HashMap<String, String>,
    sealed: HashMap<String, (String, String)>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a block lives in the named container page.
    pub fn record(&mut self, uid: &str, container_title: &str) {
        self.containers
            .insert(uid.to_string(), container_title.to_string());
    }

    /// Resolves every recorded container title through the identity map.
    pub fn seal(&mut self, map: &IdentityMap) {
        self.sealed.clear();
        for (uid, title) in &self.containers {
            if let Some(id) = map.resolve(&title.to_lowercase()) {
                self.sealed
                    .insert(uid.clone(), (id.to_string(), title.clone()));
            }
        }
        tracing::debug!(
            "sealed block index: {} of {} blocks resolvable",
            self.sealed.len(),
            self.containers.len()
        );
    }

    /// Returns `(canonical id, container title)` for a block UID, if its
    /// container survived into the corpus. Only meaningful after sealing.
    pub fn resolve(&self, uid: &str) -> Option<(&str, &str)> {
        self.sealed
            .get(uid)
            .map(|(id, title)| (id.as_str(), title.as_str()))
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Assigns canonical identifiers to scanned documents and builds the
/// identity map.
///
/// Identifier shape is `PREFIX-YYYY-MM-NNN` where the month bucket comes from
/// the document's creation date (falling back to the resolver's notion of
/// now) and `NNN` is a per-(type, month) sequence. Map notes instead get
/// slug-based `MAP-<slug>` identifiers, suffixed on collision.
pub struct IdentityResolver {
    counters: HashMap<String, u32>,
    assigned: HashSet<String>,
    now: DateTime<Utc>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::with_now(Utc::now())
    }

    /// Creates a resolver with a fixed clock for undated documents.
    pub fn with_now(now: DateTime<Utc>) -> Self {
        Self {
            counters: HashMap::new(),
            assigned: HashSet::new(),
            now,
        }
    }

    /// Assigns an identifier to every document and registers its reference
    /// keys. This must complete for the whole corpus before any reference
    /// rewriting so links can point forward as well as backward.
    pub fn assign(&mut self, documents: &mut [Document], stats: &mut MigrationStats) -> IdentityMap {
        let mut map = IdentityMap::new();

        for doc in documents.iter_mut() {
            if doc.canonical_id.is_some() {
                continue;
            }

            let id = match doc.note_type {
                NoteType::Map => self.next_map_id(&doc.title),
                _ => self.next_sequence_id(doc),
            };
            self.assigned.insert(id.clone());

            if let Some(native) = &doc.source_id {
                map.register(native, &id, stats);
            }
            map.register(&slugify(&doc.title), &id, stats);
            map.register(&doc.title.to_lowercase(), &id, stats);

            doc.canonical_id = Some(id);
        }

        tracing::debug!(
            "assigned {} identifiers, {} reference keys",
            documents.len(),
            map.len()
        );
        map
    }

    fn next_sequence_id(&mut self, doc: &Document) -> String {
        let month = doc.created.unwrap_or(self.now).format("%Y-%m");
        let bucket = format!("{}-{}", doc.note_type.id_prefix(), month);

        let seq = self.counters.entry(bucket.clone()).or_insert(0);
        *seq += 1;
        if *seq == 1000 {
            // The padded width grows past 999 rather than wrapping.
            tracing::warn!("identifier bucket {} exceeded 999 entries", bucket);
        }

        format!("{}-{:03}", bucket, seq)
    }

    fn next_map_id(&mut self, title: &str) -> String {
        let base = format!("MAP-{}", slugify(title));
        if !self.assigned.contains(&base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.assigned.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}
