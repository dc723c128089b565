use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};

use crate::config::MigrateConfig;
use crate::errors::Result;
use crate::types::{Document, SourceKind};

/// Renders the synthesized frontmatter block followed by the body.
///
/// Field order is fixed (id, type, title, tags, dates, provenance) so notes
/// across a corpus diff cleanly. Preserved source fields come last.
pub fn render_document(
    doc: &Document,
    body: &str,
    kind: SourceKind,
    config: &MigrateConfig,
) -> Result<String> {
    let mut fm = Mapping::new();

    insert(&mut fm, "id", doc.canonical_id.clone().unwrap_or_default());
    insert(&mut fm, "type", doc.note_type.as_str());
    insert(&mut fm, "title", doc.title.as_str());

    let mut tags: Vec<Value> = Vec::new();
    if !config.tag_prefix.is_empty() {
        tags.push(Value::from(config.tag_prefix.as_str()));
    }
    for tag in &doc.tags {
        if *tag != config.tag_prefix {
            tags.push(Value::from(tag.as_str()));
        }
    }
    fm.insert(Value::from("tags"), Value::Sequence(tags));

    insert(
        &mut fm,
        "created",
        format_date(doc.created.unwrap_or_else(Utc::now)),
    );
    if let Some(updated) = doc.updated {
        insert(&mut fm, "updated", format_date(updated));
    }
    insert(&mut fm, "confidence", "medium");
    insert(&mut fm, "source", kind.source_label());
    if let Some(parent) = &doc.source_parent {
        insert(&mut fm, "migrated_from", parent.as_str());
    }
    for (key, value) in &doc.preserved {
        fm.insert(Value::from(key.as_str()), value.clone());
    }

    let yaml = serde_yaml::to_string(&fm)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

fn insert(fm: &mut Mapping, key: &str, value: impl Into<Value>) {
    fm.insert(Value::from(key), value.into());
}

fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}
