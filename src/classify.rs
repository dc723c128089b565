use crate::types::{Document, NoteType};

/// Content markers (matched case-insensitively) that flag a map/index note.
const MAP_MARKERS: [&str; 4] = ["moc", "map of content", "## contents", "## index"];

/// Content markers that flag a step-by-step playbook.
const PLAYBOOK_MARKERS: [&str; 4] = ["## steps", "## process", "## procedure", "## how to"];

/// Content markers that flag a recorded decision.
const DECISION_MARKERS: [&str; 3] = ["## decision", "## options", "## rationale"];

/// Classifies a document into a note type.
///
/// Content markers are checked first, then tags. Anything without a
/// recognizable shape stays atomic.
pub fn classify(doc: &Document) -> NoteType {
    let content = doc.body.to_lowercase();

    if MAP_MARKERS.iter().any(|m| content.contains(m)) {
        return NoteType::Map;
    }
    if PLAYBOOK_MARKERS.iter().any(|m| content.contains(m)) {
        return NoteType::Playbook;
    }
    if DECISION_MARKERS.iter().any(|m| content.contains(m)) {
        return NoteType::Decision;
    }

    if has_any_tag(doc, &["moc", "map", "index"]) {
        return NoteType::Map;
    }
    if has_any_tag(doc, &["playbook", "process", "how-to"]) {
        return NoteType::Playbook;
    }
    if has_any_tag(doc, &["decision", "adr"]) {
        return NoteType::Decision;
    }
    if has_any_tag(doc, &["reference", "resource"]) {
        return NoteType::Reference;
    }

    NoteType::Atomic
}

fn has_any_tag(doc: &Document, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| doc.tags.contains(*c))
}
