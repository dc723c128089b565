use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::identity::{BlockIndex, IdentityMap};
use crate::types::{slugify, Document, OutboundRef, RewriteOutcome, SourceKind};

/// `[[Target]]` / `[[Target|Display]]` wiki links, with an optional leading
/// `!` so embeds can be recognized and left for the embed pass.
static WIKI_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(!?)\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("valid regex"));

/// Obsidian `![[target]]` embeds.
static EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\[([^\]]+)\]\]").expect("valid regex"));

/// Roam `((uid))` block references.
static BLOCK_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\(([a-zA-Z0-9_-]+)\)\)").expect("valid regex"));

/// Markdown inline links, the only reference syntax Notion exports use.
static INLINE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

/// URLs that point inside a Notion workspace rather than at the web.
static NOTION_INTERNAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"notion://|notion\.so/").expect("valid regex"));

/// The 32-hex-digit page id Notion appends to filenames and URLs.
static NOTION_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-f0-9]{32}").expect("valid regex"));

/// File extensions treated as embeddable images rather than note embeds.
const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".svg"];

/// Reference syntaxes a source format can contain. Each variant is one
/// rewriting pass over the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecognizerPass {
    WikiLink,
    Embed,
    BlockRef,
    InlineLink,
}

/// Rewrites source-native references into canonical corpus links.
///
/// Passes run in a fixed order chosen so that no pass ever re-scans text
/// another pass produced: wiki links are rewritten first (skipping embeds),
/// and the embed/block passes that follow emit plain text or already-resolved
/// links. Resolution never mutates the identity map.
pub struct ReferenceRewriter {
    passes: Vec<RecognizerPass>,
}

impl ReferenceRewriter {
    /// Builds the recognizer pipeline for a source format.
    pub fn for_source(kind: SourceKind) -> Self {
        let passes = match kind {
            SourceKind::Notion => vec![RecognizerPass::InlineLink],
            SourceKind::Roam => vec![RecognizerPass::WikiLink, RecognizerPass::BlockRef],
            SourceKind::Obsidian => vec![RecognizerPass::WikiLink, RecognizerPass::Embed],
        };
        Self { passes }
    }

    /// Rewrites every recognized reference in the document body.
    ///
    /// Resolved references become `[[<canonical id>|<display>]]`; unresolved
    /// ones are replaced with a visible marker that keeps the original
    /// display text so nothing silently disappears.
    pub fn rewrite(
        &self,
        document: &Document,
        map: &IdentityMap,
        block_index: Option<&BlockIndex>,
    ) -> RewriteOutcome {
        let mut outcome = RewriteOutcome {
            body: document.body.clone(),
            ..RewriteOutcome::default()
        };

        for pass in &self.passes {
            let body = std::mem::take(&mut outcome.body);
            outcome.body = match pass {
                RecognizerPass::WikiLink => rewrite_wiki_links(&body, map, &mut outcome),
                RecognizerPass::Embed => rewrite_embeds(&body, map, &mut outcome),
                RecognizerPass::BlockRef => rewrite_block_refs(&body, block_index, &mut outcome),
                RecognizerPass::InlineLink => rewrite_inline_links(&body, map, &mut outcome),
            };
        }

        outcome
    }
}

/// Resolves display text to a canonical id, trying the slug key first and
/// the lowercased raw text second.
fn resolve_text(text: &str, map: &IdentityMap) -> Option<String> {
    map.resolve(&slugify(text))
        .or_else(|| map.resolve(&text.to_lowercase()))
        .map(|id| id.to_string())
}

fn resolved_link(id: &str, display: &str, outcome: &mut RewriteOutcome) -> String {
    outcome.resolved += 1;
    outcome.outbound.push(OutboundRef::Resolved {
        canonical_id: id.to_string(),
        display: display.to_string(),
    });
    format!("[[{}|{}]]", id, display)
}

fn unresolved_marker(display: &str, outcome: &mut RewriteOutcome) -> String {
    outcome.unresolved += 1;
    outcome.outbound.push(OutboundRef::Unresolved {
        display: display.to_string(),
    });
    format!("[[{}]] *(unresolved)*", display)
}

fn rewrite_wiki_links(body: &str, map: &IdentityMap, outcome: &mut RewriteOutcome) -> String {
    WIKI_LINK
        .replace_all(body, |caps: &Captures| {
            if &caps[1] == "!" {
                // Embeds belong to the embed pass.
                return caps[0].to_string();
            }
            let target = &caps[2];
            let display = caps.get(3).map(|m| m.as_str()).unwrap_or(target);
            // Heading and block anchors narrow the lookup key, not the text.
            let candidate = target
                .split(|c| c == '#' || c == '^')
                .next()
                .unwrap_or(target)
                .trim();
            match resolve_text(candidate, map) {
                Some(id) => resolved_link(&id, display, outcome),
                None => unresolved_marker(display, outcome),
            }
        })
        .into_owned()
}

fn rewrite_embeds(body: &str, map: &IdentityMap, outcome: &mut RewriteOutcome) -> String {
    EMBED
        .replace_all(body, |caps: &Captures| {
            let target = &caps[1];
            let (base, alias) = match target.split_once('|') {
                Some((base, alias)) => (base, Some(alias)),
                None => (target, None),
            };

            let lower = base.to_lowercase();
            if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
                return format!("![{}](assets/{})", base, base);
            }

            let candidate = base
                .split(|c| c == '#' || c == '^')
                .next()
                .unwrap_or(base)
                .trim();
            let display = alias.unwrap_or(base);
            match resolve_text(candidate, map) {
                Some(id) => format!("See: {}", resolved_link(&id, display, outcome)),
                None => unresolved_marker(display, outcome),
            }
        })
        .into_owned()
}

fn rewrite_block_refs(
    body: &str,
    block_index: Option<&BlockIndex>,
    outcome: &mut RewriteOutcome,
) -> String {
    BLOCK_REF
        .replace_all(body, |caps: &Captures| {
            let uid = &caps[1];
            match block_index.and_then(|index| index.resolve(uid)) {
                Some((id, title)) => {
                    // Block-level precision does not survive migration; point
                    // at the container note instead.
                    outcome.block_refs_resolved += 1;
                    outcome.outbound.push(OutboundRef::Resolved {
                        canonical_id: id.to_string(),
                        display: title.to_string(),
                    });
                    format!("(see [[{}|{}]])", id, title)
                }
                None => {
                    outcome.unresolved += 1;
                    format!("(ref: {})", uid)
                }
            }
        })
        .into_owned()
}

fn rewrite_inline_links(body: &str, map: &IdentityMap, outcome: &mut RewriteOutcome) -> String {
    INLINE_LINK
        .replace_all(body, |caps: &Captures| {
            let text = &caps[1];
            let url = &caps[2];
            if !NOTION_INTERNAL.is_match(url) {
                // External links pass through byte for byte.
                return caps[0].to_string();
            }

            if let Some(hex) = NOTION_ID.find(url) {
                if let Some(id) = map.resolve(hex.as_str()) {
                    let id = id.to_string();
                    return resolved_link(&id, text, outcome);
                }
            }
            match resolve_text(text, map) {
                Some(id) => resolved_link(&id, text, outcome),
                None => unresolved_marker(text, outcome),
            }
        })
        .into_owned()
}
