mod rewriter;
mod sections;

pub use rewriter::ReferenceRewriter;
pub use sections::normalize_sections;
