pub mod adapters;
pub mod classify;
pub mod config;
pub mod errors;
pub mod frontmatter;
pub mod identity;
pub mod migrator;
pub mod output;
pub mod rewrite;
pub mod types;
