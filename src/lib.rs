//! Revwiki - a file-backed wiki page store with revision history
//!
//! The crate has two halves: [`RevisionStore`] keeps every page's live
//! content, numbered history and trash on disk, and [`MarkupService`] turns
//! page text into HTML, linking page references against the store.

pub mod config;
pub mod errors;
pub mod logger;
pub mod services;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use errors::{WikiError, WikiResult};
pub use logger::Logger;
pub use services::{depluralize, split_plural, MarkupService, RevisionStore, MAX_VERSIONS};
pub use types::{RevisionInfo, TableSyntax, TrashedPage, Version};

// Re-export utility functions
pub use utils::{escape_html, format_timestamp, is_valid_name};
