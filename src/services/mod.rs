pub mod markup;
pub mod pluralizer;
pub mod revision_store;

pub use markup::MarkupService;
pub use pluralizer::{depluralize, split_plural, PluralSplit};
pub use revision_store::{RevisionStore, MAX_VERSIONS};
