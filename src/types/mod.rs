use std::fmt;
use time::OffsetDateTime;

/// Addresses one stored copy of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// The current content.
    Live,
    /// History revision `N`, 1-based, higher is more recent. `Revision(0)`
    /// addresses live content, like `From<i64>` does for `0`.
    Revision(u32),
}

impl From<i64> for Version {
    /// `-1` and `0` address live content, anything positive a history revision.
    fn from(v: i64) -> Self {
        if v < 1 {
            Version::Live
        } else {
            Version::Revision(u32::try_from(v).unwrap_or(u32::MAX))
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Live => f.write_str("live"),
            Version::Revision(n) => write!(f, "revision {}", n),
        }
    }
}

/// One history entry of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    pub number: u32,
    pub modified: OffsetDateTime,
}

/// A soft-deleted page awaiting restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashedPage {
    pub name: String,
    pub modified: OffsetDateTime,
}

/// Which component handles `|`-prefixed table blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSyntax {
    /// The wiki's own pipe-table extension with per-cell options.
    #[default]
    Extended,
    /// The Markdown renderer's GFM tables.
    Markdown,
}
