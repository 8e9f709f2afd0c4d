use std::path::PathBuf;

use crate::types::TableSyntax;

/// Storage and rendering settings, constructed by the embedding application
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `pages/`, `old/` and `deleted/`.
    pub root_dir: PathBuf,
    /// The page served at `/`; it can never be deleted.
    pub home_page: String,
    pub table_syntax: TableSyntax,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            root_dir: PathBuf::from("wiki"),
            home_page: "home".to_string(),
            table_syntax: TableSyntax::default(),
        }
    }

    /// Create configuration with custom values
    pub fn with_custom(
        root_dir: PathBuf,
        home_page: Option<String>,
        table_syntax: Option<TableSyntax>,
    ) -> Self {
        Self {
            root_dir,
            home_page: home_page.unwrap_or_else(|| "home".to_string()),
            table_syntax: table_syntax.unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_values_fall_back_to_defaults() {
        let cfg = Config::with_custom(PathBuf::from("/srv/wiki"), None, Some(TableSyntax::Markdown));
        assert_eq!(cfg.root_dir, PathBuf::from("/srv/wiki"));
        assert_eq!(cfg.home_page, "home");
        assert_eq!(cfg.table_syntax, TableSyntax::Markdown);
        assert_eq!(Config::default().table_syntax, TableSyntax::Extended);
    }
}
