//! Wiki markup processing: page links, the pipe-table extension and
//! Markdown rendering.

pub mod lexer;
mod links;
mod markdown;
mod tables;

use log::debug;

use crate::config::Config;
use crate::services::revision_store::RevisionStore;
use crate::types::{TableSyntax, Version};

pub use lexer::{is_camel_case, Span, SpanLexer};
use markdown::{markdown_to_html, HeadingSlugs};
use tables::{render_table, split_blocks, Block};

/// Renders wiki text to HTML.
///
/// The service only queries page existence through the injected callback;
/// it never touches storage otherwise.
pub struct MarkupService<'a> {
    page_exists: Box<dyn Fn(&str) -> bool + 'a>,
    table_syntax: TableSyntax,
}

impl<'a> MarkupService<'a> {
    pub fn new(page_exists: impl Fn(&str) -> bool + 'a) -> Self {
        Self {
            page_exists: Box::new(page_exists),
            table_syntax: TableSyntax::default(),
        }
    }

    /// A service resolving links against the live pages of `store`
    pub fn for_store(store: &'a RevisionStore) -> Self {
        Self::new(move |name: &str| store.exists(name, Version::Live))
    }

    pub fn from_config(config: &Config, page_exists: impl Fn(&str) -> bool + 'a) -> Self {
        Self::new(page_exists).with_table_syntax(config.table_syntax)
    }

    pub fn with_table_syntax(mut self, table_syntax: TableSyntax) -> Self {
        self.table_syntax = table_syntax;
        self
    }

    pub fn table_syntax(&self) -> TableSyntax {
        self.table_syntax
    }

    /// Render wiki text to an HTML fragment
    pub fn render(&self, text: &str) -> String {
        let text = text.replace('\r', "");
        debug!("Rendering {} bytes with {:?} tables", text.len(), self.table_syntax);
        let mut slugs = HeadingSlugs::default();
        match self.table_syntax {
            TableSyntax::Extended => self.render_extended(&text, &mut slugs),
            TableSyntax::Markdown => {
                markdown_to_html(&self.link_wiki_words(&text), true, &mut slugs)
            }
        }
    }

    /// Only the link pass: page references become anchors, the rest is
    /// returned unchanged.
    pub fn link_wiki_words(&self, text: &str) -> String {
        links::link_wiki_words(text, &*self.page_exists)
    }

    fn render_extended(&self, text: &str, slugs: &mut HeadingSlugs) -> String {
        let mut out = String::new();
        for block in split_blocks(text) {
            match block {
                Block::Markdown(md) => {
                    out.push_str(&markdown_to_html(&self.link_wiki_words(md), false, slugs));
                }
                Block::Table(table) => {
                    let mut render_cell =
                        |body: &str| unwrap_paragraph(&self.render_extended(body, &mut *slugs)).to_string();
                    out.push_str(&render_table(table, &mut render_cell));
                }
            }
        }
        out
    }
}

/// Strip a single `<p>` wrapping the whole fragment
fn unwrap_paragraph(html: &str) -> &str {
    let trimmed = html.trim();
    match trimmed.strip_prefix("<p>").and_then(|s| s.strip_suffix("</p>")) {
        Some(inner) if !inner.contains("<p>") => inner,
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MarkupService<'static> {
        MarkupService::new(|name: &str| matches!(name, "WikiWord" | "Home" | "Cherry"))
    }

    #[test]
    fn renders_links_inside_markdown() {
        let html = service().render("Go *to* WikiWord.\r\n");
        assert_eq!(
            html,
            "<p>Go <em>to</em> <a href=\"/WikiWord\" title=\"WikiWord\">WikiWord</a>.</p>\n"
        );
    }

    #[test]
    fn markdown_links_and_autolinks_survive() {
        let html = service()
            .render("See [the docs](https://github.com/rust-lang/RustBook) and <https://example.com/FooBar>\n");
        assert_eq!(
            html,
            "<p>See <a href=\"https://github.com/rust-lang/RustBook\">the docs</a> and \
             <a href=\"https://example.com/FooBar\">https://example.com/FooBar</a></p>\n"
        );
    }

    #[test]
    fn code_blocks_are_not_linked() {
        let html = service().render("    WikiWord\n");
        assert_eq!(html, "<pre><code>WikiWord\n</code></pre>\n");
    }

    #[test]
    fn extended_table_cells_are_rendered_recursively() {
        let html = service().render("|_. Fruit |\n| *[[Cherries]]* |\n");
        assert_eq!(
            html,
            "<table>\n<tr><th>Fruit</th></tr>\n\
             <tr><td><em><a href=\"/Cherry\" title=\"Cherry\">Cherries</a></em></td></tr>\n</table>\n"
        );
    }

    #[test]
    fn tables_between_paragraphs() {
        let html = service().render("before\n| x |\nafter\n");
        assert_eq!(
            html,
            "<p>before</p>\n<table>\n<tr><td>x</td></tr>\n</table>\n<p>after</p>\n"
        );
    }

    #[test]
    fn markdown_table_syntax_uses_gfm_tables() {
        let service = service().with_table_syntax(TableSyntax::Markdown);
        let html = service.render("| a | b |\n|---|---|\n| [[Home|go]] | 2 |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<a href=\"/Home\" title=\"Home\">go</a>"));
    }

    #[test]
    fn from_config_picks_table_syntax() {
        let config = Config::with_custom("wiki".into(), None, Some(TableSyntax::Markdown));
        let service = MarkupService::from_config(&config, |_: &str| false);
        assert_eq!(service.table_syntax(), TableSyntax::Markdown);
    }

    #[test]
    fn unwrap_only_a_single_paragraph() {
        assert_eq!(unwrap_paragraph("<p>one</p>\n"), "one");
        assert_eq!(unwrap_paragraph("<p>a</p>\n<p>b</p>\n"), "<p>a</p>\n<p>b</p>");
        assert_eq!(unwrap_paragraph("<ul>\n<li>x</li>\n</ul>\n"), "<ul>\n<li>x</li>\n</ul>");
    }
}
