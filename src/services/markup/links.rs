//! Resolution of lexed link spans into HTML anchors.

use log::debug;

use super::lexer::{Span, SpanLexer};
use crate::services::pluralizer::split_plural;
use crate::utils::escape_html;

/// Rewrite every page reference in `text` as an anchor, leaving everything
/// else (including code) untouched for the Markdown renderer.
pub fn link_wiki_words(text: &str, page_exists: &dyn Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for span in SpanLexer::new(text) {
        match span {
            Span::Text(t) | Span::Verbatim(t) => out.push_str(t),
            Span::NoLink(page) => out.push_str(page),
            Span::PageRef { page, text: Some(link_text) } => {
                let target = page.replace(' ', "-");
                let exists = page_exists(target.as_str());
                push_anchor(&mut out, &target, link_text, exists);
            }
            Span::PageRef { page, text: None } => {
                let (target, exists) = resolve(&page.replace(' ', "-"), page_exists);
                push_anchor(&mut out, &target, page, exists);
            }
            Span::WikiWord(word) => {
                let (target, exists) = resolve(word, page_exists);
                push_anchor(&mut out, &target, word, exists);
            }
        }
    }
    out
}

/// Find the page a reference points at: the name itself, else its singular
/// stem. Returns the name unchanged, marked missing, when neither exists.
fn resolve(name: &str, page_exists: &dyn Fn(&str) -> bool) -> (String, bool) {
    if page_exists(name) {
        return (name.to_string(), true);
    }
    let split = split_plural(name);
    if split.is_plural() && page_exists(split.stem.as_ref()) {
        debug!("Linked plural {} to page {}", name, split.stem);
        return (split.stem.into_owned(), true);
    }
    (split.rejoin(), false)
}

fn push_anchor(out: &mut String, page: &str, text: &str, exists: bool) {
    let page = escape_html(page);
    let text = escape_html(text);
    if exists {
        out.push_str(&format!("<a href=\"/{page}\" title=\"{page}\">{text}</a>"));
    } else {
        out.push_str(&format!(
            "<a href=\"/edit/{page}\" title=\"{page} (page does not exist)\" class=\"new\">{text}</a>"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(names: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |name: &str| names.iter().any(|n| *n == name)
    }

    #[test]
    fn links_existing_wiki_word() {
        let html = link_wiki_words("see WikiWord", &pages(&["WikiWord"]));
        assert_eq!(html, "see <a href=\"/WikiWord\" title=\"WikiWord\">WikiWord</a>");
    }

    #[test]
    fn plural_wiki_word_links_to_singular_page() {
        let html = link_wiki_words("all WikiWords", &pages(&["WikiWord"]));
        assert_eq!(html, "all <a href=\"/WikiWord\" title=\"WikiWord\">WikiWords</a>");
    }

    #[test]
    fn missing_page_gets_new_marker() {
        let html = link_wiki_words("FooBars", &pages(&[]));
        assert_eq!(
            html,
            "<a href=\"/edit/FooBars\" title=\"FooBars (page does not exist)\" class=\"new\">FooBars</a>"
        );
    }

    #[test]
    fn bracket_spaces_become_hyphens() {
        let html = link_wiki_words("[[ Cherry Tarts ]]", &pages(&["Cherry-Tart"]));
        assert_eq!(html, "<a href=\"/Cherry-Tart\" title=\"Cherry-Tart\">Cherry Tarts</a>");
    }

    #[test]
    fn ies_plural_falls_back_to_the_name_as_written() {
        // the singular of Cherry-Pies is Cherry-Py, which does not exist
        let html = link_wiki_words("[[ Cherry Pies ]]", &pages(&["Cherry-Pie"]));
        assert_eq!(
            html,
            "<a href=\"/edit/Cherry-Pies\" title=\"Cherry-Pies (page does not exist)\" class=\"new\">Cherry Pies</a>"
        );
    }

    #[test]
    fn explicit_text_never_depluralizes() {
        let html = link_wiki_words("[[Cherries | the fruit]]", &pages(&["Cherry"]));
        assert_eq!(
            html,
            "<a href=\"/edit/Cherries\" title=\"Cherries (page does not exist)\" class=\"new\">the fruit</a>"
        );
    }

    #[test]
    fn no_link_and_code_are_plain() {
        let html = link_wiki_words("[[? WikiWord]] and `WikiWord`", &pages(&["WikiWord"]));
        assert_eq!(html, "WikiWord and `WikiWord`");

        let code = "    let WikiWord = 1;\n";
        assert_eq!(link_wiki_words(code, &pages(&["WikiWord"])), code);
    }

    #[test]
    fn link_text_is_escaped() {
        let html = link_wiki_words("[[Home | <b>home</b>]]", &pages(&["Home"]));
        assert_eq!(html, "<a href=\"/Home\" title=\"Home\">&lt;b&gt;home&lt;/b&gt;</a>");
    }
}
