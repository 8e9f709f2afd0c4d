use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Unique heading ids for one rendered page
#[derive(Debug, Default)]
pub(super) struct HeadingSlugs {
    seen: HashMap<String, usize>,
}

impl HeadingSlugs {
    /// Claim an id for a heading, suffixing `-N` on repeats
    fn claim(&mut self, base: String) -> String {
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count > 0 { format!("{}-{}", base, count) } else { base };
        *count += 1;
        id
    }
}

/// Render Markdown to HTML, assigning every heading an `id`
pub(super) fn markdown_to_html(text: &str, tables: bool, slugs: &mut HeadingSlugs) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    if tables {
        options.insert(Options::ENABLE_TABLES);
    }

    let mut events: Vec<Event> = Parser::new_ext(text, options).collect();
    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { .. })) {
            continue;
        }
        let title = heading_text(&events[i + 1..]);
        if let Event::Start(Tag::Heading { level, id, .. }) = &mut events[i] {
            let base = match id.take() {
                Some(explicit) => explicit.to_string(),
                None => {
                    let slug = slugify(&title);
                    if slug.is_empty() { format!("h{}", heading_level_to_u32(*level)) } else { slug }
                }
            };
            *id = Some(CowStr::from(slugs.claim(base)));
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Plain text of the heading whose body starts at `events[0]`
fn heading_text(events: &[Event]) -> String {
    let mut buf = String::new();
    for ev in events {
        match ev {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => buf.push_str(t),
            Event::SoftBreak | Event::HardBreak => buf.push(' '),
            _ => {}
        }
    }
    buf
}

fn heading_level_to_u32(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Create URL-friendly slug from text
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if (c.is_ascii_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}
