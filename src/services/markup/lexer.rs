//! Link span lexer.
//!
//! Splits wiki text into spans: plain text, verbatim code and markup,
//! bracketed page references and CamelCase words. The lexer is a lazy iterator that never
//! allocates; cloning it restarts from the cloned position.

/// One piece of lexed wiki text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Text that may still contain Markdown.
    Text(&'a str),
    /// Code (indented line, fenced block, inline code span), a link
    /// destination `](...)`, an autolink or an HTML tag; never linked.
    Verbatim(&'a str),
    /// `[[ page ]]` or `[[ page | text ]]`.
    PageRef { page: &'a str, text: Option<&'a str> },
    /// `[[ ? page ]]`: the page name as plain text.
    NoLink(&'a str),
    /// A bare CamelCase word.
    WikiWord(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Fence {
    marker: u8,
    len: usize,
}

#[derive(Debug, Clone)]
pub struct SpanLexer<'a> {
    src: &'a str,
    pos: usize,
    fence: Option<Fence>,
}

impl<'a> SpanLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0, fence: None }
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.src.as_bytes()[self.pos - 1] == b'\n'
    }

    fn line_end(&self) -> usize {
        self.src[self.pos..]
            .find('\n')
            .map_or(self.src.len(), |i| self.pos + i + 1)
    }

    /// Consume `[pos, end)` and return it as a span built by `make`
    fn take(&mut self, end: usize, make: fn(&'a str) -> Span<'a>) -> Span<'a> {
        let span = make(&self.src[self.pos..end]);
        self.pos = end;
        span
    }

    /// Whole-line code states: inside or delimiting a fence, or indented.
    fn code_line(&mut self, line: &str) -> bool {
        if let Some(fence) = self.fence {
            if closes_fence(line, fence) {
                self.fence = None;
            }
            return true;
        }
        if let Some(fence) = opens_fence(line) {
            self.fence = Some(fence);
            return true;
        }
        is_indented_code(line)
    }
}

impl<'a> Iterator for SpanLexer<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Span<'a>> {
        let src = self.src;
        if self.pos >= src.len() {
            return None;
        }
        let line_end = self.line_end();
        if self.at_line_start() && self.code_line(&src[self.pos..line_end]) {
            return Some(self.take(line_end, Span::Verbatim));
        }

        let bytes = src.as_bytes();
        let start = self.pos;
        let mut i = start;
        while i < line_end {
            match bytes[i] {
                b'`' => {
                    let run = count_run(bytes, i, b'`', line_end);
                    match find_closing_ticks(bytes, i + run, run, line_end) {
                        Some(_) if i > start => return Some(self.take(i, Span::Text)),
                        Some(end) => return Some(self.take(end, Span::Verbatim)),
                        None => i += run,
                    }
                }
                b'[' if bytes.get(i + 1) == Some(&b'[') => match parse_bracket(src, i, line_end) {
                    Some(_) if i > start => return Some(self.take(i, Span::Text)),
                    Some((span, end)) => {
                        self.pos = end;
                        return Some(span);
                    }
                    None => i += 1,
                },
                b']' if i + 1 < line_end && bytes[i + 1] == b'(' => match src[i + 2..line_end].find(')') {
                    Some(_) if i > start => return Some(self.take(i, Span::Text)),
                    Some(close) => return Some(self.take(i + 2 + close + 1, Span::Verbatim)),
                    None => i += 1,
                },
                b'<' => match angle_span_end(bytes, i, line_end) {
                    Some(_) if i > start => return Some(self.take(i, Span::Text)),
                    Some(end) => return Some(self.take(end, Span::Verbatim)),
                    None => i += 1,
                },
                b if is_word_byte(b) => {
                    let run_end = (i..line_end).find(|&j| !is_word_byte(bytes[j])).unwrap_or(line_end);
                    let boundary = i == 0 || !is_word_byte(bytes[i - 1]);
                    if boundary && is_camel_case(&src[i..run_end]) {
                        if i > start {
                            return Some(self.take(i, Span::Text));
                        }
                        return Some(self.take(run_end, Span::WikiWord));
                    }
                    i = run_end;
                }
                _ => i += 1,
            }
        }
        Some(self.take(line_end, Span::Text))
    }
}

/// True for two or more concatenated capitalized humps, e.g. `WikiWord`.
///
/// A hump is an ASCII capital followed by an optional run of lowercase
/// letters and digits that contains at least one lowercase letter.
pub fn is_camel_case(word: &str) -> bool {
    let bytes = word.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_uppercase) {
        return false;
    }
    let mut humps = 0;
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_uppercase() {
            return false;
        }
        let tail_start = i + 1;
        let mut j = tail_start;
        while j < bytes.len() && (bytes[j].is_ascii_lowercase() || bytes[j].is_ascii_digit()) {
            j += 1;
        }
        let tail = &bytes[tail_start..j];
        if !tail.is_empty() && !tail.iter().any(u8::is_ascii_lowercase) {
            return false;
        }
        humps += 1;
        i = j;
    }
    humps >= 2
}

/// True if `page` can appear inside `[[ ]]`: a letter, then letters, digits,
/// `_`, `-` or spaces.
fn is_page_ref(page: &str) -> bool {
    let mut bytes = page.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b' '))
}

/// Parse a `[[...]]` reference starting at `open`; returns the span and the
/// offset just past the closing brackets.
fn parse_bracket(src: &str, open: usize, line_end: usize) -> Option<(Span<'_>, usize)> {
    let inner_start = open + 2;
    let close = inner_start + src[inner_start..line_end].find("]]")?;
    let inner = &src[inner_start..close];
    if inner.contains('[') {
        return None;
    }

    let inner = inner.trim_matches(' ');
    let (no_link, body) = match inner.strip_prefix('?') {
        Some(rest) => (true, rest.trim_start_matches(' ')),
        None => (false, inner),
    };
    let (page, text) = match body.split_once('|') {
        Some((page, text)) => (page.trim_matches(' '), Some(text.trim_matches(' '))),
        None => (body, None),
    };
    if !is_page_ref(page) || text.is_some_and(str::is_empty) {
        return None;
    }

    let span = if no_link { Span::NoLink(page) } else { Span::PageRef { page, text } };
    Some((span, close + 2))
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn count_run(bytes: &[u8], from: usize, byte: u8, limit: usize) -> usize {
    bytes[from..limit].iter().take_while(|&&b| b == byte).count()
}

/// End offset of a backtick run of exactly `len` starting at or after `from`
fn find_closing_ticks(bytes: &[u8], from: usize, len: usize, limit: usize) -> Option<usize> {
    let mut i = from;
    while i < limit {
        if bytes[i] == b'`' {
            let run = count_run(bytes, i, b'`', limit);
            if run == len {
                return Some(i + run);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}

/// End of an autolink (`<https://...>`) or HTML tag (`<span ...>`, `</p>`)
/// opening at `open`; it must close on the same line.
fn angle_span_end(bytes: &[u8], open: usize, limit: usize) -> Option<usize> {
    let mut i = open + 1;
    if i < limit && bytes[i] == b'/' {
        i += 1;
    }
    if i >= limit || !bytes[i].is_ascii_alphabetic() {
        return None;
    }
    let close = i + bytes[i..limit].iter().position(|&b| b == b'>' || b == b'<')?;
    (bytes[close] == b'>').then_some(close + 1)
}

pub(super) fn opens_fence(line: &str) -> Option<Fence> {
    let trimmed = strip_fence_indent(line)?;
    let marker = *trimmed.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = count_run(trimmed.as_bytes(), 0, marker, trimmed.len());
    // a backtick fence's info string cannot itself hold backticks
    if marker == b'`' && trimmed[len..].contains('`') {
        return None;
    }
    (len >= 3).then_some(Fence { marker, len })
}

pub(super) fn closes_fence(line: &str, fence: Fence) -> bool {
    let Some(trimmed) = strip_fence_indent(line) else {
        return false;
    };
    let len = count_run(trimmed.as_bytes(), 0, fence.marker, trimmed.len());
    len >= fence.len && trimmed[len..].trim().is_empty()
}

/// Fences may be indented by at most three spaces
fn strip_fence_indent(line: &str) -> Option<&str> {
    let indent = line.bytes().take_while(|&b| b == b' ').count();
    (indent <= 3).then(|| &line[indent..])
}

fn is_indented_code(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}
