//! Pipe-table block extension.
//!
//! A table is a run of lines starting with `|`. Each cell may open with an
//! options block, a run of sigils closed by `.`:
//!
//! | sigil | effect            |
//! |-------|-------------------|
//! | `_`   | header cell       |
//! | `<` `>` `=` `#` | left, right, center, justify |
//! | `^` `~` | top, bottom     |
//! | `\N` `/N` | colspan, rowspan |
//!
//! so `|_>\2. Total |` is a right-aligned header spanning two columns.

use log::{debug, warn};

use super::lexer::{closes_fence, opens_fence};

/// A slice of wiki text that is rendered either as Markdown or as a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Block<'a> {
    Markdown(&'a str),
    Table(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Align {
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum VAlign {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct CellOptions {
    pub header: bool,
    pub align: Option<Align>,
    pub valign: Option<VAlign>,
    pub colspan: Option<u32>,
    pub rowspan: Option<u32>,
}

impl CellOptions {
    fn style(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(align) = self.align {
            let value = match align {
                Align::Left => "left",
                Align::Right => "right",
                Align::Center => "center",
                Align::Justify => "justify",
            };
            parts.push(format!("text-align: {value}"));
        }
        if let Some(valign) = self.valign {
            let value = match valign {
                VAlign::Top => "top",
                VAlign::Bottom => "bottom",
            };
            parts.push(format!("vertical-align: {value}"));
        }
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

/// Split `text` into alternating Markdown and table blocks. Lines inside
/// fenced code never start a table.
pub(super) fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut fence = None;
    let mut block_start = 0;
    let mut in_table = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let is_table_line = match fence {
            Some(open) => {
                if closes_fence(line, open) {
                    fence = None;
                }
                false
            }
            None => {
                fence = opens_fence(line);
                fence.is_none() && line.starts_with('|')
            }
        };
        if is_table_line != in_table {
            push_block(&mut blocks, &text[block_start..offset], in_table);
            block_start = offset;
            in_table = is_table_line;
        }
        offset += line.len();
    }
    push_block(&mut blocks, &text[block_start..], in_table);
    blocks
}

fn push_block<'a>(blocks: &mut Vec<Block<'a>>, text: &'a str, table: bool) {
    if text.is_empty() {
        return;
    }
    blocks.push(if table { Block::Table(text) } else { Block::Markdown(text) });
}

/// Render a table block; `render_cell` turns each cell body into HTML.
pub(super) fn render_table(block: &str, render_cell: &mut dyn FnMut(&str) -> String) -> String {
    let mut out = String::from("<table>\n");
    for line in block.lines() {
        out.push_str("<tr>");
        for (options, body) in parse_row(line) {
            let tag = if options.header { "th" } else { "td" };
            out.push('<');
            out.push_str(tag);
            if let Some(style) = options.style() {
                out.push_str(&format!(" style=\"{style}\""));
            }
            if let Some(n) = options.colspan {
                out.push_str(&format!(" colspan=\"{n}\""));
            }
            if let Some(n) = options.rowspan {
                out.push_str(&format!(" rowspan=\"{n}\""));
            }
            out.push('>');
            out.push_str(&render_cell(body));
            out.push_str(&format!("</{tag}>"));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

/// Split one table line into cells. A cell that never finds its closing `|`
/// ends the row; the cells before it are kept.
pub(super) fn parse_row(line: &str) -> Vec<(CellOptions, &str)> {
    let mut cells = Vec::new();
    let Some(mut rest) = line.trim_end().strip_prefix('|') else {
        return cells;
    };
    while !rest.trim().is_empty() {
        match find_cell_end(rest) {
            Some(end) => {
                cells.push(parse_cell(&rest[..end]));
                rest = &rest[end + 1..];
            }
            None => {
                warn!("Table row has an unterminated cell, dropping {:?}", rest.trim());
                break;
            }
        }
    }
    cells
}

/// Offset of the `|` closing the cell at the start of `rest`; pipes inside
/// `[[...]]` belong to the link.
fn find_cell_end(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'|' => return Some(i),
            b'[' if rest[i..].starts_with("[[") => match rest[i + 2..].find("]]") {
                Some(close) => i += close + 4,
                None => i += 2,
            },
            _ => i += 1,
        }
    }
    None
}

fn parse_cell(raw: &str) -> (CellOptions, &str) {
    let raw = raw.trim();
    match parse_options(raw) {
        Some((options, body)) => (options, body.trim_start()),
        None => (CellOptions::default(), raw),
    }
}

/// Parse a leading options block; `None` when the cell has none.
fn parse_options(cell: &str) -> Option<(CellOptions, &str)> {
    let bytes = cell.as_bytes();
    let mut options = CellOptions::default();
    let mut seen = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => options.header = true,
            b'<' => options.align = Some(Align::Left),
            b'>' => options.align = Some(Align::Right),
            b'=' => options.align = Some(Align::Center),
            b'#' => options.align = Some(Align::Justify),
            b'^' => options.valign = Some(VAlign::Top),
            b'~' => options.valign = Some(VAlign::Bottom),
            b'\\' | b'/' => {
                let digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
                let span: u32 = cell[i + 1..i + 1 + digits].parse().ok().filter(|&n| n > 0)?;
                if bytes[i] == b'\\' {
                    options.colspan = Some(span);
                } else {
                    options.rowspan = Some(span);
                }
                i += digits;
            }
            b'.' if seen => {
                let body = &cell[i + 1..];
                if body.is_empty() || body.starts_with(char::is_whitespace) {
                    debug!("Cell options {:?}", options);
                    return Some((options, body));
                }
                return None;
            }
            _ => return None,
        }
        seen = true;
        i += 1;
    }
    None
}
