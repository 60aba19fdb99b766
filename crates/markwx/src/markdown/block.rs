//! Block structure: headings, fences, quotes, lists, tables, paragraphs.

use markwx_core::{escape_attr, escape_text, tags};
use once_cell::sync::Lazy;
use regex::Regex;

use super::inline::render_inline;
use super::Fence;

/// Quote markers nested deeper than this are kept as text
const MAX_QUOTE_DEPTH: usize = 16;

static ATX_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("valid regex")
});

static SETEXT_UNDERLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(=+|-+)[ \t]*$").expect("valid regex"));

static THEMATIC_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").expect("valid regex")
});

static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}> ?(.*)$").expect("valid regex"));

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^( *)([-*+]|\d{1,9}[.)])(?:[ \t]+(.*))?$").expect("valid regex")
});

static HTML_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}</?([a-zA-Z][a-zA-Z0-9]*)[\s/>]").expect("valid regex"));

static TABLE_DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?[ \t]*$").expect("valid regex")
});

/// Render a run of lines (no line containing `\n`) as block markup.
/// `quote_depth` counts the blockquotes these lines are nested in.
pub(crate) fn render_blocks(lines: &[&str], quote_depth: usize) -> String {
    let mut parser = BlockParser {
        lines,
        pos: 0,
        quote_depth,
        out: String::new(),
    };
    parser.run();
    parser.out
}

struct BlockParser<'a, 'l> {
    lines: &'l [&'a str],
    pos: usize,
    quote_depth: usize,
    out: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    None,
    Left,
    Center,
    Right,
}

struct ListItem<'a> {
    indent: usize,
    ordered: bool,
    start: u32,
    content: &'a str,
}

fn list_item(line: &str) -> Option<ListItem<'_>> {
    if THEMATIC_BREAK.is_match(line) {
        return None;
    }
    let caps = LIST_ITEM.captures(line)?;
    let marker = caps.get(2)?.as_str();
    let ordered = marker.as_bytes()[0].is_ascii_digit();
    let start = if ordered {
        marker[..marker.len() - 1].parse().unwrap_or(1)
    } else {
        1
    };
    Some(ListItem {
        indent: caps.get(1).map_or(0, |m| m.as_str().len()),
        ordered,
        start,
        content: caps.get(3).map_or("", |m| m.as_str()),
    })
}

fn html_block_start(line: &str) -> bool {
    HTML_BLOCK
        .captures(line)
        .and_then(|caps| caps.get(1))
        .is_some_and(|name| tags::is_block(&name.as_str().to_ascii_lowercase()))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Split a table row into trimmed cells, honoring `\|` escapes.
fn table_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = match trimmed.strip_suffix('|') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => trimmed,
    };

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = trimmed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn alignment(cell: &str) -> Align {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Align::Center,
        (true, false) => Align::Left,
        (false, true) => Align::Right,
        (false, false) => Align::None,
    }
}

impl<'a> BlockParser<'a, '_> {
    fn run(&mut self) {
        while let Some(&line) = self.lines.get(self.pos) {
            if is_blank(line) {
                self.pos += 1;
            } else if let Some(fence) = Fence::open(line) {
                self.fenced_code(fence);
            } else if let Some(caps) = ATX_HEADING.captures(line) {
                let level = caps.get(1).map_or(1, |m| m.as_str().len());
                let text = caps.get(2).map_or("", |m| m.as_str());
                self.heading(level, &render_inline(text.trim()));
                self.pos += 1;
            } else if THEMATIC_BREAK.is_match(line) {
                self.out.push_str("<hr/>");
                self.pos += 1;
            } else if BLOCKQUOTE.is_match(line) {
                self.blockquote();
            } else if self.at_table() {
                self.table();
            } else if list_item(line).is_some() {
                self.list();
            } else if html_block_start(line) {
                self.html_block();
            } else {
                self.paragraph();
            }
        }
    }

    /// Whether `line` ends a paragraph without a blank line in between.
    fn interrupts_paragraph(&self, line: &str) -> bool {
        Fence::open(line).is_some()
            || ATX_HEADING.is_match(line)
            || THEMATIC_BREAK.is_match(line)
            || BLOCKQUOTE.is_match(line)
            || list_item(line).is_some()
            || html_block_start(line)
    }

    fn heading(&mut self, level: usize, content: &str) {
        self.out.push_str(&format!("<h{level}>{content}</h{level}>"));
    }

    fn fenced_code(&mut self, fence: Fence) {
        self.pos += 1;
        let mut body: Vec<&str> = Vec::new();
        while let Some(&line) = self.lines.get(self.pos) {
            self.pos += 1;
            if fence.is_closed_by(line) {
                break;
            }
            body.push(line);
        }

        self.out.push_str("<pre><code");
        if let Some(language) = fence.language() {
            self.out.push_str(" class=\"language-");
            self.out.push_str(&escape_attr(language));
            self.out.push('"');
        }
        self.out.push('>');
        self.out.push_str(&escape_text(&body.join("\n")));
        self.out.push_str("</code></pre>");
    }

    fn blockquote(&mut self) {
        let mut inner: Vec<&str> = Vec::new();
        while let Some(&line) = self.lines.get(self.pos) {
            let Some(caps) = BLOCKQUOTE.captures(line) else {
                break;
            };
            inner.push(caps.get(1).map_or("", |m| m.as_str()));
            self.pos += 1;
        }

        if self.quote_depth >= MAX_QUOTE_DEPTH {
            let text: Vec<String> = inner.iter().map(|l| render_inline(&format!("> {l}"))).collect();
            self.out.push_str(&format!("<p>{}</p>", text.join("<br/>")));
            return;
        }

        self.out.push_str("<blockquote>");
        self.out.push_str(&render_blocks(&inner, self.quote_depth + 1));
        self.out.push_str("</blockquote>");
    }

    fn at_table(&self) -> bool {
        let Some(header) = self.lines.get(self.pos) else {
            return false;
        };
        let Some(delimiter) = self.lines.get(self.pos + 1) else {
            return false;
        };
        header.contains('|')
            && TABLE_DELIMITER.is_match(delimiter)
            && (delimiter.contains('|') || table_cells(header).len() == 1)
    }

    fn table(&mut self) {
        let header = table_cells(self.lines[self.pos]);
        let aligns: Vec<Align> = table_cells(self.lines[self.pos + 1])
            .iter()
            .map(|c| alignment(c))
            .collect();
        self.pos += 2;

        let columns = header.len();
        self.out.push_str("<table><thead>");
        self.table_row("th", &header, &aligns, columns);
        self.out.push_str("</thead>");

        let mut body_open = false;
        while let Some(&line) = self.lines.get(self.pos) {
            if is_blank(line) || !line.contains('|') {
                break;
            }
            if !body_open {
                self.out.push_str("<tbody>");
                body_open = true;
            }
            self.table_row("td", &table_cells(line), &aligns, columns);
            self.pos += 1;
        }
        if body_open {
            self.out.push_str("</tbody>");
        }
        self.out.push_str("</table>");
    }

    fn table_row(&mut self, cell_tag: &str, cells: &[String], aligns: &[Align], columns: usize) {
        self.out.push_str("<tr>");
        for col in 0..columns {
            let align = match aligns.get(col).copied().unwrap_or(Align::None) {
                Align::None => "",
                Align::Left => " align=\"left\"",
                Align::Center => " align=\"center\"",
                Align::Right => " align=\"right\"",
            };
            let content = cells.get(col).map_or(String::new(), |c| render_inline(c));
            self.out
                .push_str(&format!("<{cell_tag}{align}>{content}</{cell_tag}>"));
        }
        self.out.push_str("</tr>");
    }

    /// Collect the lines of one list block, nested lists included.
    fn list_lines(&mut self) -> Vec<&'a str> {
        let mut lines = vec![self.lines[self.pos]];
        self.pos += 1;

        while let Some(&line) = self.lines.get(self.pos) {
            if is_blank(line) {
                // A blank line continues the list only if the list goes on
                let continues = self.lines.get(self.pos + 1).is_some_and(|next| {
                    list_item(next).is_some() || next.starts_with("  ")
                });
                if !continues {
                    break;
                }
                self.pos += 1;
                continue;
            }
            let indented = line.starts_with("  ");
            if list_item(line).is_none() && !indented && self.interrupts_paragraph(line) {
                break;
            }
            lines.push(line);
            self.pos += 1;
        }
        lines
    }

    fn list(&mut self) {
        struct Level {
            indent: usize,
            ordered: bool,
        }

        fn open_list(out: &mut String, item: &ListItem<'_>) {
            if !item.ordered {
                out.push_str("<ul>");
            } else if item.start != 1 {
                out.push_str(&format!("<ol start=\"{}\">", item.start));
            } else {
                out.push_str("<ol>");
            }
        }

        fn close_level(out: &mut String, level: &Level) {
            out.push_str(if level.ordered { "</li></ol>" } else { "</li></ul>" });
        }

        let lines = self.list_lines();
        let mut stack: Vec<Level> = Vec::new();

        for line in lines {
            let Some(item) = list_item(line) else {
                // Continuation of the current item
                self.out.push_str("<br/>");
                self.out.push_str(&render_inline(line.trim()));
                continue;
            };

            let sibling = stack
                .last()
                .is_some_and(|top| item.indent < top.indent + 2);
            if sibling {
                while stack.len() > 1 && stack.last().is_some_and(|top| item.indent < top.indent) {
                    if let Some(level) = stack.pop() {
                        close_level(&mut self.out, &level);
                    }
                }
                match stack.pop() {
                    Some(level) if level.ordered == item.ordered => {
                        self.out.push_str("</li>");
                        stack.push(level);
                    }
                    Some(level) => {
                        close_level(&mut self.out, &level);
                        open_list(&mut self.out, &item);
                        stack.push(Level {
                            indent: level.indent,
                            ordered: item.ordered,
                        });
                    }
                    None => {
                        open_list(&mut self.out, &item);
                        stack.push(Level {
                            indent: item.indent,
                            ordered: item.ordered,
                        });
                    }
                }
            } else {
                open_list(&mut self.out, &item);
                stack.push(Level {
                    indent: item.indent,
                    ordered: item.ordered,
                });
            }

            self.out.push_str("<li>");
            self.out.push_str(&render_inline(item.content.trim()));
        }

        while let Some(level) = stack.pop() {
            close_level(&mut self.out, &level);
        }
    }

    fn html_block(&mut self) {
        let start = self.pos;
        while self.lines.get(self.pos).is_some_and(|l| !is_blank(l)) {
            self.pos += 1;
        }
        self.out.push_str(&self.lines[start..self.pos].join("\n"));
    }

    fn paragraph(&mut self) {
        let mut lines: Vec<&str> = vec![self.lines[self.pos]];
        self.pos += 1;

        while let Some(&line) = self.lines.get(self.pos) {
            if is_blank(line) {
                break;
            }
            if let Some(caps) = SETEXT_UNDERLINE.captures(line) {
                let level = if caps[1].starts_with('=') { 1 } else { 2 };
                let text: Vec<String> = lines.iter().map(|l| render_inline(l.trim())).collect();
                self.heading(level, &text.join("<br/>"));
                self.pos += 1;
                return;
            }
            if self.interrupts_paragraph(line) || self.at_table() {
                break;
            }
            lines.push(line);
            self.pos += 1;
        }

        let text: Vec<String> = lines.iter().map(|l| render_inline(l.trim())).collect();
        self.out.push_str("<p>");
        self.out.push_str(&text.join("<br/>"));
        self.out.push_str("</p>");
    }
}
