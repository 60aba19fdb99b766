//! Inline spans: code, emphasis, links, images, autolinks and inline HTML.
//!
//! Each construct needs its closing delimiter on the same line; without one
//! the opening delimiter is emitted as text. Strong, emphasis, strikethrough
//! and links each nest at most one level, which also bounds recursion.
//!
//! Bracket pairs and link destinations are indexed once per line and failed
//! closer searches are remembered, so unmatched openers cost nothing extra.

use std::collections::HashMap;

use markwx_core::{escape_attr, tags};
use once_cell::sync::Lazy;
use regex::Regex;

static AUTOLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<((?:https?://|mailto:)[^\s<>]*)>").expect("valid regex"));

// No part of a tag may contain another `<` or `>`, so a failed attempt never
// looks past the next angle bracket.
static INLINE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^</?([a-zA-Z][a-zA-Z0-9-]*)(?:\s+[^<>"']*(?:"[^"<>]*"|'[^'<>]*')?)*\s*/?>"#)
        .expect("valid regex")
});

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("valid regex")
});

/// Delimiters whose failed closer searches are remembered per line
const DELIMITERS: [&str; 5] = ["**", "__", "*", "_", "~~"];

/// Render one line (or table cell) of inline markdown.
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    Inline::new(text, Spans::default()).render(&mut out);
    out
}

/// Which span kinds are already open around the text being rendered.
#[derive(Debug, Clone, Copy, Default)]
struct Spans {
    strong: bool,
    emphasis: bool,
    strike: bool,
    link: bool,
}

/// A parsed `[label](destination "title")`.
struct Link<'t> {
    label: &'t str,
    destination: String,
    title: Option<String>,
    /// Byte offset just past the closing `)`
    end: usize,
}

/// Bracket and parenthesis structure of a line, computed once so that link
/// parsing never rescans the rest of the line.
struct LinkIndex {
    /// Offset of the `]` matching the `[` at each offset
    label_end: Vec<Option<usize>>,
    /// Where an unbracketed destination starting at each offset stops: the
    /// first space, tab or unbalanced `)`, or the end of the line
    destination_end: Vec<usize>,
}

impl LinkIndex {
    fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let n = bytes.len();

        // Escaped brackets are literal
        let mut label_end = vec![None; n];
        let mut brackets = Vec::new();
        let mut i = 0;
        while i < n {
            match bytes[i] {
                b'\\' => i += 1,
                b'[' => brackets.push(i),
                b']' => {
                    if let Some(open) = brackets.pop() {
                        label_end[open] = Some(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let mut paren_end = vec![None; n];
        let mut parens = Vec::new();
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => parens.push(i),
                b')' => {
                    if let Some(open) = parens.pop() {
                        paren_end[open] = Some(i);
                    }
                }
                _ => {}
            }
        }

        let mut destination_end = vec![n; n + 1];
        let mut next_space = n;
        for i in (0..n).rev() {
            let end = match bytes[i] {
                b' ' | b'\t' => {
                    next_space = i;
                    i
                }
                b')' => i,
                b'(' => match paren_end[i] {
                    Some(close) if close < next_space => destination_end[close + 1],
                    _ => next_space,
                },
                _ => destination_end[i + 1],
            };
            destination_end[i] = end;
        }

        Self {
            label_end,
            destination_end,
        }
    }
}

/// Renderer state for one line or nested span.
struct Inline<'t> {
    text: &'t str,
    spans: Spans,
    links: Option<LinkIndex>,
    /// Per entry of [`DELIMITERS`], the smallest offset known to have no
    /// closer after it
    exhausted: [usize; DELIMITERS.len()],
    /// Start offsets of backtick runs, by run length
    code_runs: Option<HashMap<usize, Vec<usize>>>,
    last_comment_end: Option<usize>,
}

impl<'t> Inline<'t> {
    fn new(text: &'t str, spans: Spans) -> Self {
        Self {
            text,
            spans,
            links: text.contains('[').then(|| LinkIndex::new(text)),
            exhausted: [usize::MAX; DELIMITERS.len()],
            code_runs: None,
            last_comment_end: text.rfind("-->"),
        }
    }

    fn render(&mut self, out: &mut String) {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            let c = bytes[i];

            match c {
                b'\\' if bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) => {
                    push_escaped_char(out, bytes[i + 1] as char);
                    i += 2;
                }
                b'`' => i += self.code_span(i, out),
                b'!' if rest.starts_with("![") => match self.link_at(i + 1) {
                    Some(link) => {
                        out.push_str("<img src=\"");
                        out.push_str(&escape_attr(&link.destination));
                        out.push_str("\" alt=\"");
                        out.push_str(&escape_attr(&plain_text(link.label)));
                        out.push('"');
                        push_title(out, link.title.as_deref());
                        out.push_str("/>");
                        i = link.end;
                    }
                    None => {
                        out.push('!');
                        i += 1;
                    }
                },
                b'[' if !self.spans.link => match self.link_at(i) {
                    Some(link) => {
                        out.push_str("<a href=\"");
                        out.push_str(&escape_attr(&link.destination));
                        out.push('"');
                        push_title(out, link.title.as_deref());
                        out.push('>');
                        render_nested(link.label, Spans { link: true, ..self.spans }, out);
                        out.push_str("</a>");
                        i = link.end;
                    }
                    None => {
                        out.push('[');
                        i += 1;
                    }
                },
                b'<' => i += self.angle(i, out),
                b'>' => {
                    out.push_str("&gt;");
                    i += 1;
                }
                b'&' => {
                    match ENTITY.find(rest) {
                        Some(m) => {
                            out.push_str(m.as_str());
                            i += m.end();
                        }
                        None => {
                            out.push_str("&amp;");
                            i += 1;
                        }
                    }
                }
                b'*' | b'_' => i += self.emphasis(i, out),
                b'~' if rest.starts_with("~~") && !self.spans.strike => {
                    match self.closing(i + 2, "~~") {
                        Some(close) => {
                            out.push_str("<del>");
                            let spans = Spans { strike: true, ..self.spans };
                            render_nested(&text[i + 2..close], spans, out);
                            out.push_str("</del>");
                            i = close + 2;
                        }
                        None => {
                            out.push_str("~~");
                            i += 2;
                        }
                    }
                }
                _ => {
                    // Copy the whole char; `i` stays on a char boundary
                    let len = rest.chars().next().map_or(1, char::len_utf8);
                    out.push_str(&rest[..len]);
                    i += len;
                }
            }
        }
    }

    /// Handle a `*`/`_` run starting at `i`; returns bytes consumed.
    fn emphasis(&mut self, i: usize, out: &mut String) -> usize {
        let text = self.text;
        let bytes = text.as_bytes();
        let marker = bytes[i];
        let run = bytes[i..].iter().take_while(|&&b| b == marker).count();

        // `snake_case` words are not emphasis
        let intraword = marker == b'_'
            && text[..i]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);

        if !intraword {
            if run >= 2 && !self.spans.strong {
                let delim = if marker == b'*' { "**" } else { "__" };
                if let Some(close) = self.closing(i + 2, delim) {
                    out.push_str("<strong>");
                    let spans = Spans { strong: true, ..self.spans };
                    render_nested(&text[i + 2..close], spans, out);
                    out.push_str("</strong>");
                    return close + 2 - i;
                }
            }
            if run == 1 && !self.spans.emphasis {
                let delim = if marker == b'*' { "*" } else { "_" };
                if let Some(close) = self.closing(i + 1, delim) {
                    out.push_str("<em>");
                    let spans = Spans { emphasis: true, ..self.spans };
                    render_nested(&text[i + 1..close], spans, out);
                    out.push_str("</em>");
                    return close + 1 - i;
                }
            }
        }

        out.push_str(&text[i..i + run]);
        run
    }

    /// Handle a `<` at `at`; returns bytes consumed.
    fn angle(&self, at: usize, out: &mut String) -> usize {
        let rest = &self.text[at..];
        if !self.spans.link {
            if let Some(caps) = AUTOLINK.captures(rest) {
                let target = caps.get(1).map_or("", |m| m.as_str());
                out.push_str("<a href=\"");
                out.push_str(&escape_attr(target));
                out.push_str("\">");
                out.push_str(&escape_attr(target));
                out.push_str("</a>");
                return caps.get(0).map_or(1, |m| m.end());
            }
        }
        if rest.starts_with("<!--") && self.last_comment_end.is_some_and(|end| end >= at + 4) {
            if let Some(rel) = rest[4..].find("-->") {
                let len = 4 + rel + 3;
                out.push_str(&rest[..len]);
                return len;
            }
        }
        if let Some(caps) = INLINE_TAG.captures(rest) {
            let name = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
            if tags::is_known(&name) {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                out.push_str(whole);
                return whole.len();
            }
        }
        out.push_str("&lt;");
        1
    }

    /// Code span opening with the backtick run at `at`. Returns bytes
    /// consumed.
    fn code_span(&mut self, at: usize, out: &mut String) -> usize {
        let text = self.text;
        let run = text[at..].bytes().take_while(|&b| b == b'`').count();
        let runs = self.code_runs.get_or_insert_with(|| backtick_runs(text));
        let close = runs.get(&run).and_then(|starts| {
            let next = starts.partition_point(|&start| start < at + run);
            starts.get(next).copied()
        });

        let Some(close) = close else {
            out.push_str(&text[at..at + run]);
            return run;
        };
        let mut content = &text[at + run..close];
        if content.len() >= 2 && content.starts_with(' ') && content.ends_with(' ') {
            content = &content[1..content.len() - 1];
        }
        out.push_str("<code>");
        for c in content.chars() {
            push_escaped_char(out, c);
        }
        out.push_str("</code>");
        close + run - at
    }

    /// Find the closing `delim` for content starting at `from`. The content
    /// must be non-empty and must not start or end with whitespace. A closing
    /// run longer than the delimiter closes with its last chars, so `***` can
    /// end both a strong and an emphasis span; a `**` run never closes
    /// emphasis.
    ///
    /// Only maximal runs after the opener are candidates, so a search that
    /// fails also fails from any later offset; that is remembered.
    fn closing(&mut self, from: usize, delim: &str) -> Option<usize> {
        let slot = DELIMITERS.iter().position(|d| *d == delim)?;
        if from >= self.exhausted[slot] {
            return None;
        }
        let text = self.text;
        let first = text[from..].chars().next()?;
        if first.is_whitespace() {
            return None;
        }
        let bytes = text.as_bytes();
        let marker = delim.as_bytes()[0];
        let mut search = from + first.len_utf8();
        if bytes[from] == marker {
            // Rest of the opening run
            while bytes.get(search) == Some(&marker) {
                search += 1;
            }
        }

        while let Some(rel) = text[search..].find(delim) {
            let at = search + rel;
            let run = bytes[at..].iter().take_while(|&&b| b == marker).count();
            let whitespace_before = text[..at].chars().next_back().is_some_and(char::is_whitespace);
            let strong_run = delim.len() == 1 && run == 2;

            if !whitespace_before && !strong_run {
                return Some(at + run - delim.len());
            }
            search = at + run;
        }
        self.exhausted[slot] = from;
        None
    }

    /// Parse `[label](destination "title")` with its `[` at `open`.
    fn link_at(&self, open: usize) -> Option<Link<'t>> {
        let text = self.text;
        let bytes = text.as_bytes();
        let index = self.links.as_ref()?;
        let label_end = (*index.label_end.get(open)?)?;
        if bytes.get(label_end + 1) != Some(&b'(') {
            return None;
        }

        let mut i = skip_spaces(bytes, label_end + 2);
        let destination = if bytes.get(i) == Some(&b'<') {
            let len = text[i + 1..].find(|c: char| c == '<' || c == '>')?;
            if bytes[i + 1 + len] != b'>' {
                return None;
            }
            let dest = &text[i + 1..i + 1 + len];
            i += len + 2;
            dest
        } else {
            let end = *index.destination_end.get(i)?;
            let dest = &text[i..end];
            i = end;
            dest
        };

        i = skip_spaces(bytes, i);
        let mut title = None;
        if let Some(&quote @ (b'"' | b'\'')) = bytes.get(i) {
            let len = text[i + 1..].find(quote as char)?;
            title = Some(text[i + 1..i + 1 + len].to_string());
            i = skip_spaces(bytes, i + len + 2);
        }

        if bytes.get(i) != Some(&b')') {
            return None;
        }

        Some(Link {
            label: &text[open + 1..label_end],
            destination: destination.to_string(),
            title,
            end: i + 1,
        })
    }
}

/// Render the content of a span inside the current one.
fn render_nested(text: &str, spans: Spans, out: &mut String) {
    Inline::new(text, spans).render(out);
}

/// Push a literal char, escaping markup-significant ones.
fn push_escaped_char(out: &mut String, c: char) {
    match c {
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '&' => out.push_str("&amp;"),
        _ => out.push(c),
    }
}

fn push_title(out: &mut String, title: Option<&str>) {
    if let Some(title) = title {
        out.push_str(" title=\"");
        out.push_str(&escape_attr(title));
        out.push('"');
    }
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    i
}

/// Maximal backtick runs of `text`: run length → ascending start offsets.
fn backtick_runs(text: &str) -> HashMap<usize, Vec<usize>> {
    let bytes = text.as_bytes();
    let mut runs: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let len = bytes[i..].iter().take_while(|&&b| b == b'`').count();
        runs.entry(len).or_default().push(i);
        i += len;
    }
    runs
}

/// Label text with markdown punctuation escapes removed, for `alt`.
fn plain_text(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut chars = label.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek().is_some_and(char::is_ascii_punctuation) {
            continue;
        }
        out.push(c);
    }
    out
}
