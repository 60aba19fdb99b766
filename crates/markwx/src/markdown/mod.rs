//! Markdown → HTML-like text in the tokenizer's vocabulary.
//!
//! Line breaks are handled in two stages. First, every run of blank lines
//! collapses into a single paragraph break ([`collapse_blank_lines`]). Then,
//! while blocks are converted, each remaining single break inside a paragraph
//! becomes an explicit `<br/>`. Block boundaries themselves emit no breaks, and
//! fenced code keeps its content verbatim through both stages.
//!
//! Malformed markdown never fails: a delimiter without a partner is emitted as
//! literal text, and stray `<`, `>` and `&` are escaped, so the output is
//! always safe to tokenize.

mod block;
mod inline;

use once_cell::sync::Lazy;
use regex::Regex;

pub use inline::render_inline;

/// Opening code fence: marker run and info string
static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})(.*)$").expect("valid regex"));

/// Convert markdown to HTML-like text.
///
/// ```rust
/// use markwx::normalize;
///
/// assert_eq!(normalize("# Title\n\nbody line"), "<h1>Title</h1><p>body line</p>");
/// assert_eq!(normalize("line1\nline2"), "<p>line1<br/>line2</p>");
/// ```
pub fn normalize(markdown: &str) -> String {
    let source = collapse_blank_lines(markdown);
    if source.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = source.split('\n').collect();
    block::render_blocks(&lines, 0)
}

/// Unify line endings and collapse each run of blank (or whitespace-only)
/// lines into a single empty line. Leading and trailing blank lines are
/// dropped. Lines inside fenced code are left alone.
pub fn collapse_blank_lines(markdown: &str) -> String {
    let unified = markdown.replace("\r\n", "\n").replace('\r', "\n");

    let mut out: Vec<&str> = Vec::new();
    let mut pending_break = false;
    let mut fence: Option<Fence> = None;

    for line in unified.split('\n') {
        if let Some(open) = &fence {
            if open.is_closed_by(line) {
                fence = None;
            }
            out.push(line);
            continue;
        }

        if line.trim().is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if pending_break {
            out.push("");
            pending_break = false;
        }
        fence = Fence::open(line);
        out.push(line);
    }

    out.join("\n")
}

/// An open code fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence {
    marker: char,
    len: usize,
    /// First word of the info string
    language: Option<String>,
}

impl Fence {
    pub(crate) fn open(line: &str) -> Option<Self> {
        let caps = FENCE_OPEN.captures(line)?;
        let run = caps.get(1)?.as_str();
        let info = caps.get(2).map_or("", |m| m.as_str()).trim();
        let marker = run.chars().next()?;
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some(Self {
            marker,
            len: run.len(),
            language: info.split_whitespace().next().map(str::to_string),
        })
    }

    pub(crate) fn is_closed_by(&self, line: &str) -> bool {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return false;
        }
        let rest = line.trim();
        let run = rest.chars().take_while(|&c| c == self.marker).count();
        run >= self.len && run == rest.chars().count()
    }

    pub(crate) fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}
