//! Static tag → presentation table.
//!
//! The table is built once on first use and never mutated afterwards, so it can
//! be read from any number of threads without synchronization.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// How a renderer lays a node out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Display {
    Block,
    Inline,
    /// Never has children.
    Void,
    Text,
}

/// Presentation category of a node.
///
/// This is the complete vocabulary a renderer has to map onto its native
/// primitives; every node in a parsed tree carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticClass {
    Root,
    Text,
    BlockContainer,
    Paragraph,
    Heading,
    Blockquote,
    List,
    ListItem,
    CodeBlock,
    InlineCode,
    Table,
    TableSection,
    TableRow,
    TableCell,
    InlineContainer,
    InlineEmphasis,
    InlineStrong,
    InlineLink,
    LineBreak,
    HorizontalRule,
    VoidMedia,
    Media,
}

impl SemanticClass {
    /// Every class, in declaration order.
    pub const ALL: [SemanticClass; 22] = [
        SemanticClass::Root,
        SemanticClass::Text,
        SemanticClass::BlockContainer,
        SemanticClass::Paragraph,
        SemanticClass::Heading,
        SemanticClass::Blockquote,
        SemanticClass::List,
        SemanticClass::ListItem,
        SemanticClass::CodeBlock,
        SemanticClass::InlineCode,
        SemanticClass::Table,
        SemanticClass::TableSection,
        SemanticClass::TableRow,
        SemanticClass::TableCell,
        SemanticClass::InlineContainer,
        SemanticClass::InlineEmphasis,
        SemanticClass::InlineStrong,
        SemanticClass::InlineLink,
        SemanticClass::LineBreak,
        SemanticClass::HorizontalRule,
        SemanticClass::VoidMedia,
        SemanticClass::Media,
    ];

    pub fn display(self) -> Display {
        match self {
            SemanticClass::Root
            | SemanticClass::BlockContainer
            | SemanticClass::Paragraph
            | SemanticClass::Heading
            | SemanticClass::Blockquote
            | SemanticClass::List
            | SemanticClass::ListItem
            | SemanticClass::CodeBlock
            | SemanticClass::Table
            | SemanticClass::TableSection
            | SemanticClass::TableRow
            | SemanticClass::TableCell
            | SemanticClass::Media => Display::Block,
            SemanticClass::InlineCode
            | SemanticClass::InlineContainer
            | SemanticClass::InlineEmphasis
            | SemanticClass::InlineStrong
            | SemanticClass::InlineLink => Display::Inline,
            SemanticClass::LineBreak | SemanticClass::HorizontalRule | SemanticClass::VoidMedia => {
                Display::Void
            }
            SemanticClass::Text => Display::Text,
        }
    }

    /// Kebab-case name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticClass::Root => "root",
            SemanticClass::Text => "text",
            SemanticClass::BlockContainer => "block-container",
            SemanticClass::Paragraph => "paragraph",
            SemanticClass::Heading => "heading",
            SemanticClass::Blockquote => "blockquote",
            SemanticClass::List => "list",
            SemanticClass::ListItem => "list-item",
            SemanticClass::CodeBlock => "code-block",
            SemanticClass::InlineCode => "inline-code",
            SemanticClass::Table => "table",
            SemanticClass::TableSection => "table-section",
            SemanticClass::TableRow => "table-row",
            SemanticClass::TableCell => "table-cell",
            SemanticClass::InlineContainer => "inline-container",
            SemanticClass::InlineEmphasis => "inline-emphasis",
            SemanticClass::InlineStrong => "inline-strong",
            SemanticClass::InlineLink => "inline-link",
            SemanticClass::LineBreak => "line-break",
            SemanticClass::HorizontalRule => "horizontal-rule",
            SemanticClass::VoidMedia => "void-media",
            SemanticClass::Media => "media",
        }
    }
}

impl std::fmt::Display for SemanticClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag every element is rewritten to when its own name is not in the table.
pub const FALLBACK_TAG: &str = "span";

/// Void (childless) HTML elements.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Elements whose whole subtree is dropped from the output.
pub const DISCARDED_ELEMENTS: &[&str] = &[
    "base", "head", "link", "meta", "script", "style", "template", "title",
];

/// Elements whose content is raw text up to their own close tag.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

static PRESENTATION: Lazy<IndexMap<&'static str, SemanticClass>> = Lazy::new(|| {
    use SemanticClass::*;

    let groups: &[(SemanticClass, &[&'static str])] = &[
        (
            BlockContainer,
            &[
                "html", "body", "div", "section", "article", "header", "footer", "nav",
                "main", "aside", "figure", "figcaption", "address", "center", "details",
                "summary", "dl", "dt", "dd", "form", "fieldset", "caption",
            ],
        ),
        (Paragraph, &["p"]),
        (Heading, &["h1", "h2", "h3", "h4", "h5", "h6"]),
        (Blockquote, &["blockquote"]),
        (List, &["ul", "ol"]),
        (ListItem, &["li"]),
        (CodeBlock, &["pre"]),
        (InlineCode, &["code", "kbd", "samp", "tt", "var"]),
        (Table, &["table"]),
        (TableSection, &["thead", "tbody", "tfoot"]),
        (TableRow, &["tr"]),
        (TableCell, &["th", "td"]),
        (
            InlineContainer,
            &[
                "span", "label", "small", "big", "abbr", "cite", "q", "sub", "sup", "font",
                "time", "dfn",
            ],
        ),
        (
            InlineEmphasis,
            &["em", "i", "u", "ins", "mark", "del", "s", "strike"],
        ),
        (InlineStrong, &["strong", "b"]),
        (InlineLink, &["a"]),
        (LineBreak, &["br", "wbr"]),
        (HorizontalRule, &["hr"]),
        (VoidMedia, &["img", "embed", "source", "track"]),
        (Media, &["video", "audio", "picture"]),
    ];

    let mut table = IndexMap::new();
    for (class, tags) in groups {
        for tag in *tags {
            table.insert(*tag, *class);
        }
    }
    table
});

/// Look up the default class of a (lowercase) tag name.
pub fn presentation(tag: &str) -> Option<SemanticClass> {
    PRESENTATION.get(tag).copied()
}

/// Check if a tag is in the presentation table
pub fn is_known(tag: &str) -> bool {
    PRESENTATION.contains_key(tag)
}

/// All known tag names, in table order.
pub fn known_tags() -> impl Iterator<Item = &'static str> {
    PRESENTATION.keys().copied()
}

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Check if a tag's subtree is dropped
pub fn is_discarded(tag: &str) -> bool {
    DISCARDED_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Check if a tag is rendered as a block
pub fn is_block(tag: &str) -> bool {
    presentation(tag).is_some_and(|class| class.display() == Display::Block)
}
