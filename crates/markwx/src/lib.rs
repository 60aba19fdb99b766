//! # markwx
//!
//! Parse markdown or tag-soup HTML into a bounded, typed render tree.
//!
//! The output is a [`Node`] tree whose elements all carry a [`SemanticClass`]
//! from a closed vocabulary, ready for a renderer that maps each class to a
//! native view primitive. Parsing never fails on malformed markup: unbalanced
//! tags are repaired, unknown tags are downgraded and nesting deeper than
//! [`ParseOptions::max_depth`] is kept as text.
//!
//! ## Pipeline
//!
//! ```text
//! markdown ─▶ normalize ─┐
//!                        ├─▶ tokenize ─▶ build ─▶ classify ─▶ Node
//! html ──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use markwx::{parse, serialize, ParseOptions, SemanticClass};
//!
//! let root = parse("# Title\n\nbody line", "markdown", &ParseOptions::default()).unwrap();
//! assert_eq!(serialize(&root), "<h1>Title</h1><p>body line</p>");
//! assert_eq!(root.children()[0].semantic_class(), SemanticClass::Heading);
//!
//! let root = parse("<b><i>hi</b></i>", "html", &ParseOptions::default()).unwrap();
//! assert_eq!(serialize(&root), "<b><i>hi</i></b>");
//! ```
//!
//! ## Example (service)
//!
//! ```rust
//! use markwx::{Markwx, Rule};
//!
//! let mut service = Markwx::new();
//! service
//!     .set_resolver(|target| format!("https://cdn.example.com/{target}"))
//!     .add_rule("no-referrer", Rule::for_tag("a", |el, _| {
//!         el.set_attr("rel", "noreferrer");
//!     }));
//!
//! let root = service.parse("[docs](guide.html)", "markdown").unwrap();
//! let link = &root.children()[0].children()[0];
//! assert_eq!(link.attr("href"), Some("https://cdn.example.com/guide.html"));
//! assert_eq!(link.attr("rel"), Some("noreferrer"));
//! ```

mod builder;
mod classify;
mod entities;
pub mod markdown;
mod rules;
mod service;
mod token;
mod tokenizer;

pub use builder::{build, build_with_warnings, TreeBuilder, Warning};
pub use classify::{classify, classify_with};
pub use entities::decode_entities;
pub use markdown::normalize;
pub use rules::{code_language, Filter, RewriteFn, Rule, Rules, LAZY_PLACEHOLDER};
pub use service::{Markwx, Mode, Parsed};
pub use token::{Attributes, Token};
pub use tokenizer::{tokenize, Tokenizer};

pub use markwx_core::{
    escape_attr, escape_text, serialize, tags, Display, Element, LinkTarget, Node, ParseOptions,
    Resolver, SemanticClass, Text, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT,
};

/// Error type for markwx operations
#[derive(Debug, thiserror::Error)]
pub enum MarkwxError {
    #[error("Invalid type, only markdown and html are supported: {0:?}")]
    InvalidMode(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MarkwxError>;

/// Parse `input` with the built-in rules.
///
/// `mode` must be exactly `"markdown"` or `"html"`; any other value, including
/// other casings, fails with [`MarkwxError::InvalidMode`] before anything is
/// parsed. Nothing else can fail.
pub fn parse(input: &str, mode: &str, options: &ParseOptions) -> Result<Node> {
    let mode: Mode = mode.parse()?;
    Ok(service::run(input, mode, options, &classify::BUILTIN_RULES).root)
}

/// Plain text of a markdown document, for previews and search.
///
/// Markup is removed, link labels are kept, images are dropped and every
/// block-level element starts a new line. See [`Node::plain_text`].
///
/// ```rust
/// let text = markwx::markdown_to_text("# Title\n\nSome **bold** [link](x.html)");
/// assert_eq!(text, "Title\nSome bold link");
/// ```
pub fn markdown_to_text(input: &str) -> String {
    let options = ParseOptions::default();
    service::run(input, Mode::Markdown, &options, &classify::BUILTIN_RULES)
        .root
        .plain_text()
}

/// Load [`ParseOptions`] from JSON, mapping failures to
/// [`MarkwxError::InvalidOptions`].
pub fn options_from_json(json: &str) -> Result<ParseOptions> {
    Ok(ParseOptions::from_json(json)?)
}
