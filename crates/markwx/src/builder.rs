//! Token stream → render tree.
//!
//! The builder keeps an explicit stack of open elements instead of recursing,
//! so neither adversarial nesting nor long inputs can exhaust the call stack.
//! Each frame owns the element being built; closing a frame appends the
//! finished element to the frame below it.
//!
//! Repairs are silent: stray close tags are dropped, crossing tags are closed
//! up to their matching ancestor, unclosed elements are closed at the end and
//! tags nested deeper than `max_depth` are kept as literal text. Every repair
//! is recorded as a [`Warning`].
//!
//! Discarded elements (`head`, `title`, `script`, ...) only take their subtree
//! with them when they actually end, by their own close tag or an implied one.
//! One that is still open when the stack unwinds hands its children back to
//! its parent, so a missing `</head>` cannot swallow the document.

use markwx_core::{tags, Element, Node, ParseOptions};

use crate::token::{Attributes, Token};

/// A markup problem that was repaired while building the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    #[error("stray closing tag </{tag}> ignored")]
    StrayCloseTag { tag: String },

    #[error("</{tag}> closed {closed} misnested element(s)")]
    MisnestedClose { tag: String, closed: usize },

    #[error("<{tag}> was never closed")]
    UnclosedAtEnd { tag: String },

    #[error("<{tag}> exceeds max depth {max_depth}, kept as text")]
    DepthExceeded { tag: String, max_depth: usize },
}

/// Build a tree from `tokens`.
pub fn build<I>(tokens: I, options: &ParseOptions) -> Node
where
    I: IntoIterator<Item = Token>,
{
    build_with_warnings(tokens, options).0
}

/// Build a tree and report every repair that was needed.
pub fn build_with_warnings<I>(tokens: I, options: &ParseOptions) -> (Node, Vec<Warning>)
where
    I: IntoIterator<Item = Token>,
{
    let mut builder = TreeBuilder::new(options);
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}

struct Frame {
    /// Tag name as written in the source; close tags match against this
    source: String,
    node: Node,
    /// Dropped instead of attached when closed
    discard: bool,
}

/// Incremental tree builder. Feed tokens with [`TreeBuilder::push`], then
/// call [`TreeBuilder::finish`].
pub struct TreeBuilder {
    max_depth: usize,
    stack: Vec<Frame>,
    /// Names of tags degraded to text whose close tag has not been seen
    degraded: Vec<String>,
    warnings: Vec<Warning>,
}

impl TreeBuilder {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            max_depth: options.depth_limit(),
            stack: vec![Frame {
                source: String::new(),
                node: Node::root(),
                discard: false,
            }],
            degraded: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Process one token
    pub fn push(&mut self, token: Token) {
        match token {
            Token::TagOpen {
                ref name,
                ref attributes,
                self_closing,
            } => {
                self.close_implied(name);
                if self.exceeds_depth(&token) {
                    return;
                }
                let element = canonical_element(name, attributes.clone());
                if self_closing || tags::is_void(name) {
                    if !tags::is_discarded(name) {
                        self.attach(Node::Element(element));
                    }
                } else {
                    self.stack.push(Frame {
                        source: name.clone(),
                        node: Node::Element(element),
                        discard: tags::is_discarded(name),
                    });
                }
            }
            Token::VoidTag {
                ref name,
                ref attributes,
            } => {
                if tags::is_discarded(name) {
                    return;
                }
                self.close_implied(name);
                if self.exceeds_depth(&token) {
                    return;
                }
                self.attach(Node::Element(canonical_element(name, attributes.clone())));
            }
            Token::TagClose { name } => self.close(&name),
            Token::Text { content } | Token::Comment { content } => {
                self.attach(Node::text(&content));
            }
        }
    }

    /// Close everything still open and return the root.
    pub fn finish(mut self) -> (Node, Vec<Warning>) {
        while self.stack.len() > 1 {
            let tag = self.stack[self.stack.len() - 1].source.clone();
            tracing::debug!(%tag, "auto-closing unclosed element at end of input");
            self.warnings.push(Warning::UnclosedAtEnd { tag });
            self.pop(false);
        }
        let root = self
            .stack
            .pop()
            .map_or_else(Node::root, |frame| frame.node);
        (root, self.warnings)
    }

    /// Depth of the open element on top of the stack; the root is 0.
    fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Degrade a tag that would nest too deep to its literal text.
    fn exceeds_depth(&mut self, token: &Token) -> bool {
        if self.depth() < self.max_depth {
            return false;
        }
        let Some(name) = token.name() else {
            return false;
        };
        tracing::debug!(tag = %name, max_depth = self.max_depth, "nesting too deep, keeping tag as text");
        self.warnings.push(Warning::DepthExceeded {
            tag: name.to_string(),
            max_depth: self.max_depth,
        });
        if let Token::TagOpen {
            self_closing: false,
            ..
        } = token
        {
            self.degraded.push(name.to_string());
        }
        self.attach(Node::text(&token.to_source()));
        true
    }

    fn close(&mut self, name: &str) {
        if self.degraded.last().is_some_and(|d| d == name) {
            self.degraded.pop();
            self.attach(Node::text(&format!("</{}>", name)));
            return;
        }

        if let Some(index) = self.stack.iter().skip(1).rposition(|f| f.source == name) {
            let index = index + 1;
            let closed = self.stack.len() - 1 - index;
            if closed > 0 {
                tracing::debug!(tag = %name, closed, "auto-closing misnested elements");
                self.warnings.push(Warning::MisnestedClose {
                    tag: name.to_string(),
                    closed,
                });
            }
            while self.stack.len() > index {
                let ended = self.stack.len() == index + 1;
                self.pop(ended);
            }
            return;
        }

        if let Some(pos) = self.degraded.iter().rposition(|d| d == name) {
            self.degraded.remove(pos);
            self.attach(Node::text(&format!("</{}>", name)));
            return;
        }

        tracing::debug!(tag = %name, "ignoring stray closing tag");
        self.warnings.push(Warning::StrayCloseTag {
            tag: name.to_string(),
        });
    }

    /// Close elements that cannot contain `opening` (`<p>a<p>b`, `<li>a<li>b`).
    fn close_implied(&mut self, opening: &str) {
        while self.depth() > 0 {
            let top = self.stack[self.stack.len() - 1].source.as_str();
            if !implies_close(top, opening) {
                break;
            }
            tracing::trace!(%top, %opening, "implied end tag");
            self.pop(true);
        }
    }

    /// Pop the top frame onto its parent. `ended` is false when the element
    /// is unwound without its own end tag.
    fn pop(&mut self, ended: bool) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if !frame.discard {
            self.attach(frame.node);
        } else if !ended && !tags::is_raw_text(&frame.source) {
            tracing::debug!(tag = %frame.source, "unclosed discarded element, keeping its content");
            if let Node::Element(element) = frame.node {
                for child in element.children {
                    self.attach(child);
                }
            }
        }
    }

    fn attach(&mut self, node: Node) {
        if let Some(top) = self.stack.last_mut() {
            top.node.add_child(node);
        }
    }
}

/// Element for a source tag. Names outside the presentation table fall back to
/// [`tags::FALLBACK_TAG`], keeping the original name in `data-tag`.
fn canonical_element(name: &str, mut attributes: Attributes) -> Element {
    if tags::is_known(name) {
        return Element::with_attrs(name, attributes);
    }
    attributes.insert("data-tag".to_string(), name.to_string());
    Element::with_attrs(tags::FALLBACK_TAG, attributes)
}

/// Whether an open `top` element ends implicitly when `opening` starts.
fn implies_close(top: &str, opening: &str) -> bool {
    match top {
        "head" => tags::is_known(opening),
        "title" => true,
        "p" => tags::is_block(opening) && !matches!(opening, "li" | "td" | "th" | "tr"),
        "li" => opening == "li",
        "dt" | "dd" => matches!(opening, "dt" | "dd"),
        "td" | "th" => matches!(opening, "td" | "th" | "tr"),
        "tr" => opening == "tr",
        _ => false,
    }
}
