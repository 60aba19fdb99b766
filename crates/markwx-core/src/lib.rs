//! markwx-core - render tree, presentation table and options
//!
//! This crate holds the data shared by the `markwx` parsing pipeline and the
//! renderer that consumes its output.
//!
//! # Architecture
//!
//! ```text
//! Markdown ──normalize──▶ ┌───────────┐
//!                         │ tokenize  │──▶ build ──▶ classify ──▶ Node tree
//! HTML ──────────────────▶└───────────┘
//! ```
//!
//! Every element in a tree carries a [`SemanticClass`] drawn from a closed
//! vocabulary, so the renderer's class → native primitive table is total.
//!
//! # Example
//!
//! ```rust
//! use markwx_core::{serialize, Node, SemanticClass};
//!
//! let mut root = Node::root();
//! let mut p = Node::element("p");
//! p.add_child(Node::text("Hello "));
//! p.add_child(Node::text("World"));
//! root.add_child(p);
//!
//! assert_eq!(root.children()[0].semantic_class(), SemanticClass::Paragraph);
//! assert_eq!(serialize(&root), "<p>Hello World</p>");
//! ```

mod node;
mod options;
mod serialize;
pub mod tags;

pub use node::{Descendants, Element, Node, Text};
pub use options::{LinkTarget, ParseOptions, Resolver, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
pub use serialize::{escape_attr, escape_text, serialize};
pub use tags::{Display, SemanticClass};
