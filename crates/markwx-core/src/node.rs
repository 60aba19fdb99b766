//! Render tree handed to the host renderer.
//!
//! The tree is a closed enum: a single [`Node::Root`], [`Node::Element`]s and
//! [`Node::Text`] leaves. Parents own their children outright; there are no
//! parent pointers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tags::{self, Display, SemanticClass};

/// A node of the render tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    /// Implicit document root
    Root { children: Vec<Node> },
    Element(Element),
    Text(Text),
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Lowercase tag name, always present in the presentation table
    pub tag: String,
    /// Attributes in source order
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
    /// Presentation category
    pub class: SemanticClass,
}

/// A text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

impl Element {
    /// Create an element with the table's default class for `tag`.
    pub fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let class = tags::presentation(&tag).unwrap_or(SemanticClass::InlineContainer);
        Self {
            tag,
            attrs: IndexMap::new(),
            children: Vec::new(),
            class,
        }
    }

    pub fn with_attrs(tag: &str, attrs: IndexMap<String, String>) -> Self {
        Self {
            attrs,
            ..Self::new(tag)
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Remove an attribute, preserving the order of the others
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.shift_remove(name)
    }

    /// Whether the tag is an HTML void element
    pub fn is_void(&self) -> bool {
        tags::is_void(&self.tag)
    }
}

impl Node {
    /// Create an empty root
    pub fn root() -> Self {
        Node::Root {
            children: Vec::new(),
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Node::Element(Element::new(tag))
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag: &str, attrs: Vec<(&str, &str)>) -> Self {
        let attrs = attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Node::Element(Element::with_attrs(tag, attrs))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Node::Text(Text {
            content: content.to_string(),
        })
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Node::Root { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Tag name of an element; `None` for root and text
    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    /// Get an attribute value by name (elements only)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element()?.attr(name)
    }

    pub fn semantic_class(&self) -> SemanticClass {
        match self {
            Node::Root { .. } => SemanticClass::Root,
            Node::Element(el) => el.class,
            Node::Text(_) => SemanticClass::Text,
        }
    }

    /// Child nodes; empty for text
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children } => children,
            Node::Element(el) => &el.children,
            Node::Text(_) => &[],
        }
    }

    /// Mutable child list; `None` for text
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root { children } => Some(children),
            Node::Element(el) => Some(&mut el.children),
            Node::Text(_) => None,
        }
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children().iter().filter_map(Node::as_element)
    }

    /// Append a child. Text is merged into a trailing text sibling and empty
    /// text is dropped, so a tree built through this never holds adjacent or
    /// empty text nodes. Appending to a text node is a no-op.
    pub fn add_child(&mut self, child: Node) {
        let Some(children) = self.children_mut() else {
            return;
        };
        match child {
            Node::Text(text) => {
                if text.content.is_empty() {
                    return;
                }
                if let Some(Node::Text(last)) = children.last_mut() {
                    last.content.push_str(&text.content);
                } else {
                    children.push(Node::Text(text));
                }
            }
            other => children.push(other),
        }
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in self.descendants() {
            if let Node::Text(text) = node {
                out.push_str(&text.content);
            }
        }
        out
    }

    /// Readable text of the subtree, for previews and search.
    ///
    /// Unlike [`Node::text_content`], block-level elements, `br` and `hr` start
    /// a new line, so `<h1>Title</h1><p>body</p>` reads `"Title\nbody"`.
    /// Media contributes nothing and the result is trimmed.
    pub fn plain_text(&self) -> String {
        enum Step<'a> {
            Visit(&'a Node),
            Break,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Visit(self)];
        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Visit(node) => node,
                Step::Break => {
                    push_line_break(&mut out);
                    continue;
                }
            };
            match node {
                Node::Text(text) => out.push_str(&text.content),
                Node::Root { children } => stack.extend(children.iter().rev().map(Step::Visit)),
                Node::Element(el) => match el.class {
                    SemanticClass::LineBreak | SemanticClass::HorizontalRule => {
                        push_line_break(&mut out)
                    }
                    class if class.display() == Display::Block => {
                        push_line_break(&mut out);
                        stack.push(Step::Break);
                        stack.extend(el.children.iter().rev().map(Step::Visit));
                    }
                    _ => stack.extend(el.children.iter().rev().map(Step::Visit)),
                },
            }
        }
        out.trim().to_string()
    }

    /// Pre-order iterator over this node and everything below it.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Number of nodes in the subtree, this one included
    pub fn node_count(&self) -> usize {
        self.descendants().count()
    }

    /// Longest chain of nested elements below (and including) this node.
    ///
    /// Root and text nodes do not count; `<div><p>x</p></div>` has depth 2.
    pub fn element_depth(&self) -> usize {
        let own = usize::from(self.is_element());
        let mut max = own;
        let mut stack: Vec<(&Node, usize)> = self.children().iter().map(|c| (c, own)).collect();
        while let Some((node, above)) = stack.pop() {
            let depth = above + usize::from(node.is_element());
            max = max.max(depth);
            stack.extend(node.children().iter().map(|c| (c, depth)));
        }
        max
    }
}

fn push_line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// See [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element() {
        let node = Node::element("DIV");
        assert!(node.is_element());
        assert_eq!(node.tag_name(), Some("div"));
        assert_eq!(node.semantic_class(), SemanticClass::BlockContainer);
    }

    #[test]
    fn test_create_text() {
        let node = Node::text("Hello World");
        assert!(node.is_text());
        assert_eq!(node.text_content(), "Hello World");
        assert_eq!(node.semantic_class(), SemanticClass::Text);
    }

    #[test]
    fn test_attributes() {
        let node = Node::element_with_attrs(
            "a",
            vec![("href", "https://example.com"), ("title", "Example")],
        );
        assert_eq!(node.attr("href"), Some("https://example.com"));
        assert_eq!(node.attr("title"), Some("Example"));
        assert_eq!(node.attr("class"), None);
    }

    #[test]
    fn test_plain_text_separates_blocks() {
        let mut root = Node::root();
        let mut h1 = Node::element("h1");
        h1.add_child(Node::text("Title"));
        root.add_child(h1);

        let mut p = Node::element("p");
        let mut b = Node::element("b");
        b.add_child(Node::text("bold"));
        p.add_child(Node::text("body "));
        p.add_child(b);
        p.add_child(Node::element("br"));
        p.add_child(Node::text("next"));
        root.add_child(p);
        root.add_child(Node::element_with_attrs("img", vec![("src", "x.png")]));
        root.add_child(Node::element("hr"));

        let mut ul = Node::element("ul");
        for item in ["one", "two"] {
            let mut li = Node::element("li");
            li.add_child(Node::text(item));
            ul.add_child(li);
        }
        root.add_child(ul);

        assert_eq!(root.plain_text(), "Title\nbody bold\nnext\none\ntwo");
        assert_eq!(root.text_content(), "Titlebody boldnextonetwo");
    }

    #[test]
    fn test_plain_text_inline_only() {
        let mut span = Node::element("span");
        span.add_child(Node::text("  a "));
        span.add_child(Node::element("em"));
        span.add_child(Node::text("b  "));
        assert_eq!(span.plain_text(), "a b");
        assert_eq!(Node::root().plain_text(), "");
    }

    #[test]
    fn test_remove_attr_keeps_order() {
        let mut node = Node::element_with_attrs("img", vec![("a", "1"), ("b", "2"), ("c", "3")]);
        let el = node.as_element_mut().unwrap();
        assert_eq!(el.remove_attr("b"), Some("2".to_string()));
        let keys: Vec<&str> = el.attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn test_add_child_merges_text() {
        let mut parent = Node::element("p");
        parent.add_child(Node::text("Hello"));
        parent.add_child(Node::text(""));
        parent.add_child(Node::text(" World"));
        parent.add_child(Node::element("br"));
        parent.add_child(Node::text("again"));

        assert_eq!(parent.children().len(), 3);
        assert_eq!(parent.children()[0], Node::text("Hello World"));
        assert_eq!(parent.element_children().count(), 1);
    }

    #[test]
    fn test_add_child_to_text_is_noop() {
        let mut text = Node::text("leaf");
        text.add_child(Node::element("b"));
        assert!(text.children().is_empty());
    }

    #[test]
    fn test_text_content() {
        let mut div = Node::element("div");
        div.add_child(Node::text("Hello "));
        let mut span = Node::element("span");
        span.add_child(Node::text("World"));
        div.add_child(span);

        assert_eq!(div.text_content(), "Hello World");
    }

    #[test]
    fn test_element_depth() {
        let mut root = Node::root();
        assert_eq!(root.element_depth(), 0);

        let mut p = Node::element("p");
        let mut b = Node::element("b");
        b.add_child(Node::text("x"));
        p.add_child(b);
        root.add_child(p);
        root.add_child(Node::element("hr"));

        assert_eq!(root.element_depth(), 2);
        assert_eq!(root.node_count(), 5);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut root = Node::root();
        let mut p = Node::element("p");
        p.add_child(Node::text("a"));
        root.add_child(p);
        root.add_child(Node::element("hr"));

        let order: Vec<SemanticClass> = root.descendants().map(Node::semantic_class).collect();
        assert_eq!(
            order,
            [
                SemanticClass::Root,
                SemanticClass::Paragraph,
                SemanticClass::Text,
                SemanticClass::HorizontalRule
            ]
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let mut p = Node::element("p");
        p.add_child(Node::text("hi"));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "element");
        assert_eq!(json["class"], "paragraph");
        assert_eq!(json["children"][0]["kind"], "text");
        assert_eq!(json["children"][0]["content"], "hi");
    }
}
