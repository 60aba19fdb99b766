//! Serialize a render tree back to HTML-like markup.
//!
//! The output is mainly useful for debugging and for comparing trees in
//! tests: `<b><i>hi</i></b>` is far easier to read than the nested structs.

use crate::node::{Element, Node};

enum Step<'a> {
    Enter(&'a Node),
    Close(&'a Element),
}

/// Serialize `node` and its subtree. The root itself emits nothing but its
/// children; void elements emit no closing tag.
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Enter(node)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(Node::Root { children }) => {
                stack.extend(children.iter().rev().map(Step::Enter));
            }
            Step::Enter(Node::Text(text)) => out.push_str(&escape_text(&text.content)),
            Step::Enter(Node::Element(el)) => {
                open_tag(&mut out, el);
                if el.is_void() {
                    continue;
                }
                stack.push(Step::Close(el));
                stack.extend(el.children.iter().rev().map(Step::Enter));
            }
            Step::Close(el) => {
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    out
}

fn open_tag(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
    }
    out.push('>');
}

/// Escape text content
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML attribute value
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements() {
        let mut root = Node::root();
        let mut b = Node::element("b");
        let mut i = Node::element("i");
        i.add_child(Node::text("hi"));
        b.add_child(i);
        root.add_child(b);

        assert_eq!(serialize(&root), "<b><i>hi</i></b>");
    }

    #[test]
    fn test_attributes_and_void() {
        let mut a = Node::element_with_attrs("a", vec![("href", "https://example.com")]);
        a.add_child(Node::text("Link"));
        assert_eq!(serialize(&a), "<a href=\"https://example.com\">Link</a>");

        let img = Node::element_with_attrs("img", vec![("src", "test.png"), ("alt", "")]);
        assert_eq!(serialize(&img), "<img src=\"test.png\" alt>");
    }

    #[test]
    fn test_escaping() {
        let mut p = Node::element_with_attrs("p", vec![("title", "say \"hi\"")]);
        p.add_child(Node::text("1 < 2 & 3"));
        assert_eq!(
            serialize(&p),
            "<p title=\"say &quot;hi&quot;\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(serialize(&Node::root()), "");
    }
}
