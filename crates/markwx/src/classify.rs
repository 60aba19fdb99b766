//! Semantic classification and attribute rewriting of a built tree.

use markwx_core::{tags, Node, ParseOptions, SemanticClass};
use once_cell::sync::Lazy;

use crate::rules::Rules;

pub(crate) static BUILTIN_RULES: Lazy<Rules> = Lazy::new(Rules::new);

/// Classify `tree` in place with the built-in rules.
///
/// Every element gets its [`SemanticClass`] from the presentation table, or
/// from `options.style_map` when the tag has an override, and then runs
/// through the attribute rules. Nodes are never moved or removed.
pub fn classify<'t>(tree: &'t mut Node, options: &ParseOptions) -> &'t mut Node {
    classify_with(tree, options, &BUILTIN_RULES)
}

/// Like [`classify`], with an explicit rule set.
pub fn classify_with<'t>(tree: &'t mut Node, options: &ParseOptions, rules: &Rules) -> &'t mut Node {
    let mut visited = 0usize;
    let mut stack: Vec<&mut Node> = vec![&mut *tree];

    while let Some(node) = stack.pop() {
        match node {
            Node::Root { children } => stack.extend(children.iter_mut().rev()),
            Node::Element(el) => {
                el.class = options
                    .style_for(&el.tag)
                    .or_else(|| tags::presentation(&el.tag))
                    .unwrap_or(SemanticClass::InlineContainer);
                rules.apply(el, options);
                visited += 1;
                stack.extend(el.children.iter_mut().rev());
            }
            Node::Text(_) => {}
        }
    }

    tracing::trace!(elements = visited, "classified tree");
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use markwx_core::LinkTarget;

    fn tree() -> Node {
        let mut root = Node::root();
        let mut p = Node::element("p");
        let mut a = Node::element_with_attrs("a", vec![("href", "https://example.com")]);
        a.add_child(Node::text("link"));
        p.add_child(a);
        p.add_child(Node::element_with_attrs("img", vec![("src", "pic.png")]));
        root.add_child(p);
        root
    }

    #[test]
    fn test_default_classes() {
        let mut root = tree();
        classify(&mut root, &ParseOptions::default());

        let p = &root.children()[0];
        assert_eq!(p.semantic_class(), SemanticClass::Paragraph);
        assert_eq!(p.children()[0].semantic_class(), SemanticClass::InlineLink);
        assert_eq!(p.children()[1].semantic_class(), SemanticClass::VoidMedia);
        assert_eq!(p.children()[0].attr("data-external"), Some("true"));
    }

    #[test]
    fn test_style_map_override() {
        let mut options = ParseOptions::default();
        options
            .style_map
            .insert("p".to_string(), SemanticClass::BlockContainer);

        let mut root = tree();
        classify(&mut root, &options);
        assert_eq!(root.children()[0].semantic_class(), SemanticClass::BlockContainer);
    }

    #[test]
    fn test_structure_unchanged() {
        let options = ParseOptions {
            lazy_load_images: true,
            link_target: LinkTarget::External,
            ..Default::default()
        };
        let mut root = tree();
        let before = root.node_count();
        classify(&mut root, &options);

        assert_eq!(root.node_count(), before);
        assert_eq!(root.text_content(), "link");
        let img = &root.children()[0].children()[1];
        assert_eq!(img.attr("data-src"), Some("pic.png"));
    }

    #[test]
    fn test_custom_rules() {
        let mut rules = Rules::new();
        rules.add(
            "paragraph-id",
            Rule::for_tag("p", |el, _| el.set_attr("id", "first")),
        );

        let mut root = tree();
        classify_with(&mut root, &ParseOptions::default(), &rules);
        assert_eq!(root.children()[0].attr("id"), Some("first"));
    }

    #[test]
    fn test_deep_tree() {
        let mut node = Node::text("leaf");
        for _ in 0..1_000 {
            let mut div = Node::element("div");
            div.add_child(node);
            node = div;
        }
        let mut root = Node::root();
        root.add_child(node);

        classify(&mut root, &ParseOptions::default());
        assert_eq!(root.children()[0].semantic_class(), SemanticClass::BlockContainer);
        assert_eq!(root.element_depth(), 1_000);
    }
}
