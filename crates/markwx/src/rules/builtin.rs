//! Built-in attribute rewriting rules.

use markwx_core::{Element, LinkTarget, Node};

use super::{Filter, Rule};

/// Tags whose `src`/`href` are passed through the resolver
const TARGET_TAGS: &[&str] = &[
    "a", "img", "video", "audio", "source", "track", "embed", "picture",
];

/// Placeholder left in `src` when an image is lazy-loaded
pub const LAZY_PLACEHOLDER: &str = "";

/// Create all built-in rules, in application order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        resolve_target_rule(),
        lazy_image_rule(),
        link_target_rule(),
        code_language_rule(),
    ]
}

fn resolve_target_rule() -> Rule {
    Rule::for_tags(TARGET_TAGS, |el, options| {
        for name in ["src", "href"] {
            let resolved = el.attr(name).map(|target| options.resolve(target));
            if let Some(resolved) = resolved {
                el.set_attr(name, resolved);
            }
        }
    })
}

fn lazy_image_rule() -> Rule {
    Rule::new(
        Filter::predicate(|el, options| {
            options.lazy_load_images && el.tag == "img" && el.has_attr("src")
        }),
        |el, _| {
            let src = el.attr("src").unwrap_or_default().to_string();
            el.set_attr("src", LAZY_PLACEHOLDER);
            el.set_attr("data-src", src);
            el.set_attr("data-lazy", "true");
        },
    )
}

fn link_target_rule() -> Rule {
    Rule::for_tag("a", |el, options| match options.link_target {
        LinkTarget::External => {
            el.set_attr("data-external", "true");
            el.set_attr("target", "_blank");
        }
        LinkTarget::Default => {
            if el.attr("href").is_some_and(is_absolute_http) {
                el.set_attr("data-external", "true");
            }
        }
    })
}

fn code_language_rule() -> Rule {
    Rule::new(
        Filter::predicate(|el, options| {
            options.code_highlight && matches!(el.tag.as_str(), "code" | "pre")
        }),
        |el, _| {
            if el.has_attr("language") {
                return;
            }
            let language = code_language(el).or_else(|| {
                // `<pre><code class="language-x">` carries it on the child
                el.children
                    .iter()
                    .filter_map(Node::as_element)
                    .find(|child| child.tag == "code")
                    .and_then(code_language)
            });
            if let Some(language) = language {
                el.set_attr("language", language);
            }
        },
    )
}

/// Language named by a `language-x`/`lang-x` class or a `lang`/`data-lang`
/// attribute.
pub fn code_language(el: &Element) -> Option<String> {
    let from_class = el.attr("class").and_then(|classes| {
        classes.split_ascii_whitespace().find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
        })
    });

    from_class
        .or_else(|| el.attr("lang").filter(|lang| !lang.is_empty()))
        .or_else(|| el.attr("data-lang").filter(|lang| !lang.is_empty()))
        .map(str::to_string)
}

fn is_absolute_http(href: &str) -> bool {
    let href = href.trim_start();
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use markwx_core::ParseOptions;

    fn run(el: &mut Element, options: &ParseOptions) {
        for rule in builtin_rules() {
            rule.apply(el, options);
        }
    }

    fn element(tag: &str, attrs: &[(&str, &str)]) -> Element {
        let mut el = Element::new(tag);
        for (name, value) in attrs {
            el.set_attr(name, *value);
        }
        el
    }

    #[test]
    fn test_resolver_applied_to_src_and_href() {
        let options = ParseOptions::default().with_resolver(|t| format!("/static/{t}"));

        let mut img = element("img", &[("src", "a.png")]);
        run(&mut img, &options);
        assert_eq!(img.attr("src"), Some("/static/a.png"));

        let mut a = element("a", &[("href", "page")]);
        run(&mut a, &options);
        assert_eq!(a.attr("href"), Some("/static/page"));

        let mut div = element("div", &[("src", "x")]);
        run(&mut div, &options);
        assert_eq!(div.attr("src"), Some("x"));
    }

    #[test]
    fn test_lazy_image() {
        let options = ParseOptions {
            lazy_load_images: true,
            ..Default::default()
        };
        let mut img = element("img", &[("src", "pic.png"), ("alt", "alt")]);
        run(&mut img, &options);

        assert_eq!(img.attr("src"), Some(LAZY_PLACEHOLDER));
        assert_eq!(img.attr("data-src"), Some("pic.png"));
        assert_eq!(img.attr("data-lazy"), Some("true"));
        // `src` keeps its position
        assert_eq!(img.attrs.get_index_of("src"), Some(0));
    }

    #[test]
    fn test_lazy_image_resolves_first() {
        let options = ParseOptions {
            lazy_load_images: true,
            ..Default::default()
        }
        .with_resolver(|t| format!("cdn/{t}"));
        let mut img = element("img", &[("src", "pic.png")]);
        run(&mut img, &options);
        assert_eq!(img.attr("data-src"), Some("cdn/pic.png"));
    }

    #[test]
    fn test_eager_image_untouched() {
        let mut img = element("img", &[("src", "pic.png")]);
        run(&mut img, &ParseOptions::default());
        assert_eq!(img.attr("src"), Some("pic.png"));
        assert!(!img.has_attr("data-src"));
    }

    #[test]
    fn test_link_target_default() {
        let options = ParseOptions::default();

        let mut external = element("a", &[("href", "HTTPS://example.com")]);
        run(&mut external, &options);
        assert_eq!(external.attr("data-external"), Some("true"));
        assert!(!external.has_attr("target"));

        let mut local = element("a", &[("href", "/docs")]);
        run(&mut local, &options);
        assert!(!local.has_attr("data-external"));
    }

    #[test]
    fn test_link_target_external() {
        let options = ParseOptions {
            link_target: LinkTarget::External,
            ..Default::default()
        };
        let mut a = element("a", &[("href", "/docs")]);
        run(&mut a, &options);
        assert_eq!(a.attr("data-external"), Some("true"));
        assert_eq!(a.attr("target"), Some("_blank"));
    }

    #[test]
    fn test_code_language() {
        let options = ParseOptions::default();

        let mut code = element("code", &[("class", "hljs language-rust")]);
        run(&mut code, &options);
        assert_eq!(code.attr("language"), Some("rust"));

        let mut code = element("code", &[("data-lang", "js")]);
        run(&mut code, &options);
        assert_eq!(code.attr("language"), Some("js"));

        let mut pre = Element::new("pre");
        pre.children
            .push(Node::element_with_attrs("code", vec![("class", "lang-py")]));
        run(&mut pre, &options);
        assert_eq!(pre.attr("language"), Some("py"));

        let mut plain = element("code", &[("class", "language-")]);
        run(&mut plain, &options);
        assert!(!plain.has_attr("language"));
    }

    #[test]
    fn test_code_language_disabled() {
        let options = ParseOptions {
            code_highlight: false,
            ..Default::default()
        };
        let mut code = element("code", &[("class", "language-rust")]);
        run(&mut code, &options);
        assert!(!code.has_attr("language"));
    }
}
