//! Rule system for attribute rewriting.

mod builtin;
mod rule;

pub use builtin::{builtin_rules, code_language, LAZY_PLACEHOLDER};
pub use rule::{Filter, RewriteFn, Rule};

use indexmap::IndexMap;
use markwx_core::{Element, ParseOptions};

/// Collection of rules applied to every element
pub struct Rules {
    /// Built-in rules (applied first)
    builtin_rules: Vec<Rule>,
    /// Custom rules added by the embedder, in insertion order
    custom_rules: IndexMap<String, Rule>,
}

impl Rules {
    /// Create a new Rules instance with the built-in rules
    pub fn new() -> Self {
        Self {
            builtin_rules: builtin_rules(),
            custom_rules: IndexMap::new(),
        }
    }

    /// Add a custom rule; a rule with the same key is replaced in place
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Remove a custom rule
    pub fn remove(&mut self, key: &str) -> Option<Rule> {
        self.custom_rules.shift_remove(key)
    }

    /// Number of custom rules
    pub fn custom_len(&self) -> usize {
        self.custom_rules.len()
    }

    /// Apply every matching rule to `element`, built-in rules first
    pub fn apply(&self, element: &mut Element, options: &ParseOptions) {
        for rule in self.builtin_rules.iter().chain(self.custom_rules.values()) {
            rule.apply(element, options);
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rules")
            .field("builtin", &self.builtin_rules.len())
            .field("custom", &self.custom_rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_rules_run_after_builtin() {
        let options = ParseOptions::default().with_resolver(|t| format!("/r/{t}"));
        let mut rules = Rules::new();
        rules.add(
            "mirror",
            Rule::for_tag("img", |el, _| {
                let src = el.attr("src").unwrap_or_default().to_string();
                el.set_attr("data-seen", src);
            }),
        );

        let mut img = Element::new("img");
        img.set_attr("src", "a.png");
        rules.apply(&mut img, &options);
        assert_eq!(img.attr("data-seen"), Some("/r/a.png"));
    }

    #[test]
    fn test_add_replaces_same_key() {
        let mut rules = Rules::new();
        rules.add("k", Rule::for_tag("p", |el, _| el.set_attr("v", "1")));
        rules.add("k", Rule::for_tag("p", |el, _| el.set_attr("v", "2")));
        assert_eq!(rules.custom_len(), 1);

        let mut p = Element::new("p");
        rules.apply(&mut p, &ParseOptions::default());
        assert_eq!(p.attr("v"), Some("2"));

        assert!(rules.remove("k").is_some());
        assert_eq!(rules.custom_len(), 0);
    }
}
