//! Rule and Filter types for attribute rewriting.

use markwx_core::{Element, ParseOptions};

/// Type alias for rewrite functions
pub type RewriteFn = Box<dyn Fn(&mut Element, &ParseOptions) + Send + Sync>;

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&Element, &ParseOptions) -> bool + Send + Sync>),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_ascii_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_ascii_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Element, &ParseOptions) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches an element
    pub fn matches(&self, element: &Element, options: &ParseOptions) -> bool {
        match self {
            Filter::TagName(t) => element.tag == *t,
            Filter::TagNames(tags) => tags.iter().any(|t| element.tag == *t),
            Filter::Predicate(f) => f(element, options),
        }
    }
}

/// A rule rewrites the attributes of matched elements in place
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Rewrite applied to every matching element
    pub rewrite: RewriteFn,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, rewrite: F) -> Self
    where
        F: Fn(&mut Element, &ParseOptions) + Send + Sync + 'static,
    {
        Self {
            filter,
            rewrite: Box::new(rewrite),
        }
    }

    /// Create a rule that matches a single tag
    pub fn for_tag<F>(tag: &str, rewrite: F) -> Self
    where
        F: Fn(&mut Element, &ParseOptions) + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), rewrite)
    }

    /// Create a rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], rewrite: F) -> Self
    where
        F: Fn(&mut Element, &ParseOptions) + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), rewrite)
    }

    /// Run the rewrite if the filter matches; returns whether it ran
    pub fn apply(&self, element: &mut Element, options: &ParseOptions) -> bool {
        if !self.filter.matches(element, options) {
            return false;
        }
        (self.rewrite)(element, options);
        true
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filter = match &self.filter {
            Filter::TagName(t) => t.clone(),
            Filter::TagNames(tags) => tags.join("|"),
            Filter::Predicate(_) => "<predicate>".to_string(),
        };
        f.debug_struct("Rule").field("filter", &filter).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_tag_names() {
        let options = ParseOptions::default();
        let filter = Filter::tags(&["IMG", "video"]);
        assert!(filter.matches(&Element::new("img"), &options));
        assert!(filter.matches(&Element::new("video"), &options));
        assert!(!filter.matches(&Element::new("a"), &options));
    }

    #[test]
    fn test_filter_predicate() {
        let options = ParseOptions::default();
        let filter = Filter::predicate(|el, _| el.has_attr("id"));

        let mut el = Element::new("div");
        assert!(!filter.matches(&el, &options));
        el.set_attr("id", "main");
        assert!(filter.matches(&el, &options));
    }

    #[test]
    fn test_apply_only_when_matched() {
        let options = ParseOptions::default();
        let rule = Rule::for_tag("p", |el, _| el.set_attr("data-seen", "1"));

        let mut p = Element::new("p");
        assert!(rule.apply(&mut p, &options));
        assert_eq!(p.attr("data-seen"), Some("1"));

        let mut span = Element::new("span");
        assert!(!rule.apply(&mut span, &options));
        assert!(!span.has_attr("data-seen"));
    }
}
