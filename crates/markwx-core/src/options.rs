//! Configuration options for parsing

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::tags::SemanticClass;

/// Default ceiling on element nesting
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Largest `max_depth` honored. Dropping, cloning, comparing and serializing a
/// tree recurse once per level, so larger requests are clamped to this.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// How anchors are annotated for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// Only absolute `http(s)` links are marked external
    #[default]
    Default,
    /// Every link is marked for external navigation
    External,
}

/// Embedder-supplied link/asset target resolver.
///
/// Maps a raw `href`/`src` to the target the host should load. It must be pure:
/// the same input always yields the same output.
#[derive(Clone)]
pub struct Resolver(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl Resolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn resolve(&self, target: &str) -> String {
        (self.0)(target)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Options for parsing
///
/// Deserializes from camelCase JSON; every key is optional and unknown keys
/// are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Move image sources aside so the renderer can load them on visibility
    pub lazy_load_images: bool,

    /// Anchor annotation mode
    pub link_target: LinkTarget,

    /// Keep fenced/inline code language strings as a `language` attribute
    pub code_highlight: bool,

    /// Hard ceiling on element nesting; deeper tags degrade to text.
    /// Values above [`MAX_DEPTH_LIMIT`] are clamped.
    pub max_depth: usize,

    /// Per-tag overrides of the default presentation
    #[serde(alias = "theme")]
    pub style_map: IndexMap<String, SemanticClass>,

    /// Target resolver for `href`/`src`; identity when unset
    #[serde(skip)]
    pub resolver: Option<Resolver>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            lazy_load_images: false,
            link_target: LinkTarget::Default,
            code_highlight: true,
            max_depth: DEFAULT_MAX_DEPTH,
            style_map: IndexMap::new(),
            resolver: None,
        }
    }
}

impl ParseOptions {
    /// Load options from a JSON object
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the target resolver
    pub fn with_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.resolver = Some(Resolver::new(f));
        self
    }

    /// Run a target through the resolver, if any
    pub fn resolve(&self, target: &str) -> String {
        match &self.resolver {
            Some(resolver) => resolver.resolve(target),
            None => target.to_string(),
        }
    }

    /// `max_depth` clamped to [`MAX_DEPTH_LIMIT`]
    pub fn depth_limit(&self) -> usize {
        self.max_depth.min(MAX_DEPTH_LIMIT)
    }

    /// Presentation override for a tag
    pub fn style_for(&self, tag: &str) -> Option<SemanticClass> {
        self.style_map.get(tag).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(!options.lazy_load_images);
        assert!(options.code_highlight);
        assert_eq!(options.link_target, LinkTarget::Default);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert!(options.style_map.is_empty());
    }

    #[test]
    fn test_from_json_camel_case() {
        let options = ParseOptions::from_json(
            r#"{"lazyLoadImages": true, "linkTarget": "external", "maxDepth": 3,
                "styleMap": {"center": "paragraph"}}"#,
        )
        .unwrap();
        assert!(options.lazy_load_images);
        assert_eq!(options.link_target, LinkTarget::External);
        assert_eq!(options.max_depth, 3);
        assert_eq!(options.style_for("center"), Some(SemanticClass::Paragraph));
        assert!(options.code_highlight);
    }

    #[test]
    fn test_depth_limit_is_clamped() {
        let options = ParseOptions {
            max_depth: 1_000_000,
            ..Default::default()
        };
        assert_eq!(options.depth_limit(), MAX_DEPTH_LIMIT);
        assert_eq!(ParseOptions::default().depth_limit(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let options = ParseOptions::from_json(r#"{"events": ["tap"], "base": "/"}"#).unwrap();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_theme_alias() {
        let options = ParseOptions::from_json(r#"{"theme": {"u": "inline-strong"}}"#).unwrap();
        assert_eq!(options.style_for("u"), Some(SemanticClass::InlineStrong));
    }

    #[test]
    fn test_resolver() {
        let options = ParseOptions::default();
        assert_eq!(options.resolve("a.png"), "a.png");

        let options = options.with_resolver(|t| format!("https://cdn.example.com/{t}"));
        assert_eq!(options.resolve("a.png"), "https://cdn.example.com/a.png");
    }
}
