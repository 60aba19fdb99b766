//! Markwx - the main entry point for markdown/HTML to render tree conversion.

use std::fmt;
use std::str::FromStr;

use markwx_core::{Node, ParseOptions};

use crate::builder::{build_with_warnings, Warning};
use crate::classify::classify_with;
use crate::markdown::normalize;
use crate::rules::{Rule, Rules};
use crate::tokenizer::tokenize;
use crate::{MarkwxError, Result};

/// Input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Markdown, normalized to HTML before tokenizing
    Markdown,
    /// HTML (tag soup is fine)
    Html,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Markdown => "markdown",
            Mode::Html => "html",
        }
    }
}

impl FromStr for Mode {
    type Err = MarkwxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "markdown" => Ok(Mode::Markdown),
            "html" => Ok(Mode::Html),
            _ => Err(MarkwxError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed tree together with the repairs made while building it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub root: Node,
    pub warnings: Vec<Warning>,
}

/// The main service for parsing markdown or HTML into a render tree
#[derive(Debug)]
pub struct Markwx {
    options: ParseOptions,
    rules: Rules,
}

impl Markwx {
    /// Create a new Markwx with default options
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            rules: Rules::new(),
        }
    }

    /// Create a Markwx with custom options
    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            rules: Rules::new(),
        }
    }

    /// Get the current options
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Get mutable access to options
    pub fn options_mut(&mut self) -> &mut ParseOptions {
        &mut self.options
    }

    /// Set the resolver applied to every `href`/`src`
    pub fn set_resolver<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.options.resolver = Some(markwx_core::Resolver::new(f));
        self
    }

    /// Add a custom rule, run after the built-in ones
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Parse `input` in the named mode (`"markdown"` or `"html"`)
    pub fn parse(&self, input: &str, mode: &str) -> Result<Node> {
        let mode = mode.parse()?;
        Ok(self.parse_mode(input, mode))
    }

    /// Parse `input` in a known mode; never fails
    pub fn parse_mode(&self, input: &str, mode: Mode) -> Node {
        run(input, mode, &self.options, &self.rules).root
    }

    /// Parse and also return every repair made to malformed markup
    pub fn parse_with_diagnostics(&self, input: &str, mode: &str) -> Result<Parsed> {
        let mode = mode.parse()?;
        Ok(run(input, mode, &self.options, &self.rules))
    }
}

impl Default for Markwx {
    fn default() -> Self {
        Self::new()
    }
}

/// Full pipeline: normalize (markdown only), tokenize, build, classify.
pub(crate) fn run(input: &str, mode: Mode, options: &ParseOptions, rules: &Rules) -> Parsed {
    tracing::debug!(%mode, len = input.len(), "parsing");

    let normalized;
    let html = match mode {
        Mode::Markdown => {
            normalized = normalize(input);
            normalized.as_str()
        }
        Mode::Html => input,
    };

    let (mut root, warnings) = build_with_warnings(tokenize(html), options);
    classify_with(&mut root, options, rules);

    if !warnings.is_empty() {
        tracing::debug!(count = warnings.len(), "repaired malformed markup");
    }
    Parsed { root, warnings }
}
