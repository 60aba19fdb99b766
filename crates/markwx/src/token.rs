//! Lexical tokens produced by the tokenizer.

use indexmap::IndexMap;
use markwx_core::escape_attr;

/// Ordered attribute map
pub type Attributes = IndexMap<String, String>;

/// A lexical token. Tokens are emitted in source order and own their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<name ...>` or `<name .../>` for a non-void element
    TagOpen {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    /// `</name>`
    TagClose { name: String },
    /// Longest run of character data, entities decoded
    Text { content: String },
    /// `<!-- ... -->`
    Comment { content: String },
    /// Element that never has children or a close tag
    VoidTag { name: String, attributes: Attributes },
}

impl Token {
    pub fn text(content: impl Into<String>) -> Self {
        Token::Text {
            content: content.into(),
        }
    }

    /// Tag name for tag tokens
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::TagOpen { name, .. } | Token::TagClose { name } | Token::VoidTag { name, .. } => {
                Some(name)
            }
            Token::Text { .. } | Token::Comment { .. } => None,
        }
    }

    /// Reconstruct markup equivalent to the token's source.
    ///
    /// Attribute values are re-quoted and text is emitted as decoded, so this
    /// is equivalent rather than byte-identical to the input.
    pub fn to_source(&self) -> String {
        match self {
            Token::TagOpen {
                name,
                attributes,
                self_closing,
            } => {
                let close = if *self_closing { "/>" } else { ">" };
                format!("<{}{}{}", name, attributes_source(attributes), close)
            }
            Token::VoidTag { name, attributes } => {
                format!("<{}{}>", name, attributes_source(attributes))
            }
            Token::TagClose { name } => format!("</{}>", name),
            Token::Text { content } => content.clone(),
            Token::Comment { content } => format!("<!--{}-->", content),
        }
    }
}

fn attributes_source(attributes: &Attributes) -> String {
    let mut out = String::new();
    for (name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_source_open() {
        let mut attributes = Attributes::new();
        attributes.insert("href".to_string(), "a.html".to_string());
        attributes.insert("download".to_string(), String::new());
        let token = Token::TagOpen {
            name: "a".to_string(),
            attributes,
            self_closing: false,
        };
        assert_eq!(token.to_source(), "<a href=\"a.html\" download>");
    }

    #[test]
    fn test_to_source_others() {
        assert_eq!(
            Token::TagClose {
                name: "div".to_string()
            }
            .to_source(),
            "</div>"
        );
        assert_eq!(
            Token::VoidTag {
                name: "br".to_string(),
                attributes: Attributes::new()
            }
            .to_source(),
            "<br>"
        );
        assert_eq!(
            Token::Comment {
                content: " x ".to_string()
            }
            .to_source(),
            "<!-- x -->"
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(Token::text("x").name(), None);
        assert_eq!(
            Token::TagClose {
                name: "p".to_string()
            }
            .name(),
            Some("p")
        );
    }
}
