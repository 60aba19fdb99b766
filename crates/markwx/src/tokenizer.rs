//! Tag-soup tokenizer.
//!
//! A single forward pass that turns arbitrary text into [`Token`]s. It never
//! fails: anything that does not scan as markup is emitted as text, and every
//! step consumes at least one byte, so the stream is always finite.
//!
//! Scanning is byte based. Slices are only ever cut at ASCII delimiters, which
//! can never fall inside a multi-byte UTF-8 sequence.

use markwx_core::tags;

use crate::entities::decode_entities;
use crate::token::{Attributes, Token};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Tokenize `input`. The returned iterator is lazy and can only be consumed
/// once.
///
/// ```rust
/// use markwx::{tokenize, Token};
///
/// let tokens: Vec<Token> = tokenize("<p>hi<br></p>").collect();
/// assert_eq!(tokens.len(), 4);
/// assert!(matches!(tokens[2], Token::VoidTag { .. }));
/// ```
pub fn tokenize(input: &str) -> Tokenizer<'_> {
    Tokenizer::new(input)
}

/// Lazy token stream over a borrowed input. See [`tokenize`].
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Position of the last `>` in the input; markup starting after it can
    /// never terminate
    last_gt: Option<usize>,
    /// Same for the last `-->`
    last_comment_end: Option<usize>,
    /// Close tag name ending the raw-text element we are inside of
    raw_text: Option<String>,
}

enum Markup {
    Token(Token),
    /// Declaration or processing instruction; consumed without output
    Skipped,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            last_gt: input.rfind('>'),
            last_comment_end: input.rfind(COMMENT_END),
            raw_text: None,
        }
    }

    /// Emit `input[start..]` up to (not including) the next `<` at or after
    /// `scan_from` as one text token.
    fn text_run(&mut self, start: usize, scan_from: usize) -> Token {
        let end = self.input[scan_from..]
            .find('<')
            .map_or(self.input.len(), |i| scan_from + i);
        self.pos = end;
        Token::text(decode_entities(&self.input[start..end]))
    }

    /// Content of a `script`/`style` element, up to its close tag.
    fn raw_text_run(&mut self, name: &str) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let end = find_close_tag(rest, name).unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        let content = rest[..end].to_string();
        self.pos += end;
        Some(Token::Text { content })
    }

    /// Scan markup starting at a `<`. `None` means the construct is malformed
    /// and the `<` must be taken literally.
    fn markup(&self, rest: &str) -> Option<(Markup, usize)> {
        let bytes = rest.as_bytes();
        debug_assert_eq!(bytes.first(), Some(&b'<'));

        if rest.starts_with(COMMENT_START) {
            if self
                .last_comment_end
                .map_or(true, |end| end < self.pos + COMMENT_START.len())
            {
                return None;
            }
            let body = &rest[COMMENT_START.len()..];
            let end = body.find(COMMENT_END)?;
            let token = Token::Comment {
                content: body[..end].to_string(),
            };
            return Some((Markup::Token(token), COMMENT_START.len() + end + COMMENT_END.len()));
        }

        if self.last_gt.map_or(true, |gt| gt < self.pos) {
            return None;
        }

        match *bytes.get(1)? {
            b'!' | b'?' => {
                let end = rest.find('>')?;
                Some((Markup::Skipped, end + 1))
            }
            b'/' => {
                if !bytes.get(2)?.is_ascii_alphabetic() {
                    return None;
                }
                let name_end = 2 + tag_name_len(&bytes[2..]);
                let gt = rest[name_end..].find('>')? + name_end;
                let name = rest[2..name_end].to_ascii_lowercase();
                Some((Markup::Token(Token::TagClose { name }), gt + 1))
            }
            c if c.is_ascii_alphabetic() => {
                let (token, consumed) = scan_start_tag(rest)?;
                Some((Markup::Token(token), consumed))
            }
            _ => None,
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.pos >= self.input.len() {
                return None;
            }

            if let Some(name) = self.raw_text.take() {
                if let Some(token) = self.raw_text_run(&name) {
                    return Some(token);
                }
                continue;
            }

            let start = self.pos;
            let rest = &self.input[start..];
            if !rest.starts_with('<') {
                return Some(self.text_run(start, start));
            }

            match self.markup(rest) {
                Some((Markup::Token(token), consumed)) => {
                    self.pos += consumed;
                    if let Token::TagOpen {
                        name,
                        self_closing: false,
                        ..
                    } = &token
                    {
                        if tags::is_raw_text(name) {
                            self.raw_text = Some(name.clone());
                        }
                    }
                    return Some(token);
                }
                Some((Markup::Skipped, consumed)) => {
                    self.pos += consumed;
                }
                None => {
                    tracing::trace!(offset = start, "malformed markup, taking '<' literally");
                    return Some(self.text_run(start, start + 1));
                }
            }
        }
    }
}

/// Length of the tag name at the start of `bytes`.
fn tag_name_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b.is_ascii_whitespace() || b == b'>' || b == b'/')
        .unwrap_or(bytes.len())
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Scan `<name attr=value ...>` at the start of `rest`. Returns `None` when
/// the tag (or a quoted value in it) is not terminated.
fn scan_start_tag(rest: &str) -> Option<(Token, usize)> {
    let bytes = rest.as_bytes();
    let name_end = 1 + tag_name_len(&bytes[1..]);
    let name = rest[1..name_end].to_ascii_lowercase();

    let mut attributes = Attributes::new();
    let mut self_closing = false;
    let mut i = name_end;

    let consumed = loop {
        i = skip_whitespace(bytes, i);
        match *bytes.get(i)? {
            b'>' => break i + 1,
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    self_closing = true;
                    break i + 2;
                }
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'>' | b'/' | b'=')
        {
            i += 1;
        }
        if i == attr_start {
            // A stray `=`
            i += 1;
            continue;
        }
        let attr_name = rest[attr_start..i].to_ascii_lowercase();

        let mut value = String::new();
        let after_name = skip_whitespace(bytes, i);
        if bytes.get(after_name) == Some(&b'=') {
            i = skip_whitespace(bytes, after_name + 1);
            match *bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let len = bytes[i + 1..].iter().position(|&b| b == quote)?;
                    value = decode_entities(&rest[i + 1..i + 1 + len]).into_owned();
                    i += len + 2;
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&rest[start..i]).into_owned();
                }
            }
        }

        attributes.entry(attr_name).or_insert(value);
    };

    let token = if tags::is_void(&name) {
        Token::VoidTag { name, attributes }
    } else {
        Token::TagOpen {
            name,
            attributes,
            self_closing,
        }
    };
    Some((token, consumed))
}

/// Offset of `</name` (ASCII case-insensitive) in `haystack`.
fn find_close_tag(haystack: &str, name: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let needle_len = name.len() + 2;
    let mut i = 0;
    while let Some(rel) = haystack[i..].find("</") {
        i += rel;
        if bytes.len() >= i + needle_len
            && bytes[i + 2..i + needle_len].eq_ignore_ascii_case(name.as_bytes())
        {
            return Some(i);
        }
        i += 2;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<Token> {
        tokenize(input).collect()
    }

    fn open(name: &str, attrs: &[(&str, &str)]) -> Token {
        Token::TagOpen {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            self_closing: false,
        }
    }

    fn close(name: &str) -> Token {
        Token::TagClose {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_simple_element() {
        assert_eq!(
            collect("<p>Hello World</p>"),
            vec![open("p", &[]), Token::text("Hello World"), close("p")]
        );
    }

    #[test]
    fn test_tag_names_lowercased() {
        assert_eq!(collect("<DIV></Div>"), vec![open("div", &[]), close("div")]);
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = collect(r#"<a href="x.html" title='single' data-id=42 download>"#);
        assert_eq!(
            tokens,
            vec![open(
                "a",
                &[
                    ("href", "x.html"),
                    ("title", "single"),
                    ("data-id", "42"),
                    ("download", "")
                ]
            )]
        );
    }

    #[test]
    fn test_quoted_value_may_contain_gt() {
        let tokens = collect(r#"<a title="a > b">x</a>"#);
        assert_eq!(tokens[0], open("a", &[("title", "a > b")]));
        assert_eq!(tokens[1], Token::text("x"));
    }

    #[test]
    fn test_duplicate_attribute_first_wins() {
        assert_eq!(
            collect(r#"<img src="a.png" src="b.png">"#),
            vec![Token::VoidTag {
                name: "img".to_string(),
                attributes: [("src".to_string(), "a.png".to_string())].into_iter().collect(),
            }]
        );
    }

    #[test]
    fn test_void_without_self_closing_syntax() {
        let tokens = collect("a<br>b<hr/>c");
        assert!(matches!(&tokens[1], Token::VoidTag { name, .. } if name == "br"));
        assert!(matches!(&tokens[3], Token::VoidTag { name, .. } if name == "hr"));
        assert_eq!(tokens.len(), 5);
    }

    #[test]
    fn test_self_closing_non_void() {
        assert_eq!(
            collect("<div/>"),
            vec![Token::TagOpen {
                name: "div".to_string(),
                attributes: Attributes::new(),
                self_closing: true,
            }]
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            collect("a<!-- note -->b"),
            vec![
                Token::text("a"),
                Token::Comment {
                    content: " note ".to_string()
                },
                Token::text("b")
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_is_text() {
        assert_eq!(collect("x<!-- open"), vec![Token::text("x"), Token::text("<!-- open")]);
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        assert_eq!(collect("<div class=\"a"), vec![Token::text("<div class=\"a")]);
        assert_eq!(collect("a <b"), vec![Token::text("a "), Token::text("<b")]);
    }

    #[test]
    fn test_lone_lt_is_text() {
        assert_eq!(
            collect("1 < 2 <3 </ >"),
            vec![
                Token::text("1 "),
                Token::text("< 2 "),
                Token::text("<3 "),
                Token::text("</ >")
            ]
        );
    }

    #[test]
    fn test_doctype_and_pi_skipped() {
        assert_eq!(
            collect("<!DOCTYPE html><?xml version=\"1.0\"?><p>"),
            vec![open("p", &[])]
        );
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            collect(r#"<a title="&quot;q&quot;">1 &lt; 2</a>"#),
            vec![open("a", &[("title", "\"q\"")]), Token::text("1 < 2"), close("a")]
        );
    }

    #[test]
    fn test_raw_text_script() {
        assert_eq!(
            collect("<script>if (a < b) { x(\"</p>\") }</SCRIPT>after"),
            vec![
                open("script", &[]),
                Token::text("if (a < b) { x(\"</p>\") }"),
                close("script"),
                Token::text("after")
            ]
        );
    }

    #[test]
    fn test_unterminated_raw_text_runs_to_end() {
        assert_eq!(
            collect("<style>p { color: red }"),
            vec![open("style", &[]), Token::text("p { color: red }")]
        );
    }

    #[test]
    fn test_multibyte_text() {
        assert_eq!(
            collect("<p>你好，世界</p>"),
            vec![open("p", &[]), Token::text("你好，世界"), close("p")]
        );
    }

    #[test]
    fn test_close_tag_with_junk() {
        assert_eq!(collect("</p foo>"), vec![close("p")]);
    }
}
