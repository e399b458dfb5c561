//! logos-based HTML fragment parser.
//!
//! Two lexers share one source: [`Content`] scans text, comments, and tag
//! boundaries; when it sees `<name` it morphs into [`TagToken`] to read the
//! attributes, then morphs back at `>` or `/>`.
//!
//! The parser is deliberately lenient about structure (unclosed elements are
//! closed at end of input, void elements never take children) and strict
//! about tokens: a stray closing tag or an unterminated tag is an error.

use logos::{Lexer, Logos};

use super::node::{NodeData, NodeId};
use super::tree::Dom;

/// Elements that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose body is raw text up to the matching closing tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Errors from HTML parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected closing tag </{tag}> at byte {position}")]
    UnexpectedClose { tag: String, position: usize },
    #[error("unterminated tag <{tag}>")]
    UnterminatedTag { tag: String },
    #[error("unterminated comment at byte {position}")]
    UnterminatedComment { position: usize },
    #[error("unexpected {found:?} inside <{tag}>")]
    UnexpectedInTag { tag: String, found: String },
}

// ---------------------------------------------------------------------------
// Lexers
// ---------------------------------------------------------------------------

#[derive(Logos, Debug, Clone, PartialEq)]
enum Content {
    /// `<!-- ... -->`, body captured.
    #[token("<!--", comment_body)]
    Comment(String),

    /// `<!DOCTYPE ...>`, ignored.
    #[regex(r"<![A-Za-z][^>]*>", logos::skip)]
    Doctype,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9-]*[ \t\n\r\f]*>", close_name)]
    Close(String),

    /// `<name`, followed by attributes in tag mode.
    #[regex(r"<[A-Za-z][A-Za-z0-9-]*", |lex| lex.slice()[1..].to_ascii_lowercase())]
    Open(String),

    /// A `<` that starts nothing.
    #[token("<")]
    Lt,

    #[regex(r"[^<]+")]
    Text,
}

fn comment_body(lex: &mut Lexer<Content>) -> Option<String> {
    let rest = lex.remainder();
    let end = rest.find("-->")?;
    let body = rest[..end].to_owned();
    lex.bump(end + 3);
    Some(body)
}

fn close_name(lex: &mut Lexer<Content>) -> String {
    lex.slice()[2..]
        .trim_end_matches('>')
        .trim_end()
        .to_ascii_lowercase()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum TagToken {
    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// Attribute name or unquoted value.
    #[regex(r#"[^ \t\n\r\f"'=<>/`]+"#)]
    Word,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse `html` into a new detached fragment.
pub fn parse_fragment(dom: &mut Dom, html: &str) -> Result<NodeId, ParseError> {
    let fragment = dom.create_fragment();
    match Parser::new(dom, fragment).run(html) {
        Ok(()) => Ok(fragment),
        Err(err) => {
            dom.destroy(fragment);
            Err(err)
        }
    }
}

impl Dom {
    /// Parse `html` and append the resulting nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<(), ParseError> {
        let fragment = parse_fragment(self, html)?;
        self.append_child(parent, fragment);
        self.destroy(fragment);
        Ok(())
    }

    /// Replace the children of `parent` with the parsed `html`.
    pub fn set_inner_html(&mut self, parent: NodeId, html: &str) -> Result<(), ParseError> {
        let fragment = parse_fragment(self, html)?;
        self.clear_children(parent);
        self.append_child(parent, fragment);
        self.destroy(fragment);
        Ok(())
    }
}

struct Parser<'d> {
    dom: &'d mut Dom,
    /// Open elements with the node children are appended to (the template
    /// content for `<template>`).
    stack: Vec<(String, NodeId)>,
}

impl<'d> Parser<'d> {
    fn new(dom: &'d mut Dom, root: NodeId) -> Self {
        Self {
            dom,
            stack: vec![(String::new(), root)],
        }
    }

    fn current(&self) -> NodeId {
        self.stack[self.stack.len() - 1].1
    }

    fn append(&mut self, node: NodeId) {
        let parent = self.current();
        self.dom.append_child(parent, node);
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let node = self.dom.create_text(&decode_entities(raw));
        self.append(node);
    }

    fn run(mut self, html: &str) -> Result<(), ParseError> {
        let mut lex = Content::lexer(html);
        while let Some(token) = lex.next() {
            match token {
                Ok(Content::Text) | Ok(Content::Lt) => self.text(lex.slice()),
                Ok(Content::Comment(body)) => {
                    let node = self.dom.create_comment(&body);
                    self.append(node);
                }
                Ok(Content::Doctype) => {}
                Ok(Content::Close(tag)) => self.close(&tag, lex.span().start)?,
                Ok(Content::Open(tag)) => {
                    let (attrs, self_closing, rest) = read_attributes(lex.morph(), &tag)?;
                    lex = rest;
                    self.open(&tag, attrs, self_closing);
                    if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) && !self_closing {
                        self.raw_text(&mut lex, &tag)?;
                    }
                }
                Err(()) => {
                    return Err(ParseError::UnterminatedComment {
                        position: lex.span().start,
                    })
                }
            }
        }
        Ok(())
    }

    fn open(&mut self, tag: &str, attrs: Vec<(String, String)>, self_closing: bool) {
        let mut data = NodeData::element(tag);
        for (name, value) in attrs {
            data.attributes.entry(name).or_insert(value);
        }
        let node = self.dom.create(data);
        self.append(node);
        if self_closing || is_void(tag) {
            return;
        }
        let target = self
            .dom
            .get(node)
            .and_then(|d| d.template_content)
            .unwrap_or(node);
        self.stack.push((tag.to_owned(), target));
    }

    fn close(&mut self, tag: &str, position: usize) -> Result<(), ParseError> {
        if is_void(tag) {
            return Ok(());
        }
        match self.stack.iter().rposition(|(open, _)| open == tag) {
            Some(at) if at > 0 => {
                self.stack.truncate(at);
                Ok(())
            }
            _ => Err(ParseError::UnexpectedClose {
                tag: tag.to_owned(),
                position,
            }),
        }
    }

    fn raw_text(&mut self, lex: &mut Lexer<'_, Content>, tag: &str) -> Result<(), ParseError> {
        let rest = lex.remainder();
        let needle = format!("</{tag}");
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .ok_or_else(|| ParseError::UnterminatedTag { tag: tag.to_owned() })?;
        let body = &rest[..end];
        lex.bump(end);
        if !body.is_empty() {
            let node = self.dom.create_text(&decode_entities(body));
            self.append(node);
        }
        Ok(())
    }
}

type TagResult<'s> = Result<(Vec<(String, String)>, bool, Lexer<'s, Content>), ParseError>;

/// Read attributes in tag mode until `>` or `/>`, then hand back a content
/// lexer positioned after the tag.
fn read_attributes<'s>(mut lex: Lexer<'s, TagToken>, tag: &str) -> TagResult<'s> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut pending_eq = false;
    let unexpected = |found: &str| ParseError::UnexpectedInTag {
        tag: tag.to_owned(),
        found: found.to_owned(),
    };

    while let Some(token) = lex.next() {
        let token = token.map_err(|()| unexpected(lex.slice()))?;
        match token {
            TagToken::End | TagToken::SelfClose => {
                let self_closing = token == TagToken::SelfClose;
                return Ok((attrs, self_closing, lex.morph()));
            }
            TagToken::Eq => {
                if attrs.is_empty() || pending_eq {
                    return Err(unexpected("="));
                }
                pending_eq = true;
            }
            TagToken::Word if !pending_eq => {
                attrs.push((lex.slice().to_ascii_lowercase(), String::new()));
            }
            TagToken::Word | TagToken::DoubleQuoted | TagToken::SingleQuoted => {
                if !pending_eq {
                    return Err(unexpected(lex.slice()));
                }
                let raw = lex.slice();
                let value = match token {
                    TagToken::Word => raw,
                    _ => &raw[1..raw.len() - 1],
                };
                if let Some(last) = attrs.last_mut() {
                    last.1 = decode_entities(value);
                }
                pending_eq = false;
            }
        }
    }
    Err(ParseError::UnterminatedTag { tag: tag.to_owned() })
}

/// Decode the five basic named entities and numeric references.
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        let decoded = rest.find(';').and_then(|end| {
            let name = &rest[1..end];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
