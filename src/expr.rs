//! Restricted expression grammars, parsed without evaluation.
//!
//! One logos lexer serves three grammars:
//!
//! - **safe path**: `ident(.ident)*`, identifiers `[A-Za-z_$][A-Za-z0-9_$]*`;
//! - **call**: `path` or `path(arg, ...)`, where each argument is a string,
//!   number, `true`/`false`/`null`/`undefined`, `$event`, or a safe path;
//! - **for**: `item in list` or `(item, index) in list`.
//!
//! Anything else (operators, indexing, member calls, statements) fails to
//! parse. Nothing is ever evaluated as code.

use std::fmt;

use logos::Logos;
use serde_json::{Number, Value};

/// Errors from expression parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character at byte {at}")]
    InvalidCharacter { at: usize },
    #[error("unexpected {found:?} at byte {at}")]
    UnexpectedToken { found: String, at: usize },
    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum Token {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    Str,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,
}

#[derive(Debug, Clone)]
struct Lexeme<'s> {
    token: Token,
    text: &'s str,
    at: usize,
}

fn lex(src: &str) -> Result<Vec<Lexeme<'_>>, ExprError> {
    let mut out = Vec::new();
    let mut lexer = Token::lexer(src);
    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let token = token.map_err(|()| ExprError::InvalidCharacter { at: span.start })?;
        out.push(Lexeme {
            token,
            text: lexer.slice(),
            at: span.start,
        });
    }
    if out.is_empty() {
        return Err(ExprError::Empty);
    }
    Ok(out)
}

struct Cursor<'s> {
    tokens: Vec<Lexeme<'s>>,
    pos: usize,
}

impl<'s> Cursor<'s> {
    fn peek(&self) -> Option<&Lexeme<'s>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Lexeme<'s>> {
        let lexeme = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        lexeme
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<Lexeme<'s>, ExprError> {
        match self.next() {
            Some(l) if l.token == token => Ok(l),
            Some(l) => Err(unexpected(&l)),
            None => Err(ExprError::UnexpectedEnd { expected }),
        }
    }

    fn finish(&self) -> Result<(), ExprError> {
        match self.peek() {
            Some(l) => Err(unexpected(l)),
            None => Ok(()),
        }
    }

    /// `ident(.ident)*`
    fn path(&mut self) -> Result<SafePath, ExprError> {
        let mut segments = vec![self.expect(Token::Ident, "identifier")?.text.to_owned()];
        while self.peek().is_some_and(|l| l.token == Token::Dot) {
            self.pos += 1;
            segments.push(self.expect(Token::Ident, "identifier")?.text.to_owned());
        }
        Ok(SafePath { segments })
    }
}

fn unexpected(l: &Lexeme<'_>) -> ExprError {
    ExprError::UnexpectedToken {
        found: l.text.to_owned(),
        at: l.at,
    }
}

// ---------------------------------------------------------------------------
// Safe path
// ---------------------------------------------------------------------------

/// A dot-separated identifier path such as `user.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath {
    segments: Vec<String>,
}

impl SafePath {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let mut cursor = Cursor {
            tokens: lex(src)?,
            pos: 0,
        };
        let path = cursor.path()?;
        cursor.finish()?;
        Ok(path)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment, looked up in the scope chain.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Everything after the head.
    pub fn rest(&self) -> &[String] {
        &self.segments[1..]
    }
}

impl fmt::Display for SafePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

// ---------------------------------------------------------------------------
// Call grammar
// ---------------------------------------------------------------------------

/// One argument of a call-style event binding.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    /// A string, number, boolean, or null (`undefined` is null).
    Literal(Value),
    /// `$event`: the triggering event.
    Event,
    /// A safe path, resolved when the event fires.
    Path(SafePath),
}

/// `path` or `path(arg, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: SafePath,
    /// `None` without parentheses: the handler receives the event.
    pub args: Option<Vec<CallArg>>,
}

impl CallExpr {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let mut cursor = Cursor {
            tokens: lex(src)?,
            pos: 0,
        };
        let callee = cursor.path()?;
        let args = if cursor.peek().is_some_and(|l| l.token == Token::LParen) {
            cursor.pos += 1;
            Some(call_args(&mut cursor)?)
        } else {
            None
        };
        cursor.finish()?;
        Ok(Self { callee, args })
    }
}

fn call_args(cursor: &mut Cursor<'_>) -> Result<Vec<CallArg>, ExprError> {
    let mut args = Vec::new();
    if cursor.peek().is_some_and(|l| l.token == Token::RParen) {
        cursor.pos += 1;
        return Ok(args);
    }
    loop {
        args.push(call_arg(cursor)?);
        match cursor.next() {
            Some(l) if l.token == Token::Comma => continue,
            Some(l) if l.token == Token::RParen => return Ok(args),
            Some(l) => return Err(unexpected(&l)),
            None => return Err(ExprError::UnexpectedEnd { expected: "`)`" }),
        }
    }
}

fn call_arg(cursor: &mut Cursor<'_>) -> Result<CallArg, ExprError> {
    let Some(l) = cursor.peek().cloned() else {
        return Err(ExprError::UnexpectedEnd {
            expected: "argument",
        });
    };
    let literal = match (l.token, l.text) {
        (Token::Str, text) => Some(Value::String(unescape(&text[1..text.len() - 1]))),
        (Token::Number, text) => Some(parse_number(text).ok_or_else(|| unexpected(&l))?),
        (Token::Ident, "true") => Some(Value::Bool(true)),
        (Token::Ident, "false") => Some(Value::Bool(false)),
        (Token::Ident, "null" | "undefined") => Some(Value::Null),
        (Token::Ident, "$event") => {
            cursor.pos += 1;
            return Ok(CallArg::Event);
        }
        (Token::Ident, _) => None,
        _ => return Err(unexpected(&l)),
    };
    match literal {
        Some(value) => {
            cursor.pos += 1;
            Ok(CallArg::Literal(value))
        }
        None => cursor.path().map(CallArg::Path),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// For grammar
// ---------------------------------------------------------------------------

/// `item in list` or `(item, index) in list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForExpr {
    pub item: String,
    pub index: Option<String>,
    pub list: SafePath,
}

impl ForExpr {
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let mut cursor = Cursor {
            tokens: lex(src)?,
            pos: 0,
        };
        let (item, index) = if cursor.peek().is_some_and(|l| l.token == Token::LParen) {
            cursor.pos += 1;
            let item = cursor.expect(Token::Ident, "item name")?.text.to_owned();
            let index = match cursor.next() {
                Some(l) if l.token == Token::Comma => {
                    let index = cursor.expect(Token::Ident, "index name")?.text.to_owned();
                    cursor.expect(Token::RParen, "`)`")?;
                    Some(index)
                }
                Some(l) if l.token == Token::RParen => None,
                Some(l) => return Err(unexpected(&l)),
                None => return Err(ExprError::UnexpectedEnd { expected: "`)`" }),
            };
            (item, index)
        } else {
            (cursor.expect(Token::Ident, "item name")?.text.to_owned(), None)
        };
        match cursor.next() {
            Some(l) if l.token == Token::Ident && l.text == "in" => {}
            Some(l) => return Err(unexpected(&l)),
            None => return Err(ExprError::UnexpectedEnd { expected: "`in`" }),
        }
        let list = cursor.path()?;
        cursor.finish()?;
        Ok(Self { item, index, list })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(src: &str) -> SafePath {
        SafePath::parse(src).expect("valid path")
    }

    #[test]
    fn safe_paths_accept_identifiers() {
        assert_eq!(path("count").segments(), &["count"]);
        assert_eq!(path(" user.name ").segments(), &["user", "name"]);
        assert_eq!(path("$store._x1").to_string(), "$store._x1");
        assert_eq!(path("a.b.c").rest(), &["b", "c"]);
    }

    #[test]
    fn safe_paths_reject_code() {
        for bad in [
            "",
            "a()",
            "a + b",
            "a; b",
            "a[0]",
            "a.",
            ".a",
            "a..b",
            "1a",
            "a.0",
            "alert('x')",
            "a = 1",
            "!a",
        ] {
            assert!(SafePath::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn safe_path_error_positions() {
        assert_eq!(SafePath::parse("   "), Err(ExprError::Empty));
        assert_eq!(
            SafePath::parse("a + b"),
            Err(ExprError::InvalidCharacter { at: 2 })
        );
        assert_eq!(
            SafePath::parse("a b"),
            Err(ExprError::UnexpectedToken {
                found: "b".into(),
                at: 2
            })
        );
    }

    #[test]
    fn call_without_parens() {
        let call = CallExpr::parse("increment").expect("valid");
        assert_eq!(call.callee, path("increment"));
        assert_eq!(call.args, None);
    }

    #[test]
    fn call_with_every_argument_kind() {
        let call = CallExpr::parse(r#"actions.save("a\"b", 'c', -2, 1.5, true, false, null, undefined, $event, item.id)"#)
            .expect("valid");
        assert_eq!(call.callee, path("actions.save"));
        assert_eq!(
            call.args,
            Some(vec![
                CallArg::Literal(json!("a\"b")),
                CallArg::Literal(json!("c")),
                CallArg::Literal(json!(-2)),
                CallArg::Literal(json!(1.5)),
                CallArg::Literal(json!(true)),
                CallArg::Literal(json!(false)),
                CallArg::Literal(Value::Null),
                CallArg::Literal(Value::Null),
                CallArg::Event,
                CallArg::Path(path("item.id")),
            ])
        );
    }

    #[test]
    fn call_with_empty_parens() {
        let call = CallExpr::parse("reset()").expect("valid");
        assert_eq!(call.args, Some(vec![]));
    }

    #[test]
    fn call_rejects_expressions() {
        for bad in [
            "a(b + 1)",
            "a(b())",
            "a(",
            "a(1,)",
            "a(1) b",
            "a.b().c",
            "count++",
            "a ? b : c",
            "(a)",
        ] {
            assert!(CallExpr::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn for_grammar() {
        assert_eq!(
            ForExpr::parse("todo in todos").expect("valid"),
            ForExpr {
                item: "todo".into(),
                index: None,
                list: path("todos"),
            }
        );
        assert_eq!(
            ForExpr::parse("(row, i) in table.rows").expect("valid"),
            ForExpr {
                item: "row".into(),
                index: Some("i".into()),
                list: path("table.rows"),
            }
        );
        assert_eq!(
            ForExpr::parse("(row) in rows").expect("valid").index,
            None
        );
    }

    #[test]
    fn for_grammar_rejects_malformed() {
        for bad in ["todos", "todo of todos", "(a, b in xs", "a in", "a in xs.", "a in f()"] {
            assert!(ForExpr::parse(bad).is_err(), "accepted {bad:?}");
        }
    }
}
