//! Tokenizer for Python-style call expressions.

use crate::{Error, Result};

/// Multi-character operators must come before their one-character prefixes.
const OPERATORS: [&str; 20] = [
    "**", "//", "==", "!=", "<=", ">=", "<<", ">>", "+", "-", "*", "/", "%", "@", "~", "&", "|",
    "^", "<", ">",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Name(String),
    /// Integer digits with separators and radix prefix removed.
    Int { digits: String, radix: u32 },
    Float(String),
    Str(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Assign,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the source.
    pub offset: usize,
}

/// Split `source` into tokens, always ending with `TokenKind::Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer { src: source, pos: 0 }.run()
}

/// Whether `c` may start an identifier.
pub(crate) fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Whether `c` may continue an identifier.
pub(crate) fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl Lexer<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let offset = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset,
                });
                return Ok(tokens);
            };

            let kind = match c {
                '\'' | '"' => self.string(false)?,
                'r' | 'R' if matches!(self.peek_nth(1), Some('\'' | '"')) => {
                    self.bump();
                    self.string(true)?
                }
                '.' if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                c if c.is_ascii_digit() => self.number()?,
                c if is_name_start(c) => self.name(),
                _ => self.punct()?,
            };
            tokens.push(Token { kind, offset });
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn name(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_name_continue) {
            self.bump();
        }
        TokenKind::Name(self.src[start..self.pos].to_string())
    }

    fn take_digits(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c == '_' {
                self.bump();
            } else if accept(c) {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        digits
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;

        if self.peek() == Some('0') && matches!(self.peek_nth(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.bump();
            let radix = match self.bump() {
                Some('x' | 'X') => 16,
                Some('o' | 'O') => 8,
                _ => 2,
            };
            let digits = self.take_digits(|c| c.is_digit(radix));
            if digits.is_empty() {
                return Err(Error::syntax(start, "invalid integer literal"));
            }
            return self.finish_number(start, TokenKind::Int { digits, radix });
        }

        let mut text = self.take_digits(|c| c.is_ascii_digit());
        let mut is_float = false;

        if self.peek() == Some('.') {
            self.bump();
            text.push('.');
            text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
            is_float = true;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_nth(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                text.push('e');
                if signed {
                    text.extend(self.bump());
                }
                text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
                is_float = true;
            }
        }

        let kind = if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int {
                digits: text,
                radix: 10,
            }
        };
        self.finish_number(start, kind)
    }

    fn finish_number(&self, start: usize, kind: TokenKind) -> Result<TokenKind> {
        match self.peek() {
            Some(c) if is_name_continue(c) => Err(Error::syntax(start, "invalid numeric literal")),
            _ => Ok(kind),
        }
    }

    fn string(&mut self, raw: bool) -> Result<TokenKind> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(Error::syntax(start, "expected string literal"));
        };

        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(Error::syntax(start, "unterminated string literal"));
            };

            if c == quote {
                if !triple {
                    break;
                }
                if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    break;
                }
                value.push(c);
                continue;
            }

            match c {
                '\n' if !triple => {
                    return Err(Error::syntax(start, "unterminated string literal"));
                }
                '\\' if raw => {
                    value.push('\\');
                    value.extend(self.bump());
                }
                '\\' => self.escape(&mut value)?,
                _ => value.push(c),
            }
        }

        Ok(TokenKind::Str(value))
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        let at = self.pos - 1;
        let Some(c) = self.bump() else {
            return Err(Error::syntax(at, "unterminated string literal"));
        };

        match c {
            // Line continuation
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0'..='7' => out.push(self.octal_escape(c)),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' => out.push(self.hex_escape(at, 2)?),
            'u' => out.push(self.hex_escape(at, 4)?),
            'U' => out.push(self.hex_escape(at, 8)?),
            'N' if self.peek() == Some('{') => {
                return Err(Error::syntax(at, "named unicode escapes are not supported"));
            }
            // Unknown escapes are kept verbatim
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    /// Up to three octal digits, the first already consumed.
    fn octal_escape(&mut self, first: char) -> char {
        let mut code = first.to_digit(8).unwrap_or_default();
        for _ in 0..2 {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(digit) => {
                    code = code * 8 + digit;
                    self.bump();
                }
                None => break,
            }
        }
        // At most 0o777, always a valid scalar value
        char::from_u32(code).unwrap_or_default()
    }

    fn hex_escape(&mut self, at: usize, len: usize) -> Result<char> {
        let mut code = 0u32;
        for _ in 0..len {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| Error::syntax(at, "truncated escape sequence"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| Error::syntax(at, "invalid unicode escape"))
    }

    fn punct(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let rest = &self.src[self.pos..];
        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.len();
            return Ok(TokenKind::Op(*op));
        }

        let kind = match self.bump() {
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some('[') => TokenKind::LBracket,
            Some(']') => TokenKind::RBracket,
            Some('{') => TokenKind::LBrace,
            Some('}') => TokenKind::RBrace,
            Some(',') => TokenKind::Comma,
            Some(':') => TokenKind::Colon,
            Some('.') => TokenKind::Dot,
            Some('=') => TokenKind::Assign,
            Some(c) => {
                return Err(Error::syntax(start, format!("unexpected character {c:?}")));
            }
            None => TokenKind::Eof,
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn call_tokens() {
        assert_eq!(
            kinds("add(6, b=12)"),
            vec![
                TokenKind::Name("add".into()),
                TokenKind::LParen,
                TokenKind::Int {
                    digits: "6".into(),
                    radix: 10
                },
                TokenKind::Comma,
                TokenKind::Name("b".into()),
                TokenKind::Assign,
                TokenKind::Int {
                    digits: "12".into(),
                    radix: 10
                },
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numeric_forms() {
        assert_eq!(
            kinds("1_000 0x1F .5 2e3 1.")[..5],
            [
                TokenKind::Int {
                    digits: "1000".into(),
                    radix: 10
                },
                TokenKind::Int {
                    digits: "1F".into(),
                    radix: 16
                },
                TokenKind::Float(".5".into()),
                TokenKind::Float("2e3".into()),
                TokenKind::Float("1.".into()),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"'a\'b' "\n\x41é" r"\d""#)[..3],
            [
                TokenKind::Str("a'b".into()),
                TokenKind::Str("\nAé".into()),
                TokenKind::Str("\\d".into()),
            ]
        );
    }

    #[test]
    fn octal_escapes() {
        assert_eq!(
            kinds(r#"'\012' '\7' '\0' '\1234' '\08' '\777'"#)[..6],
            [
                TokenKind::Str("\n".into()),
                TokenKind::Str("\x07".into()),
                TokenKind::Str("\0".into()),
                TokenKind::Str("S4".into()),
                TokenKind::Str("\08".into()),
                TokenKind::Str("\u{1ff}".into()),
            ]
        );
    }

    #[test]
    fn named_unicode_escape_is_rejected() {
        assert!(matches!(
            tokenize(r"'\N{BULLET}'"),
            Err(Error::Syntax { offset: 1, .. })
        ));
        assert_eq!(kinds(r"'\N'")[0], TokenKind::Str("\\N".into()));
    }

    #[test]
    fn triple_quoted_string() {
        assert_eq!(
            kinds("'''one\ntwo'''")[0],
            TokenKind::Str("one\ntwo".into())
        );
    }

    #[test]
    fn operators_prefer_longest_match() {
        assert_eq!(
            kinds("** * // =="),
            vec![
                TokenKind::Op("**"),
                TokenKind::Op("*"),
                TokenKind::Op("//"),
                TokenKind::Op("=="),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_and_newlines_are_skipped() {
        assert_eq!(
            kinds("f(\n  1, # first\n)\n"),
            vec![
                TokenKind::Name("f".into()),
                TokenKind::LParen,
                TokenKind::Int {
                    digits: "1".into(),
                    radix: 10
                },
                TokenKind::Comma,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_offset() {
        let err = tokenize("f('abc)").unwrap_err();
        assert_eq!(
            err,
            Error::Syntax {
                offset: 2,
                message: "unterminated string literal".into()
            }
        );
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(matches!(tokenize("f(1) ; g()"), Err(Error::Syntax { offset: 5, .. })));
        assert!(matches!(tokenize("f($)"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn rejects_identifier_glued_to_number() {
        assert!(matches!(tokenize("f(2j)"), Err(Error::Syntax { .. })));
    }
}
