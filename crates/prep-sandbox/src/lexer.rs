//! Tokenizer for candidate expressions.

use std::fmt;

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Amp,
    Pipe,
    Tilde,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {n}"),
            Self::Ident(name) => write!(f, "'{name}'"),
            Self::Str(s) => write!(f, "string '{s}'"),
            Self::End => f.write_str("end of expression"),
            other => write!(f, "'{}'", other.symbol()),
        }
    }
}

impl Token {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Percent => "%",
            Self::DoubleStar => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Tilde => "~",
            Self::Assign => "=",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Number(_) | Self::Ident(_) | Self::Str(_) | Self::End => "",
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Splits `source` into tokens, always ending with [`Token::End`].
pub fn tokenize(source: &str) -> Result<Vec<Spanned>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        let start = pos;
        let token = match c {
            b'0'..=b'9' => {
                let (number, end) = lex_number(source, pos)?;
                pos = end;
                Token::Number(number)
            }
            b'.' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                let (number, end) = lex_number(source, pos)?;
                pos = end;
                Token::Number(number)
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_')
                {
                    pos += 1;
                }
                Token::Ident(source[start..pos].to_string())
            }
            b'\'' | b'"' => {
                let (text, end) = lex_string(source, pos)?;
                pos = end;
                Token::Str(text)
            }
            _ => {
                let next = bytes.get(pos + 1).copied();
                let (token, width) = match (c, next) {
                    (b'*', Some(b'*')) => (Token::DoubleStar, 2),
                    (b'/', Some(b'/')) => (Token::DoubleSlash, 2),
                    (b'=', Some(b'=')) => (Token::Eq, 2),
                    (b'!', Some(b'=')) => (Token::NotEq, 2),
                    (b'<', Some(b'=')) => (Token::LtEq, 2),
                    (b'>', Some(b'=')) => (Token::GtEq, 2),
                    (b'+', _) => (Token::Plus, 1),
                    (b'-', _) => (Token::Minus, 1),
                    (b'*', _) => (Token::Star, 1),
                    (b'/', _) => (Token::Slash, 1),
                    (b'%', _) => (Token::Percent, 1),
                    (b'<', _) => (Token::Lt, 1),
                    (b'>', _) => (Token::Gt, 1),
                    (b'&', _) => (Token::Amp, 1),
                    (b'|', _) => (Token::Pipe, 1),
                    (b'~', _) => (Token::Tilde, 1),
                    (b'=', _) => (Token::Assign, 1),
                    (b'(', _) => (Token::LParen, 1),
                    (b')', _) => (Token::RParen, 1),
                    (b'[', _) => (Token::LBracket, 1),
                    (b']', _) => (Token::RBracket, 1),
                    (b',', _) => (Token::Comma, 1),
                    (b'.', _) => (Token::Dot, 1),
                    _ => {
                        let ch = source[pos..].chars().next().unwrap_or('?');
                        return Err(ExprError::Lex {
                            offset: pos,
                            message: format!("unexpected character '{ch}'"),
                        });
                    }
                };
                pos += width;
                token
            }
        };
        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    tokens.push(Spanned {
        token: Token::End,
        offset: source.len(),
    });
    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(f64, usize)> {
    let bytes = source.as_bytes();
    let mut pos = start;
    let digits = |pos: &mut usize| {
        while *pos < bytes.len() && (bytes[*pos].is_ascii_digit() || bytes[*pos] == b'_') {
            *pos += 1;
        }
    };
    digits(&mut pos);
    // `2.abs()` is a method call, `2.` and `2.5` are numbers
    let method_follows = bytes
        .get(pos + 1)
        .is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_');
    if pos < bytes.len() && bytes[pos] == b'.' && !method_follows {
        pos += 1;
        digits(&mut pos);
    }
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            pos = exp;
            digits(&mut pos);
        }
    }
    let text: String = source[start..pos].chars().filter(|c| *c != '_').collect();
    text.parse::<f64>()
        .map(|n| (n, pos))
        .map_err(|_| ExprError::Lex {
            offset: start,
            message: format!("malformed number '{}'", &source[start..pos]),
        })
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize)> {
    let quote = source.as_bytes()[start] as char;
    let mut out = String::new();
    let mut chars = source[start + 1..].char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((out, start + 1 + i + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, escaped)) => out.push(escaped),
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(ExprError::Lex {
        offset: start,
        message: "unterminated string literal".to_string(),
    })
}
