//! Tokenizer for rewritten rules

use crate::error::{ParseError, Result};
use std::fmt;

/// Rule token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    If,
    Else,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semicolon,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Bang,
}

/// Token with its byte offset in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string '{}'", s),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::If => write!(f, "'if'"),
            Token::Else => write!(f, "'else'"),
            Token::True => write!(f, "'true'"),
            Token::False => write!(f, "'false'"),
            Token::Null => write!(f, "'null'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Semicolon => write!(f, "';'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Lt => write!(f, "'<'"),
            Token::Le => write!(f, "'<='"),
            Token::Gt => write!(f, "'>'"),
            Token::Ge => write!(f, "'>='"),
            Token::Assign => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::AndAnd => write!(f, "'&&'"),
            Token::OrOr => write!(f, "'||'"),
            Token::Bang => write!(f, "'!'"),
        }
    }
}

/// Rule tokenizer
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Spanned>> {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }

        let Some((offset, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ';' => Token::Semicolon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '=' => self.either('=', Token::EqEq, Token::Assign),
            '!' => self.either('=', Token::NotEq, Token::Bang),
            '<' => self.either('=', Token::Le, Token::Lt),
            '>' => self.either('=', Token::Ge, Token::Gt),
            '&' => self.require('&', Token::AndAnd, offset)?,
            '|' => self.require('|', Token::OrOr, offset)?,
            '\'' | '"' => self.string(c, offset)?,
            c if c.is_ascii_digit() => self.number(offset),
            '$' if matches!(self.chars.peek(), Some(&(_, '{'))) => {
                // Placeholder that nothing resolved
                return Err(ParseError::InvalidExpression(format!(
                    "unresolved placeholder at offset {}",
                    offset
                )));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => self.word(offset),
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    character: other,
                    offset,
                })
            }
        };

        Ok(Some(Spanned { token, offset }))
    }

    fn either(&mut self, next: char, matched: Token, otherwise: Token) -> Token {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == next) {
            self.chars.next();
            matched
        } else {
            otherwise
        }
    }

    fn require(&mut self, next: char, token: Token, offset: usize) -> Result<Token> {
        match self.chars.next() {
            Some((_, c)) if c == next => Ok(token),
            Some((pos, c)) => Err(ParseError::UnexpectedCharacter {
                character: c,
                offset: pos,
            }),
            None => Err(ParseError::UnexpectedCharacter {
                character: self.input[offset..].chars().next().unwrap_or(next),
                offset,
            }),
        }
    }

    fn string(&mut self, quote: char, offset: usize) -> Result<Token> {
        let mut value = String::new();
        while let Some((_, c)) = self.chars.next() {
            if c == quote {
                return Ok(Token::Str(value));
            }
            if c == '\\' {
                if let Some((_, escaped)) = self.chars.next() {
                    value.push(escaped);
                }
                continue;
            }
            value.push(c);
        }
        Err(ParseError::InvalidExpression(format!(
            "unterminated string starting at offset {}",
            offset
        )))
    }

    fn number(&mut self, start: usize) -> Token {
        let mut end = start + 1;
        let mut seen_dot = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                end = pos + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.input[start..end];
        // a trailing dot ("3.") still parses as f64
        Token::Number(text.parse::<f64>().unwrap_or(0.0))
    }

    fn word(&mut self, start: usize) -> Token {
        let mut end = start + 1;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
                end = pos + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        match &self.input[start..end] {
            "if" => Token::If,
            "else" => Token::Else,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            word => Token::Ident(word.to_string()),
        }
    }
}
