// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line tokenizer
//!
//! Splits one line of a mysqldump file into tokens. Tokens are produced
//! lazily, so looking at the first few tokens of a multi-megabyte INSERT
//! line costs nothing.
//!
//! The tokenizer never fails: an unterminated quote or comment simply runs
//! to the end of the line. Every token displays as the exact text it was
//! read from.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// SQL Token enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A keyword (like CREATE) or an optionally quoted SQL identifier
    Word(Word),
    /// An unsigned numeric literal
    Number(String),
    /// Single quoted string, escapes kept as written: i.e: 'it\'s'
    SingleQuotedString(String),
    /// Comma
    Comma,
    /// Left parenthesis `(`
    LParen,
    /// Right parenthesis `)`
    RParen,
    /// SemiColon `;`
    SemiColon,
    /// Whitespace (space, tab, etc) and comments
    Whitespace(Whitespace),
    /// Any other character
    Char(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Word(ref w) => write!(f, "{}", w),
            Token::Number(ref n) => f.write_str(n),
            Token::SingleQuotedString(ref s) => write!(f, "'{}'", s),
            Token::Comma => f.write_str(","),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::SemiColon => f.write_str(";"),
            Token::Whitespace(ws) => write!(f, "{}", ws),
            Token::Char(ref c) => write!(f, "{}", c),
        }
    }
}

impl Token {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }

    /// True for an unquoted word equal to `keyword` (case-sensitive).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        match self {
            Token::Word(w) => w.quote_style.is_none() && w.value == keyword,
            _ => false,
        }
    }
}

/// A keyword (like CREATE) or an optionally quoted SQL identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// The value of the token, without the enclosing quotes
    pub value: String,
    /// MySQL quotes identifiers with backticks
    pub quote_style: Option<char>,
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.quote_style {
            Some(q) => write!(f, "{}{}{}", q, self.value, q),
            None => f.write_str(&self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Whitespace {
    Space,
    Tab,
    SingleLineComment(String),
    MultiLineComment(String),
}

impl fmt::Display for Whitespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Whitespace::Space => f.write_str(" "),
            Whitespace::Tab => f.write_str("\t"),
            Whitespace::SingleLineComment(s) => write!(f, "--{}", s),
            Whitespace::MultiLineComment(s) => write!(f, "/*{}*/", s),
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
        || ch == '_'
        || ch == '$'
        || ch == '@'
        || ('\u{0080}'..='\u{ffff}').contains(&ch)
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

/// Line tokenizer
pub struct Tokenizer<'a> {
    line: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line: line.chars().peekable(),
        }
    }

    /// Get the next token or return None at the end of the line
    pub fn next_token(&mut self) -> Option<Token> {
        let ch = *self.line.peek()?;
        let token = match ch {
            ' ' => self.consume_and_return(Token::Whitespace(Whitespace::Space)),
            '\t' => self.consume_and_return(Token::Whitespace(Whitespace::Tab)),
            // identifier or keyword
            ch if is_identifier_start(ch) => {
                let s = self.peeking_take_while(is_identifier_part);
                Token::Word(Word {
                    value: s,
                    quote_style: None,
                })
            }
            // string
            '\'' => Token::SingleQuotedString(self.tokenize_single_quoted_string()),
            // delimited (quoted) identifier
            '`' => {
                self.line.next(); // consume the opening quote
                let s = self.peeking_take_while(|ch| ch != '`');
                self.line.next(); // closing quote, if any
                Token::Word(Word {
                    value: s,
                    quote_style: Some('`'),
                })
            }
            // numbers
            '0'..='9' => {
                let s = self.peeking_take_while(|ch| matches!(ch, '0'..='9' | '.'));
                Token::Number(s)
            }
            // punctuation
            '(' => self.consume_and_return(Token::LParen),
            ')' => self.consume_and_return(Token::RParen),
            ',' => self.consume_and_return(Token::Comma),
            ';' => self.consume_and_return(Token::SemiColon),
            '-' => {
                self.line.next(); // consume the '-'
                match self.line.peek() {
                    Some('-') => {
                        self.line.next(); // consume the second '-', starting a single-line comment
                        let s = self.line.by_ref().collect();
                        Token::Whitespace(Whitespace::SingleLineComment(s))
                    }
                    _ => Token::Char('-'),
                }
            }
            '/' => {
                self.line.next(); // consume the '/'
                match self.line.peek() {
                    Some('*') => {
                        self.line.next(); // consume the '*', starting a multi-line comment
                        self.tokenize_multiline_comment()
                    }
                    _ => Token::Char('/'),
                }
            }
            other => self.consume_and_return(Token::Char(other)),
        };
        Some(token)
    }

    /// Read a single quoted string, starting with the opening quote.
    /// Backslash escapes and doubled quotes are kept verbatim.
    fn tokenize_single_quoted_string(&mut self) -> String {
        let chars = &mut self.line;
        let mut s = String::new();
        chars.next(); // consume the opening quote
        while let Some(ch) = chars.next() {
            match ch {
                '\'' => {
                    if chars.peek() == Some(&'\'') {
                        s.push('\'');
                        s.push('\'');
                        chars.next();
                    } else {
                        break;
                    }
                }
                '\\' => {
                    s.push('\\');
                    if let Some(escaped) = chars.next() {
                        s.push(escaped);
                    }
                }
                ch => s.push(ch),
            }
        }
        s
    }

    fn tokenize_multiline_comment(&mut self) -> Token {
        let mut s = String::new();
        let mut maybe_closing_comment = false;
        for ch in self.line.by_ref() {
            if maybe_closing_comment {
                if ch == '/' {
                    break;
                } else {
                    s.push('*');
                }
            }
            maybe_closing_comment = ch == '*';
            if !maybe_closing_comment {
                s.push(ch);
            }
        }
        Token::Whitespace(Whitespace::MultiLineComment(s))
    }

    fn consume_and_return(&mut self, t: Token) -> Token {
        self.line.next();
        t
    }

    /// Read from `line` until `predicate` returns `false` or the line ends.
    /// Return the characters read as String, and keep the first non-matching
    /// char available as `line.next()`.
    fn peeking_take_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(&ch) = self.line.peek() {
            if predicate(ch) {
                self.line.next(); // consume
                s.push(ch);
            } else {
                break;
            }
        }
        s
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}
