//! Token-level grammar of PGN text.

use std::fmt;

use serde::Serialize;
use specta::Type;

use crate::error::ParseError;
use crate::tree::GlyphKind;

/// Game termination marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
            GameResult::Ongoing => "*",
        }
    }

    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            "*" => Some(GameResult::Ongoing),
            _ => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Type)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum TokenKind {
    Header { key: String, value: String },
    MoveNumber { number: u32, black: bool },
    San(String),
    Glyph(GlyphKind),
    Comment(String),
    VariationStart,
    VariationEnd,
    Result(GameResult),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Header { key, value } => write!(f, "[{key} \"{value}\"]"),
            TokenKind::MoveNumber { number, black: false } => write!(f, "{number}."),
            TokenKind::MoveNumber { number, black: true } => write!(f, "{number}..."),
            TokenKind::San(san) => f.write_str(san),
            TokenKind::Glyph(glyph) => write!(f, "{glyph}"),
            TokenKind::Comment(text) => write!(f, "{{{text}}}"),
            TokenKind::VariationStart => f.write_str("("),
            TokenKind::VariationEnd => f.write_str(")"),
            TokenKind::Result(result) => write!(f, "{result}"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Type)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

const DELIMITERS: &[u8] = b"{}()[];";

/// Splits PGN text into tokens.
pub fn lex_pgn(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        text,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token { kind, offset });
    }

    fn run(&mut self) -> Result<(), ParseError> {
        let text = self.text;
        while let Some(&byte) = self.bytes().get(self.pos) {
            let start = self.pos;
            match byte {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'{' => {
                    let close = text[start + 1..]
                        .find('}')
                        .ok_or(ParseError::UnterminatedComment { offset: start })?;
                    let body = &text[start + 1..start + 1 + close];
                    self.push(TokenKind::Comment(body.trim().to_string()), start);
                    self.pos = start + close + 2;
                }
                b';' => {
                    let end = self.line_end(start);
                    let body = &text[start + 1..end];
                    self.push(TokenKind::Comment(body.trim().to_string()), start);
                    self.pos = end;
                }
                b'%' if start == 0 || self.bytes()[start - 1] == b'\n' => {
                    self.pos = self.line_end(start);
                }
                b'(' => {
                    self.push(TokenKind::VariationStart, start);
                    self.pos += 1;
                }
                b')' => {
                    self.push(TokenKind::VariationEnd, start);
                    self.pos += 1;
                }
                b'[' => self.header()?,
                b'*' => {
                    self.push(TokenKind::Result(GameResult::Ongoing), start);
                    self.pos += 1;
                }
                _ => {
                    let end = self.bytes()[start..]
                        .iter()
                        .position(|b| b.is_ascii_whitespace() || DELIMITERS.contains(b) || *b == b'*')
                        .map_or(text.len(), |len| start + len);
                    self.word(&text[start..end], start)?;
                    self.pos = end;
                }
            }
        }
        Ok(())
    }

    fn line_end(&self, from: usize) -> usize {
        self.text[from..]
            .find('\n')
            .map_or(self.text.len(), |len| from + len)
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes()
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    /// `[Key "Value"]`, with `\"` and `\\` escapes inside the value.
    fn header(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let unterminated = ParseError::UnterminatedHeader { offset: start };
        let malformed = ParseError::MalformedHeader { offset: start };
        self.pos += 1;
        self.skip_whitespace();

        let key_start = self.pos;
        while self
            .bytes()
            .get(self.pos)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.pos += 1;
        }
        if self.pos == key_start {
            return Err(malformed);
        }
        let key = self.text[key_start..self.pos].to_string();

        self.skip_whitespace();
        match self.bytes().get(self.pos) {
            Some(b'"') => self.pos += 1,
            Some(_) => return Err(malformed),
            None => return Err(unterminated),
        }

        let mut value = String::new();
        let text = self.text;
        let mut chars = text[self.pos..].char_indices();
        loop {
            match chars.next() {
                Some((_, '\\')) => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => return Err(unterminated),
                },
                Some((index, '"')) => {
                    self.pos += index + 1;
                    break;
                }
                Some((_, c)) => value.push(c),
                None => return Err(unterminated),
            }
        }

        self.skip_whitespace();
        match self.bytes().get(self.pos) {
            Some(b']') => self.pos += 1,
            Some(_) => return Err(malformed),
            None => return Err(unterminated),
        }
        self.push(TokenKind::Header { key, value }, start);
        Ok(())
    }

    fn word(&mut self, word: &str, offset: usize) -> Result<(), ParseError> {
        if let Some(result) = GameResult::from_token(word) {
            self.push(TokenKind::Result(result), offset);
            return Ok(());
        }
        if is_zero_castling(word) {
            return self.word(&word.replace('0', "O"), offset);
        }

        let first = word.chars().next().unwrap_or(' ');
        match first {
            '0'..='9' => self.move_number(word, offset),
            '$' | '!' | '?' | '+' | '=' | '-' => {
                let glyph = GlyphKind::from_symbol(word).ok_or_else(|| ParseError::InvalidGlyph {
                    token: word.to_string(),
                    offset,
                })?;
                self.push(TokenKind::Glyph(glyph), offset);
                Ok(())
            }
            c if c.is_ascii_alphabetic() => {
                let split = word.find(['!', '?']).unwrap_or(word.len());
                self.push(TokenKind::San(word[..split].to_string()), offset);
                if split < word.len() {
                    let suffix = &word[split..];
                    let glyph =
                        GlyphKind::from_symbol(suffix).ok_or_else(|| ParseError::InvalidGlyph {
                            token: suffix.to_string(),
                            offset: offset + split,
                        })?;
                    self.push(TokenKind::Glyph(glyph), offset + split);
                }
                Ok(())
            }
            character => Err(ParseError::UnexpectedCharacter { character, offset }),
        }
    }

    /// `12.` or `12...`, possibly glued to the move that follows.
    fn move_number(&mut self, word: &str, offset: usize) -> Result<(), ParseError> {
        let malformed = || ParseError::MalformedMoveNumber {
            token: word.to_string(),
            offset,
        };
        let digits = word
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(word.len());
        let number: u32 = word[..digits].parse().map_err(|_| malformed())?;
        let dots = word[digits..]
            .find(|c: char| c != '.')
            .unwrap_or(word.len() - digits);
        let black = match dots {
            1 => false,
            3 => true,
            _ => return Err(malformed()),
        };
        if number == 0 {
            return Err(malformed());
        }
        self.push(TokenKind::MoveNumber { number, black }, offset);

        let rest = digits + dots;
        if rest < word.len() {
            self.word(&word[rest..], offset + rest)?;
        }
        Ok(())
    }
}

fn is_zero_castling(word: &str) -> bool {
    let core = word.trim_end_matches(['+', '#', '!', '?']);
    core == "0-0" || core == "0-0-0"
}
