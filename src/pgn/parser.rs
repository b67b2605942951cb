//! Recursive-descent reader from PGN text into a [`GameTree`].

use log::{debug, warn};

use crate::chess::{MoveInput, MoveOracle};
use crate::error::ParseError;
use crate::pgn::headers::HeaderMap;
use crate::pgn::lexer::{lex_pgn, Token, TokenKind};
use crate::tree::{Annotation, GameTree, Line, Node, Side, INITIAL_FEN};

/// Deepest parenthesis nesting accepted in movetext.
pub const MAX_VARIATION_DEPTH: usize = 256;

/// Parses a single game.
///
/// Every move is checked against `oracle`; the `FEN` header, when present,
/// sets the starting position.
pub fn parse(text: &str, oracle: &dyn MoveOracle) -> Result<(GameTree, HeaderMap), ParseError> {
    let tokens = lex_pgn(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: text.len(),
        oracle,
        depth: 0,
        next_key: 0,
    };

    let mut headers = parser.headers();
    let mut tree = match headers.fen() {
        Some(fen) => {
            let start = oracle
                .start_position(fen)
                .ok_or_else(|| ParseError::InvalidFen {
                    fen: fen.to_string(),
                })?;
            GameTree::with_start(start.fen, start.ply_index)
        }
        None => GameTree::with_start(INITIAL_FEN, 0),
    };

    let mainline = parser.line(tree.start_fen(), tree.start_ply(), None)?;
    tree.mainline = mainline.nodes;
    tree.root_variations = mainline.leading;
    tree.intro = mainline.intro;
    tree.next_annotation_key = parser.next_key;

    if let Some(token) = parser.peek() {
        match &token.kind {
            TokenKind::Result(result) => {
                if !headers.contains("Result") {
                    headers.insert("Result", result.as_str());
                }
                parser.pos += 1;
            }
            _ => return Err(unexpected(token)),
        }
    }
    if let Some(token) = parser.peek() {
        return Err(unexpected(token));
    }

    debug!(
        "Parsed game with {} moves in {} nodes",
        tree.mainline.len(),
        tree.node_count()
    );
    Ok((tree, headers))
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        token: token.kind.to_string(),
        offset: token.offset,
    }
}

/// A parsed line: its moves, the alternatives to its first move and the
/// comments that preceded that first move.
struct ParsedLine {
    nodes: Line,
    leading: Vec<Line>,
    intro: Vec<String>,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
    oracle: &'a dyn MoveOracle,
    depth: usize,
    next_key: u32,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn annotation_key(&mut self) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn headers(&mut self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        while let Some(Token {
            kind: TokenKind::Header { key, value },
            ..
        }) = self.peek()
        {
            headers.insert(key.as_str(), value.as_str());
            self.pos += 1;
        }
        headers
    }

    /// Parses moves until the end of the current line.
    ///
    /// `opened_at` is the offset of the `(` that opened a variation, `None`
    /// for the mainline. Stops before a result token on the mainline and
    /// after the closing `)` of a variation.
    fn line(
        &mut self,
        start_fen: &str,
        first_ply: usize,
        opened_at: Option<usize>,
    ) -> Result<ParsedLine, ParseError> {
        let is_mainline = opened_at.is_none();
        let mut parsed = ParsedLine {
            nodes: Vec::new(),
            leading: Vec::new(),
            intro: Vec::new(),
        };

        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::MoveNumber { number, black } => {
                    self.pos += 1;
                    let san = match self.peek() {
                        Some(Token {
                            kind: TokenKind::San(san),
                            ..
                        }) => san,
                        Some(next) => return Err(ParseError::ExpectedMove { offset: next.offset }),
                        None => return Err(ParseError::ExpectedMove { offset: self.end }),
                    };
                    let ply = first_ply + parsed.nodes.len();
                    let expected = (ply / 2 + 1) as u32;
                    if *number != expected || *black != (ply % 2 == 1) {
                        warn!(
                            "Move number {} does not match ply {ply} ({} to move) before {san}",
                            token.kind,
                            Side::from_ply_index(ply)
                        );
                    }
                }
                TokenKind::San(san) => {
                    let ply = first_ply + parsed.nodes.len();
                    let position = parsed
                        .nodes
                        .last()
                        .map_or(start_fen, |node| node.record().fen.as_str());
                    let record = self
                        .oracle
                        .try_move(position, &MoveInput::san(san.as_str()))
                        .ok_or_else(|| ParseError::IllegalMove {
                            token: san.clone(),
                            ply,
                        })?;
                    let mut node = Node::new(record, ply, is_mainline);
                    if parsed.nodes.is_empty() && !is_mainline {
                        for text in parsed.intro.drain(..) {
                            node.push_annotation(self.annotation_key(), Annotation::Comment(text));
                        }
                    }
                    parsed.nodes.push(node);
                    self.pos += 1;
                }
                TokenKind::Glyph(glyph) => {
                    let key = self.annotation_key();
                    let node = parsed.nodes.last_mut().ok_or_else(|| unexpected(token))?;
                    node.push_annotation(key, Annotation::Glyph(*glyph));
                    self.pos += 1;
                }
                TokenKind::Comment(text) => {
                    if text.contains('}') {
                        return Err(ParseError::UnexpectedCharacter {
                            character: '}',
                            offset: token.offset,
                        });
                    }
                    match parsed.nodes.last_mut() {
                        Some(node) => {
                            let key = self.annotation_key();
                            node.push_annotation(key, Annotation::Comment(text.clone()));
                        }
                        None => parsed.intro.push(text.clone()),
                    }
                    self.pos += 1;
                }
                TokenKind::VariationStart => {
                    self.pos += 1;
                    self.variation(&mut parsed, start_fen, token.offset)?;
                }
                TokenKind::VariationEnd => {
                    if is_mainline {
                        return Err(ParseError::UnmatchedParenthesis {
                            offset: token.offset,
                        });
                    }
                    self.pos += 1;
                    return Ok(parsed);
                }
                TokenKind::Result(_) if is_mainline => return Ok(parsed),
                TokenKind::Result(_) | TokenKind::Header { .. } => return Err(unexpected(token)),
            }
        }

        match opened_at {
            Some(offset) => Err(ParseError::UnmatchedParenthesis { offset }),
            None => Ok(parsed),
        }
    }

    /// Parses a parenthesised alternative to the last move of `parsed` and
    /// attaches it to the node before that move.
    fn variation(
        &mut self,
        parsed: &mut ParsedLine,
        start_fen: &str,
        offset: usize,
    ) -> Result<(), ParseError> {
        let replaced = parsed.nodes.len().checked_sub(1).ok_or(ParseError::UnexpectedToken {
            token: "(".to_string(),
            offset,
        })?;
        let host = replaced.checked_sub(1);
        let fen = match host {
            Some(index) => parsed.nodes[index].record().fen.clone(),
            None => start_fen.to_string(),
        };
        let ply = parsed.nodes[replaced].ply_index();

        if self.depth >= MAX_VARIATION_DEPTH {
            return Err(ParseError::NestingTooDeep { offset });
        }
        self.depth += 1;
        let variation = self.line(&fen, ply, Some(offset));
        self.depth -= 1;
        let mut variation = variation?;
        if variation.nodes.is_empty() {
            return Err(ParseError::EmptyVariation { offset });
        }

        let target = match host {
            Some(index) => &mut parsed.nodes[index].variations,
            None => &mut parsed.leading,
        };
        target.push(std::mem::take(&mut variation.nodes));
        target.append(&mut variation.leading);
        Ok(())
    }
}
