//! Files holding more than one game.

use log::{info, warn};
use pgn_reader::{BufferedReader, RawHeader, Skip, Visitor};

use crate::chess::MoveOracle;
use crate::error::{ParseError, Result};
use crate::pgn::headers::HeaderMap;
use crate::pgn::lexer::{lex_pgn, TokenKind};
use crate::pgn::parser::parse;
use crate::tree::GameTree;

#[derive(Default)]
struct HeaderScanner {
    headers: HeaderMap,
}

impl Visitor for HeaderScanner {
    type Result = HeaderMap;

    fn begin_game(&mut self) {
        self.headers = HeaderMap::new();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        self.headers
            .insert(String::from_utf8_lossy(key), value.decode_utf8_lossy());
    }

    fn end_headers(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {
        std::mem::take(&mut self.headers)
    }
}

/// Reads the header section of every game, skipping movetext.
pub fn scan_headers(text: &str) -> Result<Vec<HeaderMap>> {
    let mut reader = BufferedReader::new_cursor(text.as_bytes());
    let mut scanner = HeaderScanner::default();
    let mut games = Vec::new();
    while let Some(headers) = reader.read_game(&mut scanner)? {
        games.push(headers);
    }
    info!("Scanned headers of {} games", games.len());
    Ok(games)
}

/// Slices `text` into the source of individual games.
///
/// A game ends at its result token, or where the header section of the next
/// game begins.
pub fn split_games(text: &str) -> Result<Vec<&str>, ParseError> {
    let tokens = lex_pgn(text)?;
    let mut games = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_movetext = false;

    for token in &tokens {
        match &token.kind {
            TokenKind::Header { .. } if in_movetext => {
                if let Some(begin) = start {
                    games.push(text[begin..token.offset].trim());
                }
                start = Some(token.offset);
                in_movetext = false;
            }
            TokenKind::Result(result) => {
                let begin = start.unwrap_or(token.offset);
                games.push(text[begin..token.offset + result.as_str().len()].trim());
                start = None;
                in_movetext = false;
            }
            TokenKind::Header { .. } => {
                start.get_or_insert(token.offset);
            }
            _ => {
                start.get_or_insert(token.offset);
                in_movetext = true;
            }
        }
    }
    if let Some(begin) = start {
        games.push(text[begin..].trim());
    }
    Ok(games)
}

/// Parses every game of a collection. A game that fails to parse does not
/// stop the others.
pub fn parse_games(
    text: &str,
    oracle: &dyn MoveOracle,
) -> Vec<Result<(GameTree, HeaderMap), ParseError>> {
    let games = match split_games(text) {
        Ok(games) => games,
        Err(e) => return vec![Err(e)],
    };
    games
        .into_iter()
        .enumerate()
        .map(|(index, source)| {
            parse(source, oracle).inspect_err(|e| warn!("Game {} failed to parse: {e}", index + 1))
        })
        .collect()
}
