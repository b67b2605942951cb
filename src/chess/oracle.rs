//! Move legality oracle.
//!
//! The tree never interprets chess rules itself. Every move enters the tree
//! as a [`MoveRecord`] produced by a [`MoveOracle`]; positions are opaque FEN
//! strings to everything else in the crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen,
    san::SanPlus,
    uci::UciMove,
    CastlingMode, Chess, Color, EnPassantMode, Position,
};
use specta::Type;

use crate::tree::{MoveRecord, Side, UciParts};

/// A move as proposed by a user, a parser or an engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum MoveInput {
    San(String),
    Uci(String),
}

impl MoveInput {
    pub fn san(text: impl Into<String>) -> Self {
        MoveInput::San(text.into())
    }

    pub fn uci(text: impl Into<String>) -> Self {
        MoveInput::Uci(text.into())
    }

    /// From drag-and-drop style coordinates.
    pub fn from_squares(from: &str, to: &str, promotion: Option<char>) -> Self {
        let mut text = format!("{from}{to}");
        if let Some(role) = promotion {
            text.push(role.to_ascii_lowercase());
        }
        MoveInput::Uci(text)
    }
}

impl fmt::Display for MoveInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveInput::San(text) | MoveInput::Uci(text) => f.write_str(text),
        }
    }
}

/// A validated starting position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct StartPosition {
    pub fen: String,
    /// Ply index of the first move, counted from the standard initial
    /// position.
    pub ply_index: usize,
}

/// Chess rules as seen by the tree. Implementations must be pure.
pub trait MoveOracle: Send + Sync {
    /// Plays `input` in `position`, or `None` when it is not a legal move.
    fn try_move(&self, position: &str, input: &MoveInput) -> Option<MoveRecord>;

    /// Validates and normalizes a FEN used as a starting position.
    fn start_position(&self, fen: &str) -> Option<StartPosition>;
}

/// [`MoveOracle`] backed by shakmaty.
#[derive(Debug, Clone, Copy)]
pub struct ShakmatyOracle {
    castling_mode: CastlingMode,
}

impl Default for ShakmatyOracle {
    fn default() -> Self {
        Self::new(CastlingMode::Standard)
    }
}

impl ShakmatyOracle {
    pub fn new(castling_mode: CastlingMode) -> Self {
        Self { castling_mode }
    }

    pub fn chess960() -> Self {
        Self::new(CastlingMode::Chess960)
    }

    fn position(&self, fen: &str) -> Option<Chess> {
        let fen = Fen::from_ascii(fen.as_bytes()).ok()?;
        fen.into_position(self.castling_mode).ok()
    }
}

fn fen_of(position: Chess) -> String {
    Fen::from_setup(position.into_setup(EnPassantMode::Legal)).to_string()
}

fn side_of(color: Color) -> Side {
    match color {
        Color::White => Side::White,
        Color::Black => Side::Black,
    }
}

impl MoveOracle for ShakmatyOracle {
    fn try_move(&self, position: &str, input: &MoveInput) -> Option<MoveRecord> {
        let mut chess = self.position(position)?;
        let mv = match input {
            MoveInput::San(text) => {
                let san = SanPlus::from_ascii(text.as_bytes()).ok()?;
                san.san.to_move(&chess).ok()?
            }
            MoveInput::Uci(text) => {
                let uci = UciMove::from_ascii(text.as_bytes()).ok()?;
                uci.to_move(&chess).ok()?
            }
        };

        let side = side_of(chess.turn());
        let uci = match mv.to_uci(self.castling_mode) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Some(UciParts {
                from: from.to_string(),
                to: to.to_string(),
                promotion: promotion.map(|role| role.char().to_string()),
            }),
            _ => None,
        };
        let san = SanPlus::from_move_and_play_unchecked(&mut chess, &mv);
        Some(MoveRecord {
            san: san.to_string(),
            side,
            fen: fen_of(chess),
            uci,
        })
    }

    fn start_position(&self, fen: &str) -> Option<StartPosition> {
        let chess = self.position(fen.trim())?;
        let full_moves = chess.fullmoves().get() as usize;
        let ply_index = (full_moves - 1) * 2 + usize::from(chess.turn() == Color::Black);
        Some(StartPosition {
            fen: fen_of(chess),
            ply_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::INITIAL_FEN;

    #[test]
    fn san_moves_are_normalized() {
        let oracle = ShakmatyOracle::default();
        let record = oracle
            .try_move(INITIAL_FEN, &MoveInput::san("Ng1f3"))
            .unwrap();
        assert_eq!(record.san, "Nf3");
        assert_eq!(record.side, Side::White);
        assert_eq!(
            record.uci,
            Some(UciParts {
                from: "g1".into(),
                to: "f3".into(),
                promotion: None
            })
        );
        assert_eq!(
            record.fen,
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
    }

    #[test]
    fn uci_input_produces_san() {
        let oracle = ShakmatyOracle::default();
        let record = oracle
            .try_move(INITIAL_FEN, &MoveInput::from_squares("e2", "e4", None))
            .unwrap();
        assert_eq!(record.san, "e4");
        assert_eq!(record.engine_notation(), "e2e4");
    }

    #[test]
    fn promotion_keeps_role() {
        let oracle = ShakmatyOracle::default();
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let record = oracle
            .try_move(fen, &MoveInput::from_squares("e7", "e8", Some('Q')))
            .unwrap();
        assert_eq!(record.san, "e8=Q");
        assert_eq!(record.engine_notation(), "e7e8q");
    }

    #[test]
    fn illegal_and_garbage_moves_are_rejected() {
        let oracle = ShakmatyOracle::default();
        assert!(oracle.try_move(INITIAL_FEN, &MoveInput::san("e5")).is_none());
        assert!(oracle.try_move(INITIAL_FEN, &MoveInput::san("hello")).is_none());
        assert!(oracle.try_move(INITIAL_FEN, &MoveInput::uci("e2e5")).is_none());
        assert!(oracle.try_move("not a fen", &MoveInput::san("e4")).is_none());
    }

    #[test]
    fn start_position_counts_plies() {
        let oracle = ShakmatyOracle::default();
        let start = oracle.start_position(INITIAL_FEN).unwrap();
        assert_eq!(start.ply_index, 0);

        let start = oracle
            .start_position("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3")
            .unwrap();
        assert_eq!(start.ply_index, 4);

        let start = oracle
            .start_position("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
            .unwrap();
        assert_eq!(start.ply_index, 1);
        assert!(oracle.start_position("8/8/8/8/8/8/8/8 w - - 0 1").is_none());
    }
}
