//! Chess game trees: a mainline with arbitrarily nested variations, stable
//! addressing of every position, and lossless PGN conversion.
//!
//! ```
//! use pawn_appetit_movetree::{pgn, ShakmatyOracle};
//!
//! let text = "1. e4 e5 (1... c5 2. Nf3 (2. Nc3) d6) 2. Nf3";
//! let (tree, _headers) = pgn::parse(text, &ShakmatyOracle::default()).unwrap();
//! assert_eq!(pgn::serialize(&tree), text);
//! ```

pub mod chess;
pub mod config;
pub mod error;
pub mod pgn;
pub mod session;
pub mod tree;

pub use {
    chess::{MoveInput, MoveOracle, ShakmatyOracle, StartPosition},
    config::{ExportOptions, GameConfig},
    error::{Error, ParseError, Result},
    pgn::HeaderMap,
    session::{GameSession, LoadMode, PositionChanged, SessionManager},
    tree::{Address, Annotation, AnnotationId, BranchPoint, Cursor, GameTree, GlyphKind, MoveRecord},
};
