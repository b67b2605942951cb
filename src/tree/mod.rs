//! The game tree: data model, structural operations, navigation and
//! annotations.

pub mod annotations;
pub mod model;
pub mod navigator;
pub mod types;

pub use {
    annotations::{Annotation, AnnotationId, GlyphKind},
    model::AppendKind,
    navigator::parent_of,
    types::{Address, BranchPoint, Cursor, GameTree, Line, MoveRecord, Node, Side, UciParts, INITIAL_FEN},
};
