//! Chess rules integration.
//!
//! The game tree consumes chess rules only through the [`MoveOracle`] trait;
//! this module provides the trait and its shakmaty-backed implementation.

pub mod oracle;

pub use oracle::{MoveInput, MoveOracle, ShakmatyOracle, StartPosition};
