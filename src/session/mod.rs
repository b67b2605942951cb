//! A game being edited: tree, headers, current cursor and listeners.

pub mod manager;

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use specta::Type;

use crate::chess::{MoveInput, MoveOracle};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::pgn::{self, HeaderMap};
use crate::tree::{
    parent_of, Address, Annotation, AnnotationId, Cursor, GameTree, MoveRecord, Node,
};

pub use manager::SessionManager;

/// Sent to listeners whenever the current position of a session changes.
#[derive(Serialize, Debug, Clone, Type, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PositionChanged {
    pub cursor: Cursor,
    pub start_fen: String,
    pub fen: String,
    /// Moves from the start, in engine (UCI) notation where available.
    pub moves: Vec<String>,
}

pub type Listener = Box<dyn Fn(&PositionChanged) + Send + Sync>;

/// How [`GameSession::load_pgn`] combines the parsed game with the current one.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Type, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LoadMode {
    Replace,
    Merge,
}

pub struct GameSession {
    tree: GameTree,
    headers: HeaderMap,
    cursor: Cursor,
    oracle: Arc<dyn MoveOracle>,
    config: GameConfig,
    listeners: Vec<(usize, Listener)>,
    next_listener: usize,
}

impl GameSession {
    /// A new empty game using the shakmaty oracle selected by `config`.
    pub fn new(config: GameConfig) -> Result<Self> {
        let oracle = Arc::new(config.oracle());
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: GameConfig, oracle: Arc<dyn MoveOracle>) -> Result<Self> {
        let tree = match &config.start_fen {
            Some(fen) => {
                let start = oracle
                    .start_position(fen)
                    .ok_or_else(|| Error::InvalidPosition(fen.clone()))?;
                GameTree::with_start(start.fen, start.ply_index)
            }
            None => GameTree::new(),
        };
        Ok(Self {
            tree,
            headers: HeaderMap::new(),
            cursor: Cursor::root(),
            oracle,
            config,
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key, value);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// FEN of the current position.
    pub fn position(&self) -> Result<String> {
        self.tree.position_at(&self.cursor)
    }

    /// Moves leading to the current position.
    pub fn moves(&self) -> Result<Vec<MoveRecord>> {
        self.tree.resolve(&self.cursor)
    }

    /// The line the cursor is on, for move lists.
    pub fn current_line(&self) -> Result<&[Node]> {
        self.tree.line(&self.cursor.address)
    }

    /// Moves already in the tree that can be played from here.
    pub fn next_moves(&self) -> Result<Vec<(Cursor, &MoveRecord)>> {
        self.tree.alternatives(&self.cursor)
    }

    pub fn subscribe(&mut self, listener: Listener) -> usize {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: usize) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Plays a move from the current position, continuing along an existing
    /// move or branching as needed.
    pub fn play_move(&mut self, input: &MoveInput) -> Result<Cursor> {
        let fen = self.position()?;
        let record = match self.oracle.try_move(&fen, input) {
            Some(record) => record,
            None => {
                warn!("Rejected move {} in {}", input, fen);
                return Err(Error::IllegalMove {
                    input: input.to_string(),
                    position: fen,
                });
            }
        };
        self.cursor = self.tree.append(&self.cursor, record)?;
        self.notify(true);
        Ok(self.cursor.clone())
    }

    pub fn go_to(&mut self, cursor: Cursor) -> Result<()> {
        self.tree.validate(&cursor)?;
        self.cursor = cursor;
        self.notify(false);
        Ok(())
    }

    /// Steps back one ply, leaving a variation at its start. `false` at the
    /// starting position.
    pub fn back(&mut self) -> bool {
        match parent_of(&self.cursor) {
            Some(cursor) => {
                self.cursor = cursor;
                self.notify(false);
                true
            }
            None => false,
        }
    }

    /// Steps forward along the current line. `false` at its end.
    pub fn forward(&mut self) -> Result<bool> {
        match self.tree.next_of(&self.cursor)? {
            Some(cursor) => {
                self.cursor = cursor;
                self.notify(false);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn start(&mut self) {
        self.cursor = Cursor::root();
        self.notify(false);
    }

    /// Jumps to the last position of the current line.
    pub fn end(&mut self) -> Result<()> {
        self.cursor = self.tree.line_end(&self.cursor)?;
        self.notify(false);
        Ok(())
    }

    /// Deletes a variation. A cursor inside it moves to where the variation
    /// branched off; a cursor in a later sibling follows the index shift.
    pub fn delete_variation(&mut self, address: &Address) -> Result<()> {
        self.tree.delete_variation(address)?;
        let Some((parent, removed)) = address.parent() else {
            return Ok(());
        };

        if self.cursor.address.starts_with(address) {
            self.cursor = parent_of(&Cursor::new(address.clone(), 0)).unwrap_or_default();
        } else if self.cursor.address.starts_with(&parent) {
            let depth = parent.depth();
            if let Some(point) = self.cursor.address.points_mut().get_mut(depth) {
                if point.node_index == removed.node_index
                    && point.variation_index > removed.variation_index
                {
                    point.variation_index -= 1;
                }
            }
        }
        self.notify(true);
        Ok(())
    }

    /// Annotates the move leading to the current position.
    pub fn annotate(&mut self, annotation: Annotation) -> Result<AnnotationId> {
        let cursor = self.cursor.clone();
        self.annotate_at(&cursor, annotation)
    }

    pub fn annotate_at(&mut self, cursor: &Cursor, annotation: Annotation) -> Result<AnnotationId> {
        let id = self.tree.add_annotation(cursor, annotation)?;
        self.notify(true);
        Ok(id)
    }

    pub fn remove_annotation(&mut self, id: &AnnotationId) -> bool {
        let removed = self.tree.remove_annotation(id);
        if removed {
            self.notify(true);
        }
        removed
    }

    /// Loads a game from PGN text. `Replace` also resets headers and the
    /// cursor; `Merge` adds the new moves and keeps existing headers.
    pub fn load_pgn(&mut self, text: &str, mode: LoadMode) -> Result<()> {
        let (tree, headers) = pgn::parse(text, self.oracle.as_ref())?;
        match mode {
            LoadMode::Replace => {
                info!("Loaded game with {} nodes", tree.node_count());
                self.tree = tree;
                self.headers = headers;
                self.cursor = Cursor::root();
            }
            LoadMode::Merge => {
                let added = self.tree.merge(&tree)?;
                info!("Merged {} new moves into the game", added);
                for (key, value) in headers.iter() {
                    if !self.headers.contains(key) {
                        self.headers.insert(key, value);
                    }
                }
            }
        }
        self.notify(true);
        Ok(())
    }

    /// The game as PGN, using the export options of the session config.
    pub fn to_pgn(&self) -> String {
        pgn::write_game(&self.tree, &self.headers, &self.config.export)
    }

    /// Current position as a notification payload.
    pub fn snapshot(&self) -> Result<PositionChanged> {
        let moves = self.tree.resolve_refs(&self.cursor)?;
        Ok(PositionChanged {
            cursor: self.cursor.clone(),
            start_fen: self.tree.start_fen().to_string(),
            fen: moves
                .last()
                .map_or_else(|| self.tree.start_fen().to_string(), |record| record.fen.clone()),
            moves: moves.iter().map(|record| record.engine_notation()).collect(),
        })
    }

    fn notify(&self, mutation: bool) {
        if self.listeners.is_empty() || (!mutation && !self.config.notify_on_navigation) {
            return;
        }
        match self.snapshot() {
            Ok(event) => {
                for (_, listener) in &self.listeners {
                    listener(&event);
                }
            }
            Err(e) => warn!("Not notifying listeners: {}", e),
        }
    }
}
