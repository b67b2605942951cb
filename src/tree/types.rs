//! Core data structures of the game tree.
//!
//! A game is a mainline plus variations hanging off individual nodes. Any
//! position in the tree is named by a [`Cursor`]: an [`Address`] selecting a
//! line and a ply offset into that line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::error::Error;
use crate::tree::annotations::StoredAnnotation;

/// FEN of the standard initial position.
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn from_ply_index(ply_index: usize) -> Self {
        if ply_index % 2 == 0 {
            Side::White
        } else {
            Side::Black
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// UCI coordinates of a move (`e7`, `e8`, `q`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
pub struct UciParts {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

impl fmt::Display for UciParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = &self.promotion {
            f.write_str(promotion)?;
        }
        Ok(())
    }
}

/// One accepted ply, as produced by the legality oracle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub san: String,
    /// Side to move before the ply.
    pub side: Side,
    /// Position after the ply.
    pub fen: String,
    pub uci: Option<UciParts>,
}

impl MoveRecord {
    /// Notation used when handing the move to an engine.
    pub fn engine_notation(&self) -> String {
        match &self.uci {
            Some(uci) => uci.to_string(),
            None => self.san.clone(),
        }
    }
}

/// "At node `node_index` of the parent line, take variation `variation_index`."
///
/// A node index of `-1` names the virtual node before the first mainline
/// move, i.e. a root-level variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct BranchPoint {
    pub node_index: isize,
    pub variation_index: usize,
}

impl BranchPoint {
    pub const ROOT_NODE: isize = -1;

    pub fn new(node_index: isize, variation_index: usize) -> Self {
        Self {
            node_index,
            variation_index,
        }
    }

    pub fn root(variation_index: usize) -> Self {
        Self::new(Self::ROOT_NODE, variation_index)
    }

    pub fn is_root(&self) -> bool {
        self.node_index == Self::ROOT_NODE
    }
}

impl fmt::Display for BranchPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_index, self.variation_index)
    }
}

/// Path of branch points from the mainline down to a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(transparent)]
pub struct Address(Vec<BranchPoint>);

impl Address {
    /// The empty address, naming the mainline.
    pub fn mainline() -> Self {
        Self(Vec::new())
    }

    pub fn is_mainline(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn branch_points(&self) -> &[BranchPoint] {
        &self.0
    }

    pub fn last(&self) -> Option<&BranchPoint> {
        self.0.last()
    }

    /// This address extended by one branch point.
    pub fn child(&self, branch: BranchPoint) -> Self {
        let mut points = self.0.clone();
        points.push(branch);
        Self(points)
    }

    /// This address with its last branch point popped.
    pub fn parent(&self) -> Option<(Address, BranchPoint)> {
        let (last, rest) = self.0.split_last()?;
        Some((Self(rest.to_vec()), *last))
    }

    pub fn starts_with(&self, prefix: &Address) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub(crate) fn points_mut(&mut self) -> &mut Vec<BranchPoint> {
        &mut self.0
    }
}

impl From<Vec<BranchPoint>> for Address {
    fn from(points: Vec<BranchPoint>) -> Self {
        Self(points)
    }
}

impl FromIterator<(isize, usize)> for Address {
    fn from_iter<I: IntoIterator<Item = (isize, usize)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(node, variation)| BranchPoint::new(node, variation))
                .collect(),
        )
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, point) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{point}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::mainline());
        }
        s.split('/')
            .map(|part| {
                let (node, variation) = part
                    .split_once(':')
                    .ok_or_else(|| Error::MalformedAddress(s.to_string()))?;
                let node = node
                    .parse::<isize>()
                    .map_err(|_| Error::MalformedAddress(s.to_string()))?;
                let variation = variation
                    .parse::<usize>()
                    .map_err(|_| Error::MalformedAddress(s.to_string()))?;
                if node < BranchPoint::ROOT_NODE {
                    return Err(Error::MalformedAddress(s.to_string()));
                }
                Ok(BranchPoint::new(node, variation))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// An address plus a ply offset into the addressed line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub address: Address,
    pub ply: usize,
}

impl Cursor {
    pub fn new(address: Address, ply: usize) -> Self {
        Self { address, ply }
    }

    /// The starting position.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.address.is_mainline() && self.ply == 0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.ply)
    }
}

impl FromStr for Cursor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, ply) = s
            .rsplit_once('@')
            .ok_or_else(|| Error::MalformedAddress(s.to_string()))?;
        let ply = ply
            .parse::<usize>()
            .map_err(|_| Error::MalformedAddress(s.to_string()))?;
        Ok(Self::new(address.parse()?, ply))
    }
}

/// A line of moves: the mainline or one variation.
pub type Line = Vec<Node>;

/// A single move in the tree together with the variations branching off it.
///
/// Variations hanging off a node are alternatives to the *next* move of the
/// node's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub(crate) record: MoveRecord,
    pub(crate) ply_index: usize,
    pub(crate) is_mainline: bool,
    pub(crate) annotations: Vec<StoredAnnotation>,
    pub(crate) variations: Vec<Line>,
}

impl Node {
    pub fn new(record: MoveRecord, ply_index: usize, is_mainline: bool) -> Self {
        Self {
            record,
            ply_index,
            is_mainline,
            annotations: Vec::new(),
            variations: Vec::new(),
        }
    }

    pub fn record(&self) -> &MoveRecord {
        &self.record
    }

    pub fn san(&self) -> &str {
        &self.record.san
    }

    pub fn ply_index(&self) -> usize {
        self.ply_index
    }

    pub fn move_number(&self) -> usize {
        self.ply_index / 2 + 1
    }

    pub fn is_white(&self) -> bool {
        self.ply_index % 2 == 0
    }

    pub fn is_mainline(&self) -> bool {
        self.is_mainline
    }

    pub fn variations(&self) -> &[Line] {
        &self.variations
    }
}

/// Root container: starting position, mainline and root-level variations.
///
/// Equality compares the game content; annotation keys handed out so far are
/// not part of it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTree {
    pub(crate) start_fen: String,
    pub(crate) start_ply: usize,
    pub(crate) mainline: Line,
    pub(crate) root_variations: Vec<Line>,
    pub(crate) intro: Vec<String>,
    #[serde(skip)]
    pub(crate) next_annotation_key: u32,
}

impl PartialEq for GameTree {
    fn eq(&self, other: &Self) -> bool {
        self.start_fen == other.start_fen
            && self.start_ply == other.start_ply
            && self.mainline == other.mainline
            && self.root_variations == other.root_variations
            && self.intro == other.intro
    }
}

impl Eq for GameTree {}

impl Default for GameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTree {
    /// An empty game from the standard initial position.
    pub fn new() -> Self {
        Self::with_start(INITIAL_FEN, 0)
    }

    /// An empty game from a custom position. `start_ply` is the ply index of
    /// the first move, counted from the standard initial position.
    pub fn with_start(fen: impl Into<String>, start_ply: usize) -> Self {
        Self {
            start_fen: fen.into(),
            start_ply,
            mainline: Vec::new(),
            root_variations: Vec::new(),
            intro: Vec::new(),
            next_annotation_key: 0,
        }
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn start_ply(&self) -> usize {
        self.start_ply
    }

    pub fn has_custom_start(&self) -> bool {
        self.start_fen != INITIAL_FEN
    }

    pub fn mainline(&self) -> &[Node] {
        &self.mainline
    }

    pub fn root_variations(&self) -> &[Line] {
        &self.root_variations
    }

    /// Comments preceding the first move.
    pub fn intro_comments(&self) -> &[String] {
        &self.intro
    }

    pub fn is_empty(&self) -> bool {
        self.mainline.is_empty() && self.root_variations.is_empty()
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        fn count(line: &[Node]) -> usize {
            line.iter()
                .map(|node| 1 + node.variations.iter().map(|v| count(v)).sum::<usize>())
                .sum()
        }
        count(&self.mainline) + self.root_variations.iter().map(|v| count(v)).sum::<usize>()
    }
}
