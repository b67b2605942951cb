//! Per-node comments and annotation glyphs.

use std::fmt;

use log::debug;
use pgn_reader::Nag;
use serde::{Deserialize, Serialize};
use specta::Type;

use crate::error::{Error, Result};
use crate::tree::types::{Cursor, GameTree, Node};

/// Standard annotation glyphs.
///
/// Move and position assessments have named variants; any other numeric
/// annotation glyph (`$n`, 1..=255) is kept as `Numeric`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum GlyphKind {
    Good,
    Mistake,
    Brilliant,
    Blunder,
    Interesting,
    Dubious,
    Forced,
    Equal,
    Unclear,
    WhiteSlightlyBetter,
    BlackSlightlyBetter,
    WhiteBetter,
    BlackBetter,
    WhiteWinning,
    BlackWinning,
    Novelty,
    Numeric(u8),
}

impl GlyphKind {
    const NAMED: [GlyphKind; 16] = [
        GlyphKind::Good,
        GlyphKind::Mistake,
        GlyphKind::Brilliant,
        GlyphKind::Blunder,
        GlyphKind::Interesting,
        GlyphKind::Dubious,
        GlyphKind::Forced,
        GlyphKind::Equal,
        GlyphKind::Unclear,
        GlyphKind::WhiteSlightlyBetter,
        GlyphKind::BlackSlightlyBetter,
        GlyphKind::WhiteBetter,
        GlyphKind::BlackBetter,
        GlyphKind::WhiteWinning,
        GlyphKind::BlackWinning,
        GlyphKind::Novelty,
    ];

    /// Numeric annotation glyph code.
    pub fn nag(self) -> u8 {
        match self {
            GlyphKind::Good => 1,
            GlyphKind::Mistake => 2,
            GlyphKind::Brilliant => 3,
            GlyphKind::Blunder => 4,
            GlyphKind::Interesting => 5,
            GlyphKind::Dubious => 6,
            GlyphKind::Forced => 7,
            GlyphKind::Equal => 10,
            GlyphKind::Unclear => 13,
            GlyphKind::WhiteSlightlyBetter => 14,
            GlyphKind::BlackSlightlyBetter => 15,
            GlyphKind::WhiteBetter => 16,
            GlyphKind::BlackBetter => 17,
            GlyphKind::WhiteWinning => 18,
            GlyphKind::BlackWinning => 19,
            GlyphKind::Novelty => 146,
            GlyphKind::Numeric(code) => code,
        }
    }

    /// Maps a NAG code to its glyph. Code 0 is the null annotation and is
    /// rejected.
    pub fn from_nag(code: u8) -> Option<Self> {
        if code == 0 {
            return None;
        }
        Some(
            Self::NAMED
                .into_iter()
                .find(|glyph| glyph.nag() == code)
                .unwrap_or(GlyphKind::Numeric(code)),
        )
    }

    /// Parses a glyph as written in movetext: a symbol such as `!?` or `+-`,
    /// or a numeric `$n` code.
    pub fn from_symbol(text: &str) -> Option<Self> {
        let position = match text {
            "=" => Some(GlyphKind::Equal),
            "+=" => Some(GlyphKind::WhiteSlightlyBetter),
            "=+" => Some(GlyphKind::BlackSlightlyBetter),
            "+/-" => Some(GlyphKind::WhiteBetter),
            "-/+" => Some(GlyphKind::BlackBetter),
            "+-" => Some(GlyphKind::WhiteWinning),
            "-+" => Some(GlyphKind::BlackWinning),
            _ => None,
        };
        if position.is_some() {
            return position;
        }
        let nag = Nag::from_ascii(text.as_bytes()).ok()?;
        Self::from_nag(nag.0)
    }

    /// Symbol written directly after a move, for the move-quality glyphs.
    pub fn move_symbol(self) -> Option<&'static str> {
        match self {
            GlyphKind::Good => Some("!"),
            GlyphKind::Mistake => Some("?"),
            GlyphKind::Brilliant => Some("!!"),
            GlyphKind::Blunder => Some("??"),
            GlyphKind::Interesting => Some("!?"),
            GlyphKind::Dubious => Some("?!"),
            _ => None,
        }
    }
}

impl fmt::Display for GlyphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.move_symbol() {
            Some(symbol) => f.write_str(symbol),
            None => write!(f, "${}", self.nag()),
        }
    }
}

/// Comment or glyph attached to a move.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Annotation {
    Comment(String),
    Glyph(GlyphKind),
}

impl Annotation {
    fn validate(&self) -> Result<()> {
        match self {
            Annotation::Comment(text) if text.contains('}') => Err(Error::InvalidAnnotation(
                format!("comment may not contain '}}': {text}"),
            )),
            Annotation::Glyph(GlyphKind::Numeric(0)) => {
                Err(Error::InvalidAnnotation("null glyph $0".to_string()))
            }
            Annotation::Glyph(GlyphKind::Numeric(code)) => match GlyphKind::from_nag(*code) {
                Some(named) if named != GlyphKind::Numeric(*code) => Err(
                    Error::InvalidAnnotation(format!("${code} must be given as {named:?}")),
                ),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

/// An annotation together with its key. Keys are unique within a tree and
/// never reused, so they do not take part in equality.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StoredAnnotation {
    #[serde(skip)]
    pub(crate) key: u32,
    #[serde(flatten)]
    pub(crate) annotation: Annotation,
}

impl PartialEq for StoredAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.annotation == other.annotation
    }
}

impl Eq for StoredAnnotation {}

/// Handle returned by [`GameTree::add_annotation`].
///
/// Carries the cursor of the annotated move, so removal walks the address
/// instead of scanning the tree. If the move has since moved to another
/// address the key no longer matches and removal reports `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationId {
    pub cursor: Cursor,
    pub key: u32,
}

impl Node {
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().map(|stored| &stored.annotation)
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.annotations().filter_map(|annotation| match annotation {
            Annotation::Comment(text) => Some(text.as_str()),
            Annotation::Glyph(_) => None,
        })
    }

    pub fn glyphs(&self) -> impl Iterator<Item = GlyphKind> + '_ {
        self.annotations().filter_map(|annotation| match annotation {
            Annotation::Glyph(glyph) => Some(*glyph),
            Annotation::Comment(_) => None,
        })
    }

    pub(crate) fn push_annotation(&mut self, key: u32, annotation: Annotation) {
        self.annotations.push(StoredAnnotation { key, annotation });
    }

    fn remove_annotation(&mut self, key: u32) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|stored| stored.key != key);
        self.annotations.len() != before
    }
}

impl GameTree {
    /// Annotates the move leading to `cursor`.
    pub fn add_annotation(&mut self, cursor: &Cursor, annotation: Annotation) -> Result<AnnotationId> {
        annotation.validate()?;
        let key = self.next_annotation_key;
        self.node_at_mut(cursor)?.push_annotation(key, annotation);
        self.next_annotation_key += 1;
        debug!("Annotated move at {}", cursor);
        Ok(AnnotationId {
            cursor: cursor.clone(),
            key,
        })
    }

    /// Removes an annotation; `false` when it no longer exists.
    pub fn remove_annotation(&mut self, id: &AnnotationId) -> bool {
        match self.node_at_mut(&id.cursor) {
            Ok(node) => node.remove_annotation(id.key),
            Err(_) => false,
        }
    }

    /// Annotations of the move leading to `cursor`.
    pub fn annotations_at(&self, cursor: &Cursor) -> Result<Vec<&Annotation>> {
        Ok(self.node_at(cursor)?.annotations().collect())
    }

    pub(crate) fn issue_annotation_key(&mut self) -> u32 {
        let key = self.next_annotation_key;
        self.next_annotation_key += 1;
        key
    }

    /// Adds a comment before the first move of the game.
    pub fn add_intro_comment(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        Annotation::Comment(text.clone()).validate()?;
        self.intro.push(text);
        Ok(())
    }

    fn node_at_mut(&mut self, cursor: &Cursor) -> Result<&mut Node> {
        if cursor.ply == 0 {
            return Err(Error::invalid_address(cursor));
        }
        let line = self.line_mut(&cursor.address)?;
        line.get_mut(cursor.ply - 1)
            .ok_or_else(|| Error::invalid_address(cursor))
    }

    fn node_at(&self, cursor: &Cursor) -> Result<&Node> {
        if cursor.ply == 0 {
            return Err(Error::invalid_address(cursor));
        }
        self.line(&cursor.address)?
            .get(cursor.ply - 1)
            .ok_or_else(|| Error::invalid_address(cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{MoveInput, MoveOracle, ShakmatyOracle};
    use crate::tree::types::Address;

    fn two_move_tree() -> GameTree {
        let oracle = ShakmatyOracle::default();
        let mut tree = GameTree::new();
        let mut cursor = Cursor::root();
        for san in ["e4", "e5"] {
            let fen = tree.position_at(&cursor).unwrap();
            let record = oracle.try_move(&fen, &MoveInput::san(san)).unwrap();
            cursor = tree.append(&cursor, record).unwrap();
        }
        tree
    }

    #[test]
    fn glyph_symbols_map_to_closed_set() {
        assert_eq!(GlyphKind::from_symbol("!"), Some(GlyphKind::Good));
        assert_eq!(GlyphKind::from_symbol("??"), Some(GlyphKind::Blunder));
        assert_eq!(GlyphKind::from_symbol("!?"), Some(GlyphKind::Interesting));
        assert_eq!(GlyphKind::from_symbol("+-"), Some(GlyphKind::WhiteWinning));
        assert_eq!(GlyphKind::from_symbol("$14"), Some(GlyphKind::WhiteSlightlyBetter));
        assert_eq!(GlyphKind::from_symbol("$146"), Some(GlyphKind::Novelty));
        assert_eq!(GlyphKind::from_symbol("$32"), Some(GlyphKind::Numeric(32)));
        assert_eq!(GlyphKind::from_symbol("!!!"), None);
        assert_eq!(GlyphKind::from_symbol("$0"), None);
        assert_eq!(GlyphKind::from_symbol("$300"), None);
    }

    #[test]
    fn glyph_display_prefers_move_symbols() {
        assert_eq!(GlyphKind::Dubious.to_string(), "?!");
        assert_eq!(GlyphKind::WhiteWinning.to_string(), "$18");
        assert_eq!(GlyphKind::Numeric(32).to_string(), "$32");
    }

    #[test]
    fn add_and_remove_annotations() {
        let mut tree = two_move_tree();
        let cursor = Cursor::new(Address::mainline(), 1);
        let comment = tree
            .add_annotation(&cursor, Annotation::Comment("Best by test".into()))
            .unwrap();
        let glyph = tree
            .add_annotation(&cursor, Annotation::Glyph(GlyphKind::Good))
            .unwrap();
        assert_ne!(comment, glyph);

        let node = &tree.mainline()[0];
        assert_eq!(node.comments().collect::<Vec<_>>(), vec!["Best by test"]);
        assert_eq!(node.glyphs().collect::<Vec<_>>(), vec![GlyphKind::Good]);

        assert!(tree.remove_annotation(&comment));
        assert!(!tree.remove_annotation(&comment));
        assert_eq!(tree.annotations_at(&cursor).unwrap().len(), 1);
    }

    #[test]
    fn annotation_requires_a_move() {
        let mut tree = two_move_tree();
        let err = tree
            .add_annotation(&Cursor::root(), Annotation::Glyph(GlyphKind::Good))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }));
        let past_end = Cursor::new(Address::mainline(), 3);
        assert!(tree
            .add_annotation(&past_end, Annotation::Glyph(GlyphKind::Good))
            .is_err());
    }

    #[test]
    fn stale_handle_does_not_touch_shifted_sibling() {
        let oracle = ShakmatyOracle::default();
        let mut tree = two_move_tree();
        let after_e4 = Cursor::new(Address::mainline(), 1);
        let fen = tree.position_at(&after_e4).unwrap();
        for san in ["c5", "e6", "d5"] {
            let record = oracle.try_move(&fen, &MoveInput::san(san)).unwrap();
            tree.append(&after_e4, record).unwrap();
        }

        let french = Cursor::new([(0, 1)].into_iter().collect(), 1);
        let scandinavian = Cursor::new([(0, 2)].into_iter().collect(), 1);
        let french_note = tree
            .add_annotation(&french, Annotation::Comment("French".into()))
            .unwrap();
        let scandinavian_note = tree
            .add_annotation(&scandinavian, Annotation::Comment("Scandinavian".into()))
            .unwrap();
        assert_ne!(french_note.key, scandinavian_note.key);

        tree.delete_variation(&[(0, 1)].into_iter().collect::<Address>())
            .unwrap();
        let shifted = Cursor::new([(0, 1)].into_iter().collect(), 1);
        assert_eq!(tree.resolve(&shifted).unwrap()[1].san, "d5");

        assert!(!tree.remove_annotation(&french_note));
        assert_eq!(
            tree.annotations_at(&shifted).unwrap(),
            vec![&Annotation::Comment("Scandinavian".into())]
        );
    }

    #[test]
    fn numeric_glyphs_with_a_name_are_rejected() {
        let mut tree = two_move_tree();
        let cursor = Cursor::new(Address::mainline(), 1);
        for code in [1, 10, 146] {
            let err = tree
                .add_annotation(&cursor, Annotation::Glyph(GlyphKind::Numeric(code)))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidAnnotation(_)));
        }
        assert!(tree
            .add_annotation(&cursor, Annotation::Glyph(GlyphKind::Numeric(32)))
            .is_ok());
        assert_eq!(
            tree.mainline()[0].glyphs().collect::<Vec<_>>(),
            vec![GlyphKind::Numeric(32)]
        );
    }

    #[test]
    fn comments_with_closing_brace_are_rejected() {
        let mut tree = two_move_tree();
        let cursor = Cursor::new(Address::mainline(), 2);
        let err = tree
            .add_annotation(&cursor, Annotation::Comment("oops } here".into()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAnnotation(_)));
        assert_eq!(tree.annotations_at(&cursor).unwrap().len(), 0);
    }
}
