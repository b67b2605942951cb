//! PGN text in and out of the game tree.

pub mod collection;
pub mod headers;
pub mod lexer;
pub mod parser;
pub mod serializer;

pub use {
    collection::{parse_games, scan_headers, split_games},
    headers::{HeaderMap, SEVEN_TAG_ROSTER},
    lexer::{lex_pgn, GameResult, Token, TokenKind},
    parser::parse,
    serializer::{serialize, write_game},
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{MoveInput, MoveOracle, ShakmatyOracle};
    use crate::config::ExportOptions;
    use crate::tree::{Address, Annotation, BranchPoint, Cursor, GameTree, GlyphKind, Line, Node};

    fn parse_ok(text: &str) -> (GameTree, HeaderMap) {
        parse(text, &ShakmatyOracle::default()).unwrap()
    }

    /// Every cursor of the tree, depth first.
    fn all_cursors(tree: &GameTree) -> Vec<Cursor> {
        fn walk(line: &Line, address: Address, out: &mut Vec<Cursor>) {
            for ply in 0..=line.len() {
                out.push(Cursor::new(address.clone(), ply));
            }
            for (index, node) in line.iter().enumerate() {
                for (variation, sub) in node.variations().iter().enumerate() {
                    walk(sub, address.child(BranchPoint::new(index as isize, variation)), out);
                }
            }
        }

        let mut out = Vec::new();
        walk(&tree.mainline, Address::mainline(), &mut out);
        for (variation, sub) in tree.root_variations.iter().enumerate() {
            walk(sub, Address::mainline().child(BranchPoint::root(variation)), &mut out);
        }
        out
    }

    fn play(tree: &mut GameTree, from: Cursor, moves: &[&str]) -> Cursor {
        let oracle = ShakmatyOracle::default();
        moves.iter().fold(from, |cursor, san| {
            let fen = tree.position_at(&cursor).unwrap();
            let record = oracle.try_move(&fen, &MoveInput::san(*san)).unwrap();
            tree.append(&cursor, record).unwrap()
        })
    }

    fn node_at<'a>(tree: &'a GameTree, cursor: &Cursor) -> &'a Node {
        &tree.line(&cursor.address).unwrap()[cursor.ply - 1]
    }

    /// Same moves at every cursor and the same comments and glyphs on every
    /// move. Order between a comment and a glyph is not compared.
    fn assert_same_game(tree: &GameTree, reparsed: &GameTree) {
        let cursors = all_cursors(tree);
        assert_eq!(cursors.len(), all_cursors(reparsed).len());
        assert_eq!(tree.intro_comments(), reparsed.intro_comments());
        for cursor in cursors {
            assert_eq!(
                tree.resolve(&cursor).unwrap(),
                reparsed.resolve(&cursor).unwrap(),
                "cursor {cursor}"
            );
            if cursor.ply == 0 {
                continue;
            }
            let (before, after) = (node_at(tree, &cursor), node_at(reparsed, &cursor));
            assert_eq!(
                before.comments().collect::<Vec<_>>(),
                after.comments().collect::<Vec<_>>(),
                "cursor {cursor}"
            );
            assert_eq!(
                before.glyphs().collect::<Vec<_>>(),
                after.glyphs().collect::<Vec<_>>(),
                "cursor {cursor}"
            );
        }
    }

    fn assert_round_trip(text: &str) {
        let (tree, _) = parse_ok(text);
        let (reparsed, _) = parse_ok(&serialize(&tree));
        for cursor in all_cursors(&tree) {
            assert_eq!(
                tree.resolve(&cursor).unwrap(),
                reparsed.resolve(&cursor).unwrap(),
                "cursor {cursor}"
            );
        }
        assert_eq!(reparsed, tree);
    }

    #[test]
    fn round_trips_nested_games() {
        assert_round_trip("1. e4 e5 (1... c5 2. Nf3 (2. Nc3 Nc6 (2... e6) 3. g3) d6) 2. Nf3");
        assert_round_trip("1. d4 (1. e4 e5 (1... c5)) (1. c4) d5 2. c4 (2. Nf3 Nf6 (2... c5)) e6");
    }

    #[test]
    fn round_trips_comments_and_glyphs() {
        assert_round_trip(
            "{Intro} 1. e4! $14 {King pawn} e5?! (1... c5 $146 {Sicilian}) 2. Nf3 $18 {Winning?}",
        );
    }

    #[test]
    fn round_trips_trees_built_by_appending() {
        let mut tree = GameTree::new();
        tree.add_intro_comment("Built move by move").unwrap();
        play(&mut tree, Cursor::root(), &["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        let queen_pawn = play(&mut tree, Cursor::root(), &["d4", "d5"]);
        assert_eq!(queen_pawn.address.to_string(), "-1:0");

        let sicilian = play(
            &mut tree,
            Cursor::new(Address::mainline(), 1),
            &["c5", "Nf3", "d6", "d4"],
        );
        let french = play(&mut tree, Cursor::new(sicilian.address.clone(), 0), &["e6", "d4"]);
        assert_eq!(french.address.to_string(), "0:1");

        let nested: [&[&str]; 4] = [
            &["Nc3", "Nc6", "g3"],
            &["d6", "f4"],
            &["g3", "Nc6"],
            &["g6", "Bg2"],
        ];
        let mut branch = sicilian;
        for moves in nested {
            branch = play(&mut tree, Cursor::new(branch.address.clone(), 1), moves);
        }
        assert_eq!(branch.address.depth(), 5);

        let e4 = Cursor::new(Address::mainline(), 1);
        tree.add_annotation(&e4, Annotation::Comment("Good move".into()))
            .unwrap();
        tree.add_annotation(&e4, Annotation::Glyph(GlyphKind::Good))
            .unwrap();
        tree.add_annotation(&queen_pawn, Annotation::Glyph(GlyphKind::Equal))
            .unwrap();
        tree.add_annotation(
            &Cursor::new(french.address.clone(), 1),
            Annotation::Glyph(GlyphKind::Numeric(32)),
        )
        .unwrap();
        tree.add_annotation(&branch, Annotation::Comment("Deep enough".into()))
            .unwrap();

        let (reparsed, _) = parse_ok(&serialize(&tree));
        assert_same_game(&tree, &reparsed);
        assert_eq!(reparsed.node_count(), tree.node_count());
    }

    #[test]
    fn comment_before_glyph_stays_on_the_move() {
        let (tree, _) = parse_ok("1. e4 {Good move} ! e5");
        let e4 = &tree.mainline()[0];
        assert_eq!(e4.comments().collect::<Vec<_>>(), vec!["Good move"]);
        assert_eq!(e4.glyphs().collect::<Vec<_>>(), vec![GlyphKind::Good]);

        let written = serialize(&tree);
        assert_eq!(written, "1. e4! {Good move} e5");
        let (reparsed, _) = parse_ok(&written);
        assert_same_game(&tree, &reparsed);
    }

    #[test]
    fn round_trips_custom_start_through_write_game() {
        let text = "[FEN \"rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2\"]\n\n\
                    2. Nf3 (2. f4 exf4) Nc6 *";
        let (tree, headers) = parse_ok(text);
        let written = write_game(&tree, &headers, &ExportOptions::default());
        let (reparsed, reheaders) = parse_ok(&written);
        assert_eq!(reparsed, tree);
        assert_eq!(reheaders.get("SetUp"), Some("1"));
        assert_eq!(reparsed.start_ply(), 2);
    }

    #[test]
    fn long_games_wrap_and_still_parse() {
        let text = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 \
                    8. c3 O-O 9. h3 Nb8 10. d4 Nbd7 11. Nbd2 Bb7 12. Bc2 Re8 *";
        let (tree, headers) = parse_ok(text);
        let written = write_game(&tree, &headers, &ExportOptions::default());
        assert!(written.lines().all(|line| line.len() <= 80));
        assert_eq!(parse_ok(&written).0, tree);
    }
}
