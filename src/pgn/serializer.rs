//! PGN output, the inverse of [`crate::pgn::parse`].

use crate::config::ExportOptions;
use crate::pgn::headers::{HeaderMap, SEVEN_TAG_ROSTER};
use crate::pgn::lexer::GameResult;
use crate::tree::{GameTree, Line, Node};

/// Movetext of `tree`, without headers or result, on a single line.
pub fn serialize(tree: &GameTree) -> String {
    let options = ExportOptions {
        line_width: 0,
        ..ExportOptions::default()
    };
    movetext(tree, &options).join(" ")
}

/// A complete PGN game: header section, blank line, wrapped movetext and the
/// result token.
pub fn write_game(tree: &GameTree, headers: &HeaderMap, options: &ExportOptions) -> String {
    let result = headers
        .get("Result")
        .and_then(GameResult::from_token)
        .unwrap_or(GameResult::Ongoing);

    let mut out = String::new();
    if options.headers {
        for (key, value) in header_section(tree, headers, result) {
            out.push_str(&format!("[{key} \"{}\"]\n", escape(&value)));
        }
        out.push('\n');
    }

    let mut tokens = movetext(tree, options);
    tokens.push(result.to_string());
    out.push_str(&wrap(&tokens, options.line_width));
    out.push('\n');
    out
}

fn header_section(tree: &GameTree, headers: &HeaderMap, result: GameResult) -> Vec<(String, String)> {
    let mut section: Vec<(String, String)> = SEVEN_TAG_ROSTER
        .iter()
        .map(|&key| {
            let value = match key {
                "Result" => result.to_string(),
                "Date" => headers.get(key).unwrap_or("????.??.??").to_string(),
                _ => headers.get(key).unwrap_or("?").to_string(),
            };
            (key.to_string(), value)
        })
        .collect();

    section.extend(
        headers
            .iter()
            .filter(|(key, _)| !SEVEN_TAG_ROSTER.contains(key) && !matches!(*key, "SetUp" | "FEN"))
            .map(|(key, value)| (key.to_string(), value.to_string())),
    );
    if tree.has_custom_start() {
        section.push(("SetUp".to_string(), "1".to_string()));
        section.push(("FEN".to_string(), tree.start_fen().to_string()));
    }
    section
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Greedy line filling; `width == 0` keeps everything on one line.
fn wrap(tokens: &[String], width: usize) -> String {
    let mut out = String::new();
    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 {
            if width > 0 && line_len + 1 + token.len() > width {
                out.push('\n');
                line_len = 0;
            } else {
                out.push(' ');
                line_len += 1;
            }
        }
        out.push_str(token);
        line_len += token.len();
    }
    out
}

fn movetext(tree: &GameTree, options: &ExportOptions) -> Vec<String> {
    let mut writer = Writer {
        options,
        tokens: Vec::new(),
    };
    if options.comments {
        for text in tree.intro_comments() {
            writer.tokens.push(format!("{{{text}}}"));
        }
    }
    writer.line(tree.mainline(), tree.root_variations());
    writer.tokens
}

struct Writer<'a> {
    options: &'a ExportOptions,
    tokens: Vec<String>,
}

impl Writer<'_> {
    /// Writes `line`; `leading` holds the alternatives to its first move.
    fn line(&mut self, line: &[Node], leading: &[Line]) {
        for (index, node) in line.iter().enumerate() {
            self.node(node, index == 0);

            let alternatives = match index {
                0 => leading,
                _ => line[index - 1].variations(),
            };
            if self.options.variations {
                for variation in alternatives {
                    self.variation(variation);
                }
            }
        }
    }

    fn variation(&mut self, variation: &[Node]) {
        let first = self.tokens.len();
        self.line(variation, &[]);
        if let Some(token) = self.tokens.get_mut(first) {
            token.insert(0, '(');
        }
        if let Some(token) = self.tokens.last_mut() {
            token.push(')');
        }
    }

    /// Move number (white moves and line starts), SAN with glyphs, comments.
    fn node(&mut self, node: &Node, starts_line: bool) {
        if node.is_white() {
            self.tokens.push(format!("{}.", node.move_number()));
        } else if starts_line {
            self.tokens.push(format!("{}...", node.move_number()));
        }

        let mut san = node.san().to_string();
        let mut numeric = Vec::new();
        if self.options.glyphs {
            let mut inline = false;
            for glyph in node.glyphs() {
                match glyph.move_symbol() {
                    Some(symbol) if !inline => {
                        san.push_str(symbol);
                        inline = true;
                    }
                    _ => numeric.push(format!("${}", glyph.nag())),
                }
            }
        }
        self.tokens.push(san);
        self.tokens.extend(numeric);

        if self.options.comments {
            for text in node.comments() {
                self.tokens.push(format!("{{{text}}}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::ShakmatyOracle;
    use crate::pgn::parse;
    use crate::tree::{Annotation, Cursor, GlyphKind};

    const NESTED: &str = "1. e4 e5 (1... c5 2. Nf3 (2. Nc3) d6) 2. Nf3";

    fn parse_ok(text: &str) -> (GameTree, HeaderMap) {
        parse(text, &ShakmatyOracle::default()).unwrap()
    }

    #[test]
    fn reproduces_nested_variations() {
        let (tree, _) = parse_ok(NESTED);
        assert_eq!(serialize(&tree), NESTED);
    }

    #[test]
    fn numbers_white_moves_and_line_starts_only() {
        let (tree, _) = parse_ok("1. e4 (1. d4) 1... e5 {Open} 2. Nf3 Nc6 {Solid} 3. Bb5");
        assert_eq!(
            serialize(&tree),
            "1. e4 (1. d4) e5 {Open} 2. Nf3 Nc6 {Solid} 3. Bb5"
        );

        let (tree, _) = parse_ok("1. e4 e5 (1... e6 2. d4)");
        assert_eq!(serialize(&tree), "1. e4 e5 (1... e6 2. d4)");
    }

    #[test]
    fn writes_glyphs_inline_and_numeric() {
        let mut tree = parse_ok("1. e4 e5").0;
        let after_e4 = Cursor::new(Default::default(), 1);
        tree.add_annotation(&after_e4, Annotation::Glyph(GlyphKind::Interesting))
            .unwrap();
        tree.add_annotation(&after_e4, Annotation::Glyph(GlyphKind::WhiteSlightlyBetter))
            .unwrap();
        tree.add_annotation(&after_e4, Annotation::Glyph(GlyphKind::Good))
            .unwrap();
        tree.add_annotation(&after_e4, Annotation::Comment("Best by test".into()))
            .unwrap();
        assert_eq!(serialize(&tree), "1. e4!? $14 $1 {Best by test} e5");
    }

    #[test]
    fn write_game_emits_roster_and_custom_start() {
        let (tree, headers) = parse_ok(
            "[White \"Anna\"]\n[Opening \"Ruy Lopez\"]\n[FEN \"r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3\"]\n\n3. Bb5 {The \"Spanish\"} 1/2-1/2",
        );
        let pgn = write_game(&tree, &headers, &ExportOptions::default());
        assert_eq!(
            pgn,
            "[Event \"?\"]\n[Site \"?\"]\n[Date \"????.??.??\"]\n[Round \"?\"]\n\
             [White \"Anna\"]\n[Black \"?\"]\n[Result \"1/2-1/2\"]\n[Opening \"Ruy Lopez\"]\n\
             [SetUp \"1\"]\n[FEN \"r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3\"]\n\
             \n3. Bb5 {The \"Spanish\"} 1/2-1/2\n"
        );
    }

    #[test]
    fn write_game_honours_options() {
        let (tree, headers) = parse_ok("1. e4! {Best} e5 (1... c5) 2. Nf3 *");
        let pgn = write_game(&tree, &headers, &ExportOptions::bare());
        assert_eq!(pgn, "1. e4 e5 2. Nf3 *\n");

        let options = ExportOptions {
            headers: false,
            line_width: 12,
            ..ExportOptions::default()
        };
        let pgn = write_game(&tree, &headers, &options);
        assert_eq!(pgn, "1. e4!\n{Best} e5\n(1... c5) 2.\nNf3 *\n");
    }

    #[test]
    fn escapes_header_values() {
        let headers: HeaderMap = [("Event", "The \"Big\" One\\")].into_iter().collect();
        let pgn = write_game(&GameTree::new(), &headers, &ExportOptions::default());
        assert!(pgn.starts_with("[Event \"The \\\"Big\\\" One\\\\\"]\n"));
        assert!(pgn.ends_with("\n\n*\n"));
    }
}
