use crate::tree::Cursor;

/// Grammar and legality failures while reading PGN text.
///
/// Offsets are byte offsets into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unmatched parenthesis at offset {offset}")]
    UnmatchedParenthesis { offset: usize },

    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },

    #[error("unterminated header starting at offset {offset}")]
    UnterminatedHeader { offset: usize },

    #[error("malformed header at offset {offset}")]
    MalformedHeader { offset: usize },

    #[error("malformed move number '{token}' at offset {offset}")]
    MalformedMoveNumber { token: String, offset: usize },

    #[error("invalid annotation glyph '{token}' at offset {offset}")]
    InvalidGlyph { token: String, offset: usize },

    #[error("unexpected character '{character}' at offset {offset}")]
    UnexpectedCharacter { character: char, offset: usize },

    #[error("unexpected '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },

    #[error("expected a move at offset {offset}")]
    ExpectedMove { offset: usize },

    #[error("variations nested too deeply at offset {offset}")]
    NestingTooDeep { offset: usize },

    #[error("empty variation at offset {offset}")]
    EmptyVariation { offset: usize },

    #[error("illegal move '{token}' at ply {ply}")]
    IllegalMove { token: String, ply: usize },

    #[error("invalid FEN: {fen}")]
    InvalidFen { fen: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid address {cursor}")]
    InvalidAddress { cursor: Cursor },

    #[error("illegal move {input} in position {position}")]
    IllegalMove { input: String, position: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("the mainline cannot be deleted")]
    MainlineNotDeletable,

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("malformed address: {0}")]
    MalformedAddress(String),

    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("games start from different positions")]
    StartPositionMismatch,

    #[error("no game session named {0}")]
    SessionNotFound(String),

    #[error("game session lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_address(cursor: &Cursor) -> Self {
        Error::InvalidAddress {
            cursor: cursor.clone(),
        }
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
