use std::path::Path;

use derivative::Derivative;
use log::info;
use serde::{Deserialize, Serialize};
use specta::Type;

use crate::chess::ShakmatyOracle;
use crate::error::Result;

/// What [`crate::pgn::write_game`] emits.
#[derive(Deserialize, Serialize, Debug, Clone, Type, Derivative, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
#[derivative(Default)]
pub struct ExportOptions {
    #[derivative(Default(value = "true"))]
    pub headers: bool,
    #[derivative(Default(value = "true"))]
    pub comments: bool,
    #[derivative(Default(value = "true"))]
    pub glyphs: bool,
    #[derivative(Default(value = "true"))]
    pub variations: bool,
    /// Maximum movetext line length; 0 disables wrapping.
    #[derivative(Default(value = "80"))]
    pub line_width: usize,
}

impl ExportOptions {
    /// Mainline moves only, on a single line.
    pub fn bare() -> Self {
        Self {
            headers: false,
            comments: false,
            glyphs: false,
            variations: false,
            line_width: 0,
        }
    }
}

/// Settings for new game sessions.
#[derive(Deserialize, Serialize, Debug, Clone, Type, Derivative, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
#[derivative(Default)]
pub struct GameConfig {
    /// Starting position of new games; the standard position when unset.
    pub start_fen: Option<String>,
    pub chess960: bool,
    /// Notify listeners on pure navigation too, not only on mutations.
    #[derivative(Default(value = "true"))]
    pub notify_on_navigation: bool,
    pub export: ExportOptions,
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn oracle(&self) -> ShakmatyOracle {
        if self.chess960 {
            ShakmatyOracle::chess960()
        } else {
            ShakmatyOracle::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_export_everything() {
        let config = GameConfig::default();
        assert!(config.start_fen.is_none());
        assert!(!config.chess960);
        assert!(config.notify_on_navigation);
        assert_eq!(config.export.line_width, 80);
        assert!(config.export.headers && config.export.comments);
        assert!(config.export.glyphs && config.export.variations);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config =
            GameConfig::from_json(r#"{"chess960": true, "export": {"lineWidth": 40}}"#).unwrap();
        assert!(config.chess960);
        assert!(config.notify_on_navigation);
        assert_eq!(config.export.line_width, 40);
        assert!(config.export.variations);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"startFen": "8/8/8/4k3/8/8/8/4K2R w K - 0 1", "notifyOnNavigation": false}}"#
        )
        .unwrap();
        let config = GameConfig::load(file.path()).unwrap();
        assert_eq!(
            config.start_fen.as_deref(),
            Some("8/8/8/4k3/8/8/8/4K2R w K - 0 1")
        );
        assert!(!config.notify_on_navigation);
    }

    #[test]
    fn load_reports_io_and_json_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            GameConfig::load(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
        assert!(matches!(
            GameConfig::from_json("{not json"),
            Err(Error::Json(_))
        ));
    }
}
