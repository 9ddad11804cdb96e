use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::error::{OtfError, Result};
use crate::pdf::BasicSetPdf;

/// User-facing options. Missing keys take defaults; unknown keys are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Render positive and negative modifiers with distinct classes.
    pub color_modifiers: bool,
    pub basic_set_pdf: BasicSetPdf,
    /// Description given to a bare `[+2]`.
    pub default_modifier_desc: String,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color_modifiers: true,
            basic_set_pdf: BasicSetPdf::Combined,
            default_modifier_desc: String::new(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| OtfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// A roller seeded from `seed`, or from entropy when unset.
    pub fn dice(&self) -> Dice {
        self.seed.map_or_else(Dice::from_entropy, Dice::from_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_keys_with_defaults() {
        let s = Settings::from_yaml_str("basic_set_pdf: Separate\nseed: 7\n").unwrap();
        assert!(s.color_modifiers);
        assert_eq!(s.basic_set_pdf, BasicSetPdf::Separate);
        assert_eq!(s.seed, Some(7));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_json_str(r#"{"colour_modifiers": false}"#),
            Err(OtfError::Json(_))
        ));
    }
}
