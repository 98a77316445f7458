//! Scanner and document configuration.

use serde::{Deserialize, Serialize};

use crate::error::MathError;
use crate::types::DelimiterKind;

/// Invisible characters that paste operations leave behind.
///
/// U+FFFC (object replacement) and U+200B (zero-width space) both break
/// renderers when left inside latex.
pub const DEFAULT_STRIP_CHARS: [char; 2] = ['\u{FFFC}', '\u{200B}'];

/// Default number of undo steps kept by [`crate::MathDocument`].
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MathConfig {
    /// Delimiter kinds recognized by the scanner. Order is irrelevant,
    /// resolution always follows [`DelimiterKind::PRIORITY`].
    pub delimiters: Vec<DelimiterKind>,
    /// Characters removed from matched content before trimming.
    pub strip_chars: Vec<char>,
    /// Maximum undo steps kept per document.
    pub history_depth: usize,
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            delimiters: DelimiterKind::PRIORITY.to_vec(),
            strip_chars: DEFAULT_STRIP_CHARS.to_vec(),
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl MathConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, MathError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, MathError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Only recognize the canonical `$` / `$$` forms.
    pub fn canonical_only() -> Self {
        Self {
            delimiters: DelimiterKind::PRIORITY
                .into_iter()
                .filter(|kind| kind.is_canonical())
                .collect(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, kind: DelimiterKind) -> bool {
        self.delimiters.contains(&kind)
    }

    /// Remove configured invisible characters.
    pub fn strip_invisible(&self, text: &str) -> String {
        text.chars()
            .filter(|c| !self.strip_chars.contains(c))
            .collect()
    }
}
