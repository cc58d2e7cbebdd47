use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Text around the cursor as reported by the host field: everything left of
/// the cursor (or selection), the selected text, and everything right of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SurroundingText {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub center: String,
    #[serde(default)]
    pub right: String,
}

impl SurroundingText {
    pub fn new(left: impl Into<String>, center: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            center: center.into(),
            right: right.into(),
        }
    }

    pub fn whole(&self) -> String {
        format!("{}{}{}", self.left, self.center, self.right)
    }

    /// Text with the selection removed.
    pub fn outer(&self) -> String {
        format!("{}{}", self.left, self.right)
    }

    pub fn has_selection(&self) -> bool {
        !self.center.is_empty()
    }
}

/// Number of user-perceived characters (extended grapheme clusters).
pub fn grapheme_count(s: &str) -> usize {
    s.graphemes(true).count()
}
