use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Normalized identifier of a garden, derived from its display name.
///
/// Diacritics are stripped and every run of whitespace becomes a single
/// underscore: `"Jardin des Deux Rives"` → `"Jardin_des_Deux_Rives"`,
/// `"Jardin Sainte-Hélène"` → `"Jardin_Sainte-Helene"`. Leading and
/// trailing whitespace is dropped. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GardenKey(String);

impl GardenKey {
    pub fn from_name(name: &str) -> Self {
        let stripped = strip_diacritics(name);
        GardenKey(stripped.split_whitespace().collect::<Vec<_>>().join("_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the harvest sheet holding this garden's data.
    pub fn sheet_file_name(&self) -> String {
        format!("stats_{}.csv", self.0)
    }
}

impl fmt::Display for GardenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decompose to NFD and drop combining marks (`é` → `e`, `ç` → `c`).
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}
