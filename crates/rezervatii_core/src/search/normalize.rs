//! Accent-insensitive text normalization.
//!
//! # Invariants
//! - Output is lowercase, free of combining marks, whitespace-collapsed.
//! - Normalization is idempotent: `normalize(normalize(x)) == normalize(x)`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strategy used by the ranking layer to fold text before comparison.
pub trait Normalizer {
    fn normalize(&self, text: &str) -> String;
}

/// Lowercase + canonical decomposition with combining marks removed.
///
/// `"Pădurea Seacă"` and `"padurea seaca"` fold to the same key; so do the
/// comma-below and cedilla variants of `ș`/`ț`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccentFolding;

impl Normalizer for AccentFolding {
    fn normalize(&self, text: &str) -> String {
        normalize(text)
    }
}

/// Folds `text` with [`AccentFolding`] rules.
pub fn normalize(text: &str) -> String {
    let folded = text
        .nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn folds_romanian_diacritics() {
        assert_eq!(normalize("Rosă"), normalize("Rosa"));
        assert_eq!(normalize("Stâncăria"), "stancaria");
        assert_eq!(normalize("Pădurea Seacă"), "padurea seaca");
        assert_eq!(normalize("Țărână și Ştiucă"), "tarana si stiuca");
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(normalize("ROSA"), normalize("rosa"));
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  Rosa \t  canina \n"), "rosa canina");
    }

    #[test]
    fn is_idempotent() {
        for sample in ["Rosă", "İstanbul", "Quercus  robur", "", "ÎNCĂ o dată", "Ǆemal"] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "sample `{sample}`");
        }
    }
}
