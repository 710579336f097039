//! Cell coercion for hand-maintained CSV sheets.

use crate::search::normalize;

const TRUE_TOKENS: &[&str] = &["1", "true", "da", "yes", "y", "t", "x", "✓"];
const SITE_TRUE_TOKENS: &[&str] = &["true", "t", "1", "da", "yes", "y"];
const SITE_FALSE_TOKENS: &[&str] = &["false", "f", "0", "nu", "no", "n"];

/// Trimmed text, `None` when blank or absent.
pub fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Checkbox-style flag: anything outside the accepted tokens is `false`.
pub fn flag(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let token = value.trim().to_lowercase();
    TRUE_TOKENS.contains(&token.as_str())
}

/// Like [`flag`], also accepting `+` as used in the species sheets.
pub fn species_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value.trim() == "+") || flag(value)
}

/// Yes/no cell with an explicit fallback for unrecognized text.
pub fn yes_no(value: Option<&str>, default: bool) -> bool {
    let token = value.unwrap_or_default().trim().to_lowercase();
    if SITE_TRUE_TOKENS.contains(&token.as_str()) {
        return true;
    }
    if SITE_FALSE_TOKENS.contains(&token.as_str()) {
        return false;
    }
    default
}

/// Integer cell; retries with internal spaces removed (`"1 234"`).
pub fn integer(value: Option<&str>) -> Option<i64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse()
        .ok()
        .or_else(|| value.replace(' ', "").parse().ok())
}

/// Decimal cell accepting a comma as decimal separator.
pub fn decimal(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Frequency values that mark a species as rare.
pub fn is_rare_frequency(value: &str) -> bool {
    let folded = normalize(value);
    matches!(folded.as_str(), "rara" | "critica") || species_flag(Some(value))
}

#[cfg(test)]
mod tests {
    use super::{decimal, flag, integer, is_rare_frequency, species_flag, text, yes_no};

    #[test]
    fn text_trims_and_drops_blank() {
        assert_eq!(text(Some("  Codrii ")), Some("Codrii".to_string()));
        assert_eq!(text(Some("   ")), None);
        assert_eq!(text(None), None);
    }

    #[test]
    fn flags_accept_romanian_and_check_marks() {
        for token in ["1", "TRUE", " da ", "Yes", "y", "t", "X", "✓"] {
            assert!(flag(Some(token)), "{token}");
        }
        assert!(!flag(Some("nu")));
        assert!(!flag(Some("+")));
        assert!(species_flag(Some(" + ")));
        assert!(!flag(None));
    }

    #[test]
    fn yes_no_falls_back_to_default() {
        assert!(yes_no(Some("Da"), false));
        assert!(!yes_no(Some("NU"), true));
        assert!(yes_no(Some("?"), true));
        assert!(!yes_no(None, false));
    }

    #[test]
    fn numbers_tolerate_spaces_and_commas() {
        assert_eq!(integer(Some(" 1 234 ")), Some(1234));
        assert_eq!(integer(Some("abc")), None);
        assert_eq!(integer(Some("")), None);
        assert_eq!(decimal(Some("12,5")), Some(12.5));
        assert_eq!(decimal(Some("n/a")), None);
    }

    #[test]
    fn rare_frequency_is_accent_insensitive() {
        assert!(is_rare_frequency("rară"));
        assert!(is_rare_frequency("Critică"));
        assert!(is_rare_frequency("da"));
        assert!(!is_rare_frequency("comună"));
    }
}
