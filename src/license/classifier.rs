/// Known license phrases, checked in order; the first match wins.
///
/// The spellings are kept exactly as earlier reports matched them
/// ("apache licence", "gpl licence").
const PATTERNS: &[(&str, &str)] = &[
    ("mit license", "MIT License"),
    ("unlicense", "The Unlicense"),
    ("new bsd license", "New BSD License"),
    ("gpl licence", "GPL"),
];

const APACHE: &str = "apache licence";
const APACHE_2: &str = "version 2.0";

/// Classify a license document into a coarse license name.
///
/// Case-insensitive substring matching; returns `None` for missing text or
/// when no known phrase is present. This is a best-effort guess, not a legal
/// classification.
pub fn classify(text: Option<&str>) -> Option<String> {
    let lower = text?.to_lowercase();

    if lower.contains(APACHE) {
        if lower.contains(APACHE_2) {
            return Some("Apache License 2.0".to_string());
        }
        return Some("Apache".to_string());
    }

    PATTERNS
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, name)| name.to_string())
}
