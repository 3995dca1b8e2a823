//! Target languages offered to users and helpers for handling language codes.

use regex::Regex;
use std::sync::LazyLock;

/// Languages the CLI and wizard let users pick, with display names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("hi", "Hindi"),
    ("te", "Telugu"),
    ("ta", "Tamil"),
    ("kn", "Kannada"),
    ("mr", "Marathi"),
    ("ur", "Urdu"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("gu", "Gujarati"),
];

/// Display name for a code in the recognized set.
pub fn display_name(code: &str) -> Option<&'static str> {
    let lowercase = code.to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == lowercase)
        .map(|(_, name)| *name)
}

/// Display name when known, the code itself otherwise.
pub fn label(code: &str) -> String {
    display_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

pub fn is_supported(code: &str) -> bool {
    display_name(code).is_some()
}

/// Locale passed to the speech synthesizer. Codes that already carry a
/// region, or that are outside the recognized set, pass through unchanged.
pub fn tts_locale(code: &str) -> String {
    if code.contains('-') || !is_supported(code) {
        return code.to_string();
    }
    format!("{}-IN", code.to_lowercase())
}

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("Invalid regex"));

/// Loose BCP-47 shape check: `hi`, `pa-IN`, `zh-Hant`.
pub fn is_valid_code(code: &str) -> bool {
    CODE_RE.is_match(code)
}

/// Split a comma separated list, normalizing case and dropping duplicates
/// while keeping the first occurrence order.
pub fn parse_language_list(input: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for code in input.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let code = code.to_lowercase();
        if !languages.contains(&code) {
            languages.push(code);
        }
    }
    languages
}

/// Drop duplicate codes, keeping request order.
pub fn dedupe(languages: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(languages.len());
    for code in languages {
        if !unique.iter().any(|c| c.eq_ignore_ascii_case(code)) {
            unique.push(code.clone());
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(display_name("hi"), Some("Hindi"));
        assert_eq!(display_name("GU"), Some("Gujarati"));
        assert_eq!(display_name("fr"), None);
        assert_eq!(label("ur"), "Urdu");
        assert_eq!(label("fr"), "fr");
    }

    #[test]
    fn test_recognized_set() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 9);
        for code in ["hi", "te", "ta", "kn", "mr", "ur", "ml", "pa", "gu"] {
            assert!(is_supported(code), "{code} should be supported");
        }
        assert!(!is_supported("en"));
    }

    #[test]
    fn test_tts_locale() {
        assert_eq!(tts_locale("hi"), "hi-IN");
        assert_eq!(tts_locale("pa"), "pa-IN");
        assert_eq!(tts_locale("en-GB"), "en-GB");
        assert_eq!(tts_locale("fr"), "fr");
    }

    #[test]
    fn test_code_validation() {
        assert!(is_valid_code("hi"));
        assert!(is_valid_code("pa-IN"));
        assert!(is_valid_code("zh-Hant"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("h"));
        assert!(!is_valid_code("hi_IN"));
        assert!(!is_valid_code("../etc"));
    }

    #[test]
    fn test_code_validation_shared_across_threads() {
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for code in ["hi", "te", "pa-IN", "kn"] {
                        assert!(is_valid_code(code));
                    }
                    assert!(!is_valid_code("hi_IN"));
                });
            }
        });
        assert!(std::ptr::eq(&*CODE_RE, &*CODE_RE));
    }

    #[test]
    fn test_parse_language_list() {
        assert_eq!(parse_language_list("hi, te,HI,,ta "), vec!["hi", "te", "ta"]);
        assert!(parse_language_list(" , ").is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let input: Vec<String> = ["te", "hi", "te", "HI"].iter().map(|s| s.to_string()).collect();
        assert_eq!(dedupe(&input), vec!["te", "hi"]);
    }
}
