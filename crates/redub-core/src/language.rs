//! Language tag resolution.
//!
//! Callers supply voice-style BCP-47 tags (`es-ES`); the translation
//! service wants short codes (`es`). The table is static and loaded once.
//! Unknown tags are an input fault rather than being passed through,
//! since the translation service would otherwise fail opaquely mid-job.

use crate::error::DubError;

/// Voice-style tag to translation-service code. Chinese keeps its region
/// suffix because the translation service distinguishes scripts.
const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("hi-IN", "hi"),
    ("en-US", "en"),
    ("en-GB", "en"),
    ("es-ES", "es"),
    ("fr-FR", "fr"),
    ("de-DE", "de"),
    ("it-IT", "it"),
    ("pt-BR", "pt"),
    ("ru-RU", "ru"),
    ("ja-JP", "ja"),
    ("ko-KR", "ko"),
    ("zh-CN", "zh-CN"),
    ("zh-TW", "zh-TW"),
    ("ar-SA", "ar"),
    ("nl-NL", "nl"),
    ("pl-PL", "pl"),
    ("tr-TR", "tr"),
    ("sv-SE", "sv"),
    ("da-DK", "da"),
    ("fi-FI", "fi"),
    ("no-NO", "no"),
    ("el-GR", "el"),
    ("he-IL", "iw"),
    ("id-ID", "id"),
    ("ms-MY", "ms"),
    ("th-TH", "th"),
    ("vi-VN", "vi"),
    ("cs-CZ", "cs"),
    ("hu-HU", "hu"),
    ("ro-RO", "ro"),
    ("sk-SK", "sk"),
    ("uk-UA", "uk"),
    ("bg-BG", "bg"),
    ("hr-HR", "hr"),
    ("sl-SI", "sl"),
    ("et-EE", "et"),
    ("lv-LV", "lv"),
    ("lt-LT", "lt"),
    ("fa-IR", "fa"),
    ("bn-IN", "bn"),
    ("ta-IN", "ta"),
    ("te-IN", "te"),
    ("kn-IN", "kn"),
    ("ml-IN", "ml"),
    ("gu-IN", "gu"),
    ("mr-IN", "mr"),
    ("pa-IN", "pa"),
    ("fil-PH", "tl"),
    // Bare codes accepted as-is.
    ("hi", "hi"),
    ("en", "en"),
    ("es", "es"),
    ("fr", "fr"),
    ("de", "de"),
    ("it", "it"),
    ("pt", "pt"),
    ("ru", "ru"),
    ("ja", "ja"),
    ("ko", "ko"),
    ("zh", "zh-CN"),
];

fn lookup(tag: &str) -> Option<&'static str> {
    LANGUAGE_MAP
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(tag))
        .map(|(_, v)| *v)
}

/// Resolve a language tag to the translation-service code. Exact match
/// first (case-insensitive), then the base code with the region stripped.
pub fn translation_code(tag: &str) -> Result<&'static str, DubError> {
    let tag = tag.trim();
    if let Some(code) = lookup(tag) {
        return Ok(code);
    }
    if let Some(base) = tag.split('-').next() {
        if base != tag {
            if let Some(code) = lookup(base) {
                return Ok(code);
            }
        }
    }
    Err(DubError::UnsupportedLanguage(tag.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert_eq!(translation_code("hi-IN").unwrap(), "hi");
        assert_eq!(translation_code("es-ES").unwrap(), "es");
        assert_eq!(translation_code("zh-TW").unwrap(), "zh-TW");
        assert_eq!(translation_code("fil-PH").unwrap(), "tl");
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(translation_code("ES-es").unwrap(), "es");
        assert_eq!(translation_code("HI").unwrap(), "hi");
    }

    #[test]
    fn prefix_fallback_for_unknown_region() {
        // es-MX is not in the table; the base code is.
        assert_eq!(translation_code("es-MX").unwrap(), "es");
        assert_eq!(translation_code("en-AU").unwrap(), "en");
    }

    #[test]
    fn hebrew_uses_legacy_code() {
        assert_eq!(translation_code("he-IL").unwrap(), "iw");
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            translation_code("xx-XX"),
            Err(DubError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            translation_code(""),
            Err(DubError::UnsupportedLanguage(_))
        ));
    }
}
