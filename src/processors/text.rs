//! Text normalization used by the completeness check and photo fingerprinting.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Everything that is neither a word character, whitespace, nor one of `-:.,/|°`.
static FINGERPRINT_REJECT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s\-:.,/|°]").expect("Invalid fingerprint filter regex"));

/// Day/month/year stamps such as `7/3/2024` or `17/11/2023`.
static SLASH_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("Invalid slash date regex")
});

/// Removes one leading sub-word marker, if present.
pub fn strip_leading_marker(text: &str, marker: char) -> &str {
    text.strip_prefix(marker).unwrap_or(text)
}

/// Lower-cases `text` and drops everything outside `[a-z0-9]`.
///
/// Split words, stray spaces and punctuation all disappear, so two renderings of
/// the same phrase compare equal. The function is idempotent.
pub fn normalize_alnum(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Turns raw OCR output of a photo's metadata stamp into a fingerprint.
///
/// Steps, in order:
/// 1. collapse whitespace runs to one space and trim,
/// 2. delete characters outside the OCR whitelist,
/// 3. rewrite `D/M/YYYY` dates as `D-M-YYYY`.
pub fn normalize_fingerprint(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let collapsed = WHITESPACE_RUN_REGEX.replace_all(raw.trim(), " ");
    let filtered = FINGERPRINT_REJECT_REGEX.replace_all(&collapsed, "");
    let dated = SLASH_DATE_REGEX.replace_all(&filtered, "${1}-${2}-${3}");
    dated.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_marker() {
        assert_eq!(strip_leading_marker("ĠPROYEK", 'Ġ'), "PROYEK");
        assert_eq!(strip_leading_marker("YEK", 'Ġ'), "YEK");
        assert_eq!(strip_leading_marker("ĠĠA", 'Ġ'), "ĠA");
    }

    #[test]
    fn test_normalize_alnum_strips_spacing_and_punctuation() {
        assert_eq!(normalize_alnum("Berita  Acara: Uji-Terima"), "beritaacaraujiterima");
        assert_eq!(normalize_alnum("B.E R I T A"), "berita");
        assert_eq!(normalize_alnum("Pengukuran OTDR #2"), "pengukuranotdr2");
    }

    #[test]
    fn test_normalize_alnum_is_idempotent() {
        for sample in ["BOQ Uji Terima!", "  lampiran  KML ", "Ünïcode 42", ""] {
            let once = normalize_alnum(sample);
            assert_eq!(normalize_alnum(&once), once);
        }
    }

    #[test]
    fn test_normalize_fingerprint_collapses_whitespace() {
        assert_eq!(
            normalize_fingerprint("  Lat: -6.2  \n Long: 106.8 \t"),
            "Lat: -6.2 Long: 106.8"
        );
    }

    #[test]
    fn test_normalize_fingerprint_drops_rejected_characters() {
        assert_eq!(normalize_fingerprint("ODP-JKT*01 #A"), "ODP-JKT01 A");
        assert_eq!(normalize_fingerprint("12°C | N"), "12°C | N");
    }

    #[test]
    fn test_normalize_fingerprint_rewrites_dates() {
        assert_eq!(
            normalize_fingerprint("7/3/2024 10:15 Jakarta"),
            "7-3-2024 10:15 Jakarta"
        );
        assert_eq!(normalize_fingerprint("17/11/2023"), "17-11-2023");
        assert_eq!(normalize_fingerprint("2023/11/17"), "2023/11/17");
    }

    #[test]
    fn test_normalize_fingerprint_empty() {
        assert_eq!(normalize_fingerprint(""), "");
        assert_eq!(normalize_fingerprint(" \n\t "), "");
        assert_eq!(normalize_fingerprint("@@@"), "");
    }
}
