//! Filename derivation.
//!
//! `https://example.com/my-page!` captured on 2024-03-05 becomes
//! `example_com_my_page_20240305.pdf`: host and path with every character
//! outside `[a-z0-9]` replaced by `_`, lowercased, followed by the date.
//! The base is cut hard at the length limit, which may eat into the date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use url::Url;

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Default limit for the filename before the extension.
pub const DEFAULT_MAX_FILENAME_LEN: usize = 100;

/// Extension appended after truncation.
pub const PDF_EXTENSION: &str = ".pdf";

// Spelled out instead of `(?i)`: Unicode case folding would let `ſ` and
// the Kelvin sign through as `s` and `k`.
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]").expect("valid regex"));

// ============================================================================
// Functions
// ============================================================================

/// Replaces every character outside `[a-z0-9]` with `_` and lowercases.
///
/// Idempotent.
#[must_use]
pub fn sanitize(segment: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(segment, "_")
        .to_ascii_lowercase()
}

/// Formats `date` as `YYYYMMDD`.
#[must_use]
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Keeps at most `max_len` characters of `base`.
#[must_use]
pub fn truncate(base: &str, max_len: usize) -> &str {
    match base.char_indices().nth(max_len) {
        Some((cut, _)) => &base[..cut],
        None => base,
    }
}

/// Builds the untruncated base name for `url` on `date`.
///
/// URLs without a host (`about:blank`, `file:///...`) contribute an empty
/// host segment.
///
/// # Errors
///
/// Returns [`crate::Error::Url`] if `url` does not parse.
pub fn candidate_base(url: &str, date: NaiveDate) -> Result<String> {
    let url = Url::parse(url)?;
    let host = sanitize(url.host_str().unwrap_or_default());
    let path = sanitize(url.path());

    Ok(format!("{host}{path}{}", date_stamp(date)))
}

/// Derives the full `.pdf` filename for `url` on `date`.
///
/// # Errors
///
/// Returns [`crate::Error::Url`] if `url` does not parse.
pub fn derive_filename(url: &str, date: NaiveDate, max_len: usize) -> Result<String> {
    let base = candidate_base(url, date)?;
    Ok(format!("{}{PDF_EXTENSION}", truncate(&base, max_len)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_example_page() {
        let name = derive_filename("https://example.com/my-page!", date(2024, 3, 5), 100)
            .expect("filename");
        assert_eq!(name, "example_com_my_page_20240305.pdf");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Example.COM"), "example_com");
        assert_eq!(sanitize("/a-b/c%20d"), "_a_b_c_20d");
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("\u{17f}\u{212a}"), "__");
    }

    #[test]
    fn test_query_and_fragment_ignored() {
        let name =
            derive_filename("https://a.io/x?y=1#z", date(2024, 1, 1), 100).expect("filename");
        assert_eq!(name, "a_io_x20240101.pdf");
    }

    #[test]
    fn test_hostless_url() {
        let name = derive_filename("about:blank", date(2024, 1, 1), 100).expect("filename");
        assert_eq!(name, "blank20240101.pdf");
    }

    #[test]
    fn test_invalid_url() {
        assert!(derive_filename("not a url", date(2024, 1, 1), 100).is_err());
    }

    #[test]
    fn test_date_stamp_zero_padded() {
        assert_eq!(date_stamp(date(2025, 1, 9)), "20250109");
        assert_eq!(date_stamp(date(2025, 12, 31)), "20251231");
    }

    #[test]
    fn test_truncation_can_cut_date() {
        let url = format!("https://example.com/{}", "a".repeat(200));
        let name = derive_filename(&url, date(2024, 3, 5), 100).expect("filename");

        assert_eq!(name.len(), 100 + PDF_EXTENSION.len());
        assert!(name.starts_with("example_com_aaa"));
        assert!(!name.contains("20240305"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("été", 2), "ét");
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent(s in ".*") {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once.clone());
        }

        #[test]
        fn prop_sanitized_charset(s in ".*") {
            prop_assert!(
                sanitize(&s)
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            );
        }

        #[test]
        fn prop_truncation(s in "[a-z0-9_]{0,300}") {
            let cut = truncate(&s, DEFAULT_MAX_FILENAME_LEN);
            if s.len() > DEFAULT_MAX_FILENAME_LEN {
                prop_assert_eq!(cut, &s[..DEFAULT_MAX_FILENAME_LEN]);
            } else {
                prop_assert_eq!(cut, s.as_str());
            }
        }

        #[test]
        fn prop_date_stamp_segment(
            path in "[a-z]{0,20}",
            y in 1970i32..2100,
            m in 1u32..=12,
            d in 1u32..=28,
        ) {
            let day = date(y, m, d);
            let name = derive_filename(&format!("https://example.com/{path}"), day, 100)
                .expect("filename");
            let stem = name.strip_suffix(PDF_EXTENSION).expect("extension");
            let expected_date = format!("{y:04}{m:02}{d:02}");
            prop_assert!(stem.ends_with(&expected_date));
        }
    }
}
