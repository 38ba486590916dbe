//! Phone number extraction from HTML and reconciliation with map data.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// German phone numbers: `+49 (0) ...` or area-code-leading `0XXX/` and `0XXXX ` forms
const GERMAN_PHONE_PATTERN: &str = concat!(
    r"(((\+49)( (\(0\)) )?|0\d{3,4}[/ ])",
    r"[^#%:;{},.\d\n]{0,3}(\d{3,10})",
    r"[^#%:;{},.\d\n\w]?(\d{3,7})",
    r"[^#%:;{},.\d\n\w]?(\d{2,4})?",
    r"[^#%:;{},.\d\n\w]?(\d{0,2})?)",
);

static GERMAN_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GERMAN_PHONE_PATTERN).expect("phone pattern compiles"));

/// Strip everything but ASCII digits
pub fn sanitize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// First German phone number in `html`, digits only, or `""` if none
pub fn extract_phone(html: &str) -> String {
    GERMAN_PHONE
        .find(html)
        .map(|m| sanitize_phone(m.as_str()))
        .unwrap_or_default()
}

/// Combine map phones with scraped phones, position by position.
///
/// An empty scraped entry keeps the map phone, as does a scraped entry equal
/// to the digits of the map phone (keeping its formatting). Otherwise the
/// scraped number wins.
pub fn reconcile_phones(primary: &[String], scraped: &[String]) -> Result<Vec<String>> {
    if primary.len() != scraped.len() {
        return Err(Error::LengthMismatch {
            primary: primary.len(),
            scraped: scraped.len(),
        });
    }

    Ok(primary
        .iter()
        .zip(scraped)
        .map(|(map_phone, web_phone)| {
            if web_phone.is_empty() || sanitize_phone(map_phone) == *web_phone {
                map_phone.clone()
            } else {
                web_phone.clone()
            }
        })
        .collect())
}
