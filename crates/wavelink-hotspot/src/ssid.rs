//! SSID canonicalization.
//!
//! Native readouts disagree on how an SSID looks: the legacy path may quote
//! it, a disconnected device may report a sentinel string, and some paths
//! return nothing at all. Everything that compares SSIDs goes through
//! [`normalize`] first; two SSIDs name the same network iff their canonical
//! forms are byte-equal.

/// Sentinel some OS builds emit instead of an absent value.
pub const UNKNOWN_SSID: &str = "<unknown ssid>";

/// Canonicalize a raw native SSID value.
///
/// Trims whitespace, rejects empty values and the `<unknown ssid>` sentinel,
/// and strips exactly one pair of surrounding double quotes. Quotes embedded
/// elsewhere in the value are preserved.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_SSID {
        return None;
    }

    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    if unquoted.is_empty() {
        return None;
    }
    Some(unquoted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_are_unknown() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("")), None);
        assert_eq!(normalize(Some("   ")), None);
    }

    #[test]
    fn sentinel_is_unknown() {
        assert_eq!(normalize(Some("<unknown ssid>")), None);
        assert_eq!(normalize(Some("  <unknown ssid>  ")), None);
    }

    #[test]
    fn strips_one_pair_of_quotes() {
        assert_eq!(normalize(Some("\"abc\"")).as_deref(), Some("abc"));
        assert_eq!(normalize(Some("\"\"abc\"\"")).as_deref(), Some("\"abc\""));
        assert_eq!(normalize(Some("\"\"")), None);
    }

    #[test]
    fn embedded_quotes_are_preserved() {
        assert_eq!(normalize(Some("ab\"cd")).as_deref(), Some("ab\"cd"));
        assert_eq!(normalize(Some("\"ab\"cd\"")).as_deref(), Some("ab\"cd"));
    }

    #[test]
    fn canonical_values_are_fixed_points() {
        for value in ["Cafe", "Home Network", "ssid-with-dash", "日本語"] {
            let once = normalize(Some(value)).expect("canonical value");
            assert_eq!(normalize(Some(&once)).as_deref(), Some(value));
        }
    }

    #[test]
    fn lone_quote_is_kept_verbatim() {
        assert_eq!(normalize(Some("\"")).as_deref(), Some("\""));
    }
}
