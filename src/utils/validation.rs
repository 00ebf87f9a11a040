use regex::Regex;
use std::sync::OnceLock;

static LISTING_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_listing_id_regex() -> &'static Regex {
    LISTING_ID_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Invalid regex pattern"))
}

/// True when `raw`, once trimmed, is a non-empty run of ASCII letters and digits.
pub fn is_valid_id(raw: &str) -> bool {
    get_listing_id_regex().is_match(raw.trim())
}
