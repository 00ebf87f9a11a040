use crate::models::ListingEvent;
use crate::utils::LISTING_PROMPT_TEMPLATE;

pub const MAX_DESCRIPTION_CHARS: usize = 1500;
pub const TRUNCATION_MARKER: &str = "...";

const DEFAULT_EVENT_NAME: &str = "an upcoming event";
const DEFAULT_EVENT_TYPE: &str = "event";

/// Renders the rewrite prompt for `event`. Pure: the same inputs always give the same string.
pub fn build_prompt(event: &ListingEvent, description: &str) -> String {
    let event_name = event.event_name.as_deref().unwrap_or(DEFAULT_EVENT_NAME);
    let event_type = event.event_type.as_deref().unwrap_or(DEFAULT_EVENT_TYPE);

    // description goes last so text inside it is never treated as a placeholder
    LISTING_PROMPT_TEMPLATE
        .replace("{event_name}", event_name)
        .replace("{event_type}", event_type)
        .replace("{event_date}", &event.display_value("event_date"))
        .replace("{venue_name}", &event.display_value("venue_name"))
        .replace("{distance_km}", &event.display_value("distance_km"))
        .replace("{days_until}", &event.display_value("days_until_event"))
        .replace("{current_price}", &event.display_value("current_price"))
        .replace("{suggested_price}", &event.display_value("suggested_price"))
        .replace("{description}", &truncate_description(description))
}

/// Trims the description and caps it at [`MAX_DESCRIPTION_CHARS`] characters.
pub fn truncate_description(description: &str) -> String {
    let description = description.trim();

    match description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}{}", &description[..cut], TRUNCATION_MARKER),
        None => description.to_string(),
    }
}
