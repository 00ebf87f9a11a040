use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

pub const KEY_COLUMN: &str = "listing_id";
pub const DESCRIPTION_COLUMN: &str = "description";

/// Columns the results view needs, in display order.
pub const DISPLAY_COLUMNS: [&str; 8] = [
    "event_name",
    "event_type",
    "event_date",
    "venue_name",
    "distance_km",
    "days_until_event",
    "current_price",
    "suggested_price",
];

/// Header shown for a display column in the results table.
pub fn display_header(column: &str) -> &str {
    match column {
        "days_until_event" => "days_until",
        "suggested_price" => "suggested_price_for_event",
        other => other,
    }
}

/// One event row matched to a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingEvent {
    pub listing_id: String,
    pub event_name: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub venue_name: Option<String>,
    pub distance_km: Option<f64>,
    pub days_until_event: Option<i64>,
    pub current_price: Option<f64>,
    pub suggested_price: Option<f64>,
    pub description: Option<String>,
}

impl ListingEvent {
    /// Builds an event from raw column text. Absent columns, NULL cells and
    /// unparseable values all become `None`.
    pub fn from_record(record: &HashMap<String, Option<String>>) -> Self {
        let text = |column: &str| -> Option<String> {
            record
                .get(column)
                .cloned()
                .flatten()
                .filter(|value| !value.trim().is_empty())
        };

        Self {
            listing_id: text(KEY_COLUMN).unwrap_or_default(),
            event_name: text("event_name"),
            event_type: text("event_type"),
            event_date: text("event_date").as_deref().and_then(parse_event_date),
            venue_name: text("venue_name"),
            distance_km: text("distance_km").as_deref().and_then(parse_float),
            days_until_event: text("days_until_event").as_deref().and_then(parse_whole_number),
            current_price: text("current_price").as_deref().and_then(parse_float),
            suggested_price: text("suggested_price").as_deref().and_then(parse_float),
            description: text(DESCRIPTION_COLUMN),
        }
    }

    /// Display text for one of the [`DISPLAY_COLUMNS`]; empty when the value is absent.
    pub fn display_value(&self, column: &str) -> String {
        match column {
            KEY_COLUMN => self.listing_id.clone(),
            "event_name" => self.event_name.clone().unwrap_or_default(),
            "event_type" => self.event_type.clone().unwrap_or_default(),
            "event_date" => self.event_date.map(|d| d.to_string()).unwrap_or_default(),
            "venue_name" => self.venue_name.clone().unwrap_or_default(),
            "distance_km" => self.distance_km.map(|v| v.to_string()).unwrap_or_default(),
            "days_until_event" => self.days_until_event.map(|v| v.to_string()).unwrap_or_default(),
            "current_price" => self.current_price.map(|v| v.to_string()).unwrap_or_default(),
            "suggested_price" => self.suggested_price.map(|v| v.to_string()).unwrap_or_default(),
            DESCRIPTION_COLUMN => self.description.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Label used when offering this row in a picker.
    pub fn option_label(&self, index: usize) -> String {
        format!(
            "{}: {} | {} | {}",
            index,
            self.display_value("event_name"),
            self.display_value("event_date"),
            self.display_value("venue_name")
        )
    }
}

pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_whole_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    parse_float(raw)
        .filter(|value| value.fract() == 0.0)
        .map(|value| value as i64)
}
