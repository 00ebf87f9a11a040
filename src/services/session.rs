use std::time::Duration;

use crate::models::ListingEvent;
use crate::services::gate::GenerationGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Results,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LookupResult {
    #[default]
    NotSearched,
    NoMatches,
    Matches(Vec<ListingEvent>),
}

impl LookupResult {
    pub fn matches(&self) -> &[ListingEvent] {
        match self {
            LookupResult::Matches(rows) => rows,
            _ => &[],
        }
    }
}

/// Everything one interactive user has done so far. Action handlers take it by `&mut`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub page: Page,
    pub last_lookup_id: String,
    pub lookup: LookupResult,
    pub selected: Option<ListingEvent>,
    pub current_description: String,
    pub generated_text: Option<String>,
    pub gate: GenerationGate,
}

impl Session {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            gate: GenerationGate::new(cooldown),
            ..Self::default()
        }
    }

    /// Replaces the previous lookup and drops anything derived from it.
    pub fn apply_lookup(&mut self, listing_id: &str, rows: Vec<ListingEvent>) {
        self.last_lookup_id = listing_id.to_string();
        self.lookup = if rows.is_empty() {
            LookupResult::NoMatches
        } else {
            LookupResult::Matches(rows)
        };
        self.selected = None;
        self.current_description.clear();
        self.generated_text = None;
        self.page = Page::Results;
    }

    /// Selects match `index`; returns `None` when there is no such match.
    pub fn select(&mut self, index: usize) -> Option<&ListingEvent> {
        let event = self.lookup.matches().get(index)?.clone();

        self.current_description = event.description.clone().unwrap_or_default();
        self.selected = Some(event);
        self.selected.as_ref()
    }

    pub fn record_generation(&mut self, text: String) {
        self.generated_text = Some(text);
        self.page = Page::Generated;
    }

    pub fn back_to_results(&mut self) {
        self.page = Page::Results;
    }
}
