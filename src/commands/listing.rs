use crate::error::{AppError, AppResult};
use crate::models::listing::{display_header, DISPLAY_COLUMNS};
use crate::models::{ListingEvent, SuccessResponse};
use crate::services::{DatasetService, LookupResult, Session};
use crate::utils::is_valid_id;

pub const INVALID_ID_MESSAGE: &str = "Invalid listing_id. Use only A-Z, a-z, 0-9 (no spaces).";
pub const NO_MATCHES_MESSAGE: &str = "No events found for that listing_id.";
pub const NOT_SEARCHED_MESSAGE: &str =
    "Enter a listing_id and run find. Examples: 27926486, 43546204, 45491410";

#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    NotSearched,
    NoMatches,
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        options: Vec<String>,
    },
}

/// Validates `raw_id` and replaces the session's lookup with its matches.
/// An invalid id is rejected before any state is touched.
pub fn find_listing(
    session: &mut Session,
    dataset: &DatasetService,
    raw_id: &str,
) -> AppResult<SuccessResponse<usize>> {
    if !is_valid_id(raw_id) {
        tracing::debug!(raw_id, "rejected listing id");
        return Err(AppError::Validation(INVALID_ID_MESSAGE.to_string()));
    }

    let listing_id = raw_id.trim();
    let rows = dataset.find_by_listing_id(listing_id)?;
    let matches = rows.len();

    session.apply_lookup(listing_id, rows);
    tracing::info!(listing_id, matches, "lookup completed");

    if matches == 0 {
        Ok(SuccessResponse::with_message(0, NO_MATCHES_MESSAGE))
    } else {
        Ok(SuccessResponse::new(matches))
    }
}

pub fn select_event(session: &mut Session, index: usize) -> AppResult<SuccessResponse<ListingEvent>> {
    let available = session.lookup.matches().len();
    if available == 0 {
        return Err(AppError::Precondition(
            "First run a lookup that finds events, then pick one.".to_string(),
        ));
    }

    let event = session
        .select(index)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("event row {} (pick 0-{})", index, available - 1)))?;

    let label = event.option_label(index);
    Ok(SuccessResponse::with_message(event, format!("Selected {}", label)))
}

pub fn back_to_results(session: &mut Session) -> AppResult<SuccessResponse<()>> {
    session.back_to_results();
    Ok(SuccessResponse::new(()))
}

/// Builds the results page. A dataset missing display columns blocks the table.
pub fn results_view(session: &Session, dataset: &DatasetService) -> AppResult<ResultsView> {
    let rows = match &session.lookup {
        LookupResult::NotSearched => return Ok(ResultsView::NotSearched),
        LookupResult::NoMatches => return Ok(ResultsView::NoMatches),
        LookupResult::Matches(rows) => rows,
    };

    dataset.check_display_columns()?;

    let headers: Vec<String> = DISPLAY_COLUMNS.iter().map(|c| display_header(c).to_string()).collect();
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|event| DISPLAY_COLUMNS.iter().map(|c| event.display_value(c)).collect::<Vec<_>>())
        .collect();
    let options: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, event)| event.option_label(i))
        .collect();

    Ok(ResultsView::Table {
        headers,
        rows: table,
        options,
    })
}
