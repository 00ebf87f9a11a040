use crate::error::{AppError, AppResult};
use crate::models::SuccessResponse;
use crate::services::{build_prompt, Clock, GateDecision, Page, Session, TextGenerator};

pub const MIN_API_KEY_LEN: usize = 10;
pub const NO_SELECTION_MESSAGE: &str = "First run a lookup and select an event row.";
pub const INVALID_KEY_MESSAGE: &str = "Please paste a valid Gemini API key to generate text.";
pub const IN_FLIGHT_MESSAGE: &str = "Generation already in progress. Please wait.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    Generated { text: String, call_count: u64 },
    Busy,
    CoolingDown { wait_secs: u64 },
}

fn validate_api_key(api_key: &str) -> AppResult<&str> {
    let api_key = api_key.trim();
    if api_key.chars().count() < MIN_API_KEY_LEN {
        return Err(AppError::Precondition(INVALID_KEY_MESSAGE.to_string()));
    }
    Ok(api_key)
}

/// Rewrites the selected listing's description through `generator`.
///
/// Busy and cooldown rejections come back as `Ok` with a wait message; only
/// precondition and generator failures are errors.
pub async fn generate_description<G, C>(
    session: &mut Session,
    generator: &G,
    clock: &C,
    api_key: &str,
    model: &str,
) -> AppResult<SuccessResponse<GenerateOutcome>>
where
    G: TextGenerator + ?Sized,
    C: Clock + ?Sized,
{
    let prompt = match &session.selected {
        Some(event) => build_prompt(event, &session.current_description),
        None => {
            session.page = Page::Results;
            return Err(AppError::Precondition(NO_SELECTION_MESSAGE.to_string()));
        }
    };
    let api_key = validate_api_key(api_key)?;

    let call_count = match session.gate.try_begin(true, clock.now()) {
        GateDecision::Proceed { call_number } => call_number,
        GateDecision::NoSelection => {
            session.page = Page::Results;
            return Err(AppError::Precondition(NO_SELECTION_MESSAGE.to_string()));
        }
        GateDecision::InFlight => {
            return Ok(SuccessResponse::with_message(GenerateOutcome::Busy, IN_FLIGHT_MESSAGE));
        }
        GateDecision::CoolingDown { wait_secs } => {
            return Ok(SuccessResponse::with_message(
                GenerateOutcome::CoolingDown { wait_secs },
                format!("Please wait {}s before generating again.", wait_secs),
            ));
        }
    };

    tracing::info!(call_count, model, "generating description");

    match generator.generate(api_key, model, &prompt).await {
        Ok(text) => {
            session.gate.complete_success(clock.now());
            session.record_generation(text.clone());
            tracing::info!(call_count, chars = text.chars().count(), "generation completed");

            Ok(SuccessResponse::with_message(
                GenerateOutcome::Generated { text, call_count },
                format!("Gemini calls this session: {}", call_count),
            ))
        }
        Err(err) => {
            session.gate.complete_failure();
            tracing::warn!(call_count, error = %err, "generation failed");
            Err(err.into())
        }
    }
}
