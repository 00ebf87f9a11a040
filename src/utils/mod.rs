pub mod listing_prompt_template;
pub mod validation;

pub use listing_prompt_template::LISTING_PROMPT_TEMPLATE;
pub use validation::is_valid_id;
