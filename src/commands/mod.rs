pub mod generation;
pub mod listing;
