pub mod listing;
pub mod response;

pub use listing::ListingEvent;
pub use response::SuccessResponse;
