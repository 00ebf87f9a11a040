pub mod database;
pub mod dataset;
pub mod gate;
pub mod generation;
pub mod prompt;
pub mod retry;
pub mod session;

pub use database::{DatabaseError, DatabaseService};
pub use dataset::{DatasetError, DatasetService};
pub use gate::{Clock, GateDecision, GenerationGate, SystemClock};
pub use generation::{GeminiClient, GenerationError, ResilientGenerator, TextGenerator};
pub use prompt::build_prompt;
pub use retry::{BackoffPolicy, Sleeper, TokioSleeper};
pub use session::{LookupResult, Page, Session};
