pub mod choices;
pub mod error;
pub mod models;

pub use choices::{ChoiceRegistry, RegistryError, RESET_VOTE};
pub use error::{Error, ErrorCode};
pub use models::{HealthResponse, SyncStats, Tally, TallyEntry, VoteForm, VoteOutcome, VoteResponse};
