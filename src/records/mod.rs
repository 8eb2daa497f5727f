//! Record query and lifecycle management.
//!
//! - `model`: `Record` and `Session` values.
//! - `store`: the `RecordStore` seam and sequential batch deletion.
//! - `query`: filters and operator searches over the full record set.
//! - `retention`: which versions of a name+path group to keep.
//! - `review`: the delete/skip/exit walk over a record sequence.
//! - `fakes`: in-memory `RecordStore` for tests.

pub mod fakes;
pub mod model;
pub mod query;
pub mod retention;
pub mod review;
pub mod store;

pub use model::{Record, Session};
pub use query::{RecordFilter, RecordQuery, SearchCriteria};
pub use retention::{select_deletion_candidates, RetentionPlan};
pub use review::{
    run_review, Decision, ReviewPrompt, ReviewSession, ReviewState, ReviewStep, ReviewSummary,
};
pub use store::{DeletionReport, RecordStore};
