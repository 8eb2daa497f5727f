//! Library root.
//!
//! The binary (`main.rs`) wires these modules into the interactive CLI.
//!
//! Module responsibilities:
//! - `records`: record queries, retention policy and the interactive
//!   review workflow, written against the `RecordStore` trait.
//! - `api`: blocking HTTP client for sessions, records and profiles.
//! - `ui`: terminal menu and prompts; delegates to `records` and `api`.
//! - `config`, `logging`, `error`: ambient plumbing.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;
pub mod ui;

pub use error::{ApiError, ApiResult};
