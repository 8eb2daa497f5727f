//! Record service abstraction.
//!
//! `RecordStore` is the seam between the core and the network: the HTTP
//! client in `api` implements it for real calls, `fakes::MemoryRecordStore`
//! implements it for tests.

use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::records::model::{Record, Session};

/// Remote list/delete operations over the records owned by a session.
///
/// Each call is exactly one round trip and is attempted once; callers
/// decide whether a failure is reported or surfaced.
pub trait RecordStore {
    /// Retrieve every record owned by the authenticated identity.
    fn fetch_all(&self, session: &Session) -> ApiResult<Vec<Record>>;

    /// Delete a single record by its `id`.
    fn delete(&self, session: &Session, record: &Record) -> ApiResult<()>;

    /// Delete each record in order, continuing past individual failures.
    ///
    /// Deletes are strictly sequential; the report lists outcomes in input
    /// order.
    fn delete_many(&self, session: &Session, records: &[Record]) -> DeletionReport {
        let mut report = DeletionReport::default();
        for record in records {
            match self.delete(session, record) {
                Ok(()) => {
                    info!(record_id = %record.id, name = %record.name, "record deleted");
                    report.succeeded.push(record.clone());
                }
                Err(err) => {
                    warn!(record_id = %record.id, error = %err, "record delete failed");
                    report.failed.push((record.clone(), err));
                }
            }
        }
        report
    }
}

/// Outcome of [`RecordStore::delete_many`].
#[derive(Debug, Default)]
pub struct DeletionReport {
    pub succeeded: Vec<Record>,
    pub failed: Vec<(Record, ApiError)>,
}

impl DeletionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
