//! In-memory fake for the record service (testing only).
//!
//! Provides `MemoryRecordStore`, which satisfies the `RecordStore`
//! contract without a network and records every call for assertions.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::{ApiError, ApiResult};
use crate::records::model::{Record, Session};
use crate::records::store::RecordStore;

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    failing: HashSet<String>,
    delete_attempts: Vec<String>,
    fetches: usize,
}

/// Record store backed by a `Vec<Record>`.
///
/// Deletes of ids registered with [`MemoryRecordStore::fail_deletes_of`]
/// answer with a 500 `Transport` error and leave the record in place.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    state: Mutex<State>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            state: Mutex::new(State {
                records,
                ..State::default()
            }),
        }
    }

    pub fn fail_deletes_of(&self, id: &str) {
        self.state.lock().unwrap().failing.insert(id.to_string());
    }

    /// Ids passed to `delete`, in call order, including failed attempts.
    pub fn delete_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_attempts.clone()
    }

    /// Number of `fetch_all` round trips served.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    /// Ids still stored.
    pub fn remaining_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.records.iter().map(|r| r.id.clone()).collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn fetch_all(&self, _session: &Session) -> ApiResult<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        Ok(state.records.clone())
    }

    fn delete(&self, session: &Session, record: &Record) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_attempts.push(record.id.clone());
        let endpoint = format!("DELETE /users/{}/records/{}", session.user_id(), record.id);
        if state.failing.contains(&record.id) {
            return Err(ApiError::Transport {
                endpoint,
                status: 500,
                body: "simulated failure".into(),
            });
        }
        let before = state.records.len();
        state.records.retain(|r| r.id != record.id);
        if state.records.len() == before {
            return Err(ApiError::Transport {
                endpoint,
                status: 404,
                body: "record not found".into(),
            });
        }
        Ok(())
    }
}
