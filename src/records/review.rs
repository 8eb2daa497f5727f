//! Interactive review of an ordered record sequence.
//!
//! A [`ReviewSession`] walks the sequence one record at a time and applies
//! the operator's delete/skip/exit decision to the current record. Failed
//! deletes are reported and the walk moves on. Invalid input leaves the
//! session where it is. The session does not care where the sequence came
//! from; search results and the message-item policy both feed it.

use std::io;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::records::model::{Record, Session};
use crate::records::store::RecordStore;

/// Operator decision for the record under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Delete,
    Skip,
    Exit,
}

/// Input that is not one of `D`, `S` or `E`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid option `{0}`; choose D, S, or E")]
pub struct InvalidDecision(pub String);

impl FromStr for Decision {
    type Err = InvalidDecision;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Decision::Delete),
            "S" => Ok(Decision::Skip),
            "E" => Ok(Decision::Exit),
            _ => Err(InvalidDecision(input.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Presenting(usize),
    AwaitingDecision(usize),
    Completed,
    Aborted,
}

impl ReviewState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ReviewState::Completed | ReviewState::Aborted)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewCounts {
    /// Records that received a delete or skip decision.
    pub reviewed: usize,
    pub deleted: usize,
    pub skipped: usize,
}

/// What a single input did to the session.
#[derive(Debug)]
pub enum ReviewStep {
    Deleted(Record),
    DeleteFailed(Record, ApiError),
    Skipped(Record),
    Exited,
    /// Input was not a decision; the same record is presented again.
    Invalid(InvalidDecision),
    /// The session had already terminated.
    Finished,
}

/// Final counts and terminal state of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    pub total: usize,
    pub counts: ReviewCounts,
    pub state: ReviewState,
}

impl ReviewSummary {
    pub fn aborted(&self) -> bool {
        self.state == ReviewState::Aborted
    }
}

/// Ephemeral review over one candidate sequence.
#[derive(Debug)]
pub struct ReviewSession {
    records: Vec<Record>,
    state: ReviewState,
    counts: ReviewCounts,
}

impl ReviewSession {
    pub fn new(records: Vec<Record>) -> Self {
        let state = if records.is_empty() {
            ReviewState::Completed
        } else {
            ReviewState::Presenting(0)
        };
        Self {
            records,
            state,
            counts: ReviewCounts::default(),
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn counts(&self) -> ReviewCounts {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Move the current record to `AwaitingDecision` and return it with
    /// its index. A record still awaiting a decision is returned again.
    /// `None` once the session has terminated.
    pub fn present(&mut self) -> Option<(usize, &Record)> {
        let index = match self.state {
            ReviewState::Presenting(i) | ReviewState::AwaitingDecision(i) => i,
            ReviewState::Completed | ReviewState::Aborted => return None,
        };
        self.state = ReviewState::AwaitingDecision(index);
        Some((index, &self.records[index]))
    }

    /// Parse `input` and apply it to the current record.
    pub fn apply_input<S>(&mut self, store: &S, session: &Session, input: &str) -> ReviewStep
    where
        S: RecordStore + ?Sized,
    {
        if self.state.is_terminal() {
            return ReviewStep::Finished;
        }
        match input.parse::<Decision>() {
            Ok(decision) => self.decide(store, session, decision),
            Err(invalid) => {
                debug!(input = %invalid.0, "ignoring invalid review input");
                ReviewStep::Invalid(invalid)
            }
        }
    }

    /// Apply `decision` to the current record.
    pub fn decide<S>(&mut self, store: &S, session: &Session, decision: Decision) -> ReviewStep
    where
        S: RecordStore + ?Sized,
    {
        let index = match self.state {
            ReviewState::Presenting(i) | ReviewState::AwaitingDecision(i) => i,
            ReviewState::Completed | ReviewState::Aborted => return ReviewStep::Finished,
        };
        let step = match decision {
            Decision::Exit => {
                info!(index, remaining = self.records.len() - index, "review exited early");
                self.state = ReviewState::Aborted;
                return ReviewStep::Exited;
            }
            Decision::Skip => {
                self.counts.skipped += 1;
                ReviewStep::Skipped(self.records[index].clone())
            }
            Decision::Delete => {
                let record = self.records[index].clone();
                match store.delete(session, &record) {
                    Ok(()) => {
                        self.counts.deleted += 1;
                        info!(record_id = %record.id, "record deleted during review");
                        ReviewStep::Deleted(record)
                    }
                    Err(err) => {
                        warn!(record_id = %record.id, error = %err, "review delete failed");
                        ReviewStep::DeleteFailed(record, err)
                    }
                }
            }
        };
        self.counts.reviewed += 1;
        self.advance(index);
        step
    }

    fn advance(&mut self, index: usize) {
        self.state = if index + 1 >= self.records.len() {
            ReviewState::Completed
        } else {
            ReviewState::Presenting(index + 1)
        };
    }

    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            total: self.records.len(),
            counts: self.counts,
            state: self.state,
        }
    }
}

/// Presentation seam for [`run_review`].
pub trait ReviewPrompt {
    /// Show record `index` (zero-based) of `total`.
    fn show(&mut self, index: usize, total: usize, record: &Record, counts: ReviewCounts);

    /// Read one raw decision line.
    fn read_decision(&mut self) -> io::Result<String>;

    /// Report the effect of the last input.
    fn report(&mut self, step: &ReviewStep);
}

/// Drive a review to a terminal state, one prompt per presented record.
pub fn run_review<S, P>(
    store: &S,
    session: &Session,
    records: Vec<Record>,
    prompt: &mut P,
) -> io::Result<ReviewSummary>
where
    S: RecordStore + ?Sized,
    P: ReviewPrompt + ?Sized,
{
    let mut review = ReviewSession::new(records);
    let total = review.len();
    loop {
        let counts = review.counts();
        match review.present() {
            Some((index, record)) => prompt.show(index, total, record, counts),
            None => break,
        }
        let input = prompt.read_decision()?;
        let step = review.apply_input(store, session, &input);
        prompt.report(&step);
    }
    let summary = review.summary();
    info!(
        total = summary.total,
        deleted = summary.counts.deleted,
        skipped = summary.counts.skipped,
        aborted = summary.aborted(),
        "review finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fakes::MemoryRecordStore;
    use chrono::{TimeZone, Utc};

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            name: format!("name-{id}"),
            path: "Inventory".into(),
            last_modification_time: Utc.with_ymd_and_hms(2024, 2, 2, 2, 2, 2).unwrap(),
            tags: vec!["message_item".into()],
        }
    }

    fn session() -> Session {
        Session::new("U-reviewer", "tok")
    }

    #[test]
    fn decision_parsing_is_case_insensitive() {
        assert_eq!("d".parse::<Decision>(), Ok(Decision::Delete));
        assert_eq!(" S ".parse::<Decision>(), Ok(Decision::Skip));
        assert_eq!("e".parse::<Decision>(), Ok(Decision::Exit));
        assert!("x".parse::<Decision>().is_err());
        assert!("delete".parse::<Decision>().is_err());
        assert!("".parse::<Decision>().is_err());
    }

    #[test]
    fn invalid_decision_message_names_the_options() {
        let err = " x ".parse::<Decision>().unwrap_err();
        assert_eq!(err, InvalidDecision("x".into()));
        assert_eq!(err.to_string(), "invalid option `x`; choose D, S, or E");
    }

    #[test]
    fn empty_sequence_starts_completed() {
        let mut review = ReviewSession::new(Vec::new());
        assert_eq!(review.state(), ReviewState::Completed);
        assert!(review.present().is_none());
    }

    #[test]
    fn invalid_input_keeps_index_and_counters() {
        let store = MemoryRecordStore::new(vec![record("a"), record("b")]);
        let mut review = ReviewSession::new(vec![record("a"), record("b")]);
        review.decide(&store, &session(), Decision::Skip);
        assert_eq!(review.present().map(|(i, _)| i), Some(1));

        let step = review.apply_input(&store, &session(), "x");
        assert!(matches!(step, ReviewStep::Invalid(_)));
        assert_eq!(review.state(), ReviewState::AwaitingDecision(1));
        assert_eq!(review.counts().skipped, 1);
        assert_eq!(review.counts().reviewed, 1);
        assert_eq!(review.present().map(|(i, r)| (i, r.id.clone())), Some((1, "b".to_string())));
    }

    #[test]
    fn failed_delete_still_advances() {
        let store = MemoryRecordStore::new(vec![record("a"), record("b")]);
        store.fail_deletes_of("a");
        let mut review = ReviewSession::new(vec![record("a"), record("b")]);
        review.present();

        let step = review.apply_input(&store, &session(), "D");
        assert!(matches!(step, ReviewStep::DeleteFailed(ref r, _) if r.id == "a"));
        assert_eq!(review.state(), ReviewState::Presenting(1));
        assert_eq!(review.counts().deleted, 0);
        assert_eq!(review.counts().reviewed, 1);
    }

    #[test]
    fn last_decision_completes() {
        let store = MemoryRecordStore::new(vec![record("a")]);
        let mut review = ReviewSession::new(vec![record("a")]);
        review.present();
        assert!(matches!(review.apply_input(&store, &session(), "d"), ReviewStep::Deleted(_)));
        assert_eq!(review.state(), ReviewState::Completed);
        assert!(matches!(review.apply_input(&store, &session(), "d"), ReviewStep::Finished));
        assert_eq!(store.delete_attempts(), vec!["a"]);
    }
}
