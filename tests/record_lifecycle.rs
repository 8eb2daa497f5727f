//! End-to-end record lifecycle flows against the in-memory record store:
//! batch deletion, compound search, retention pruning and scripted reviews.

use std::collections::VecDeque;
use std::io;

use chrono::{TimeZone, Utc};
use reso_cli::records::fakes::MemoryRecordStore;
use reso_cli::records::review::ReviewCounts;
use reso_cli::records::{
    run_review, Record, RecordQuery, RecordStore, RetentionPlan, ReviewPrompt, ReviewState,
    ReviewStep, SearchCriteria, Session,
};
use reso_cli::ApiError;

fn record(id: &str, name: &str, day: u32, tags: &[&str]) -> Record {
    Record {
        id: id.into(),
        name: name.into(),
        path: "Workspaces\\Private\\RadiantDash".into(),
        last_modification_time: Utc.with_ymd_and_hms(2024, 7, day, 9, 30, 0).unwrap(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn session() -> Session {
    Session::new("U-tester", "token")
}

/// Prompt fed from a fixed list of inputs.
struct ScriptedPrompt {
    inputs: VecDeque<&'static str>,
    shown: Vec<(usize, String)>,
    steps: Vec<String>,
}

impl ScriptedPrompt {
    fn new(inputs: &[&'static str]) -> Self {
        Self {
            inputs: inputs.iter().copied().collect(),
            shown: Vec::new(),
            steps: Vec::new(),
        }
    }
}

impl ReviewPrompt for ScriptedPrompt {
    fn show(&mut self, index: usize, _total: usize, record: &Record, _counts: ReviewCounts) {
        self.shown.push((index, record.id.clone()));
    }

    fn read_decision(&mut self) -> io::Result<String> {
        self.inputs
            .pop_front()
            .map(str::to_string)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }

    fn report(&mut self, step: &ReviewStep) {
        let label = match step {
            ReviewStep::Deleted(r) => format!("deleted:{}", r.id),
            ReviewStep::DeleteFailed(r, _) => format!("failed:{}", r.id),
            ReviewStep::Skipped(r) => format!("skipped:{}", r.id),
            ReviewStep::Exited => "exited".to_string(),
            ReviewStep::Invalid(_) => "invalid".to_string(),
            ReviewStep::Finished => "finished".to_string(),
        };
        self.steps.push(label);
    }
}

#[test]
fn delete_many_continues_past_failure_in_input_order() {
    let records = vec![
        record("r1", "a", 1, &[]),
        record("r2", "a", 2, &[]),
        record("r3", "a", 3, &[]),
    ];
    let store = MemoryRecordStore::new(records.clone());
    store.fail_deletes_of("r2");

    let report = store.delete_many(&session(), &records);

    assert_eq!(store.delete_attempts(), vec!["r1", "r2", "r3"]);
    let succeeded: Vec<&str> = report.succeeded.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(succeeded, vec!["r1", "r3"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.id, "r2");
    assert!(matches!(
        report.failed[0].1,
        ApiError::Transport { status: 500, .. }
    ));
    assert!(!report.is_complete());
    assert_eq!(report.attempted(), 3);
    assert_eq!(store.remaining_ids(), vec!["r2"]);
}

#[test]
fn delete_many_of_nothing_is_empty_report() {
    let store = MemoryRecordStore::new(Vec::new());
    let report = store.delete_many(&session(), &[]);
    assert_eq!(report.attempted(), 0);
    assert!(report.is_complete());
    assert!(store.delete_attempts().is_empty());
}

#[test]
fn compound_search_returns_identity_intersection() {
    let store = MemoryRecordStore::new(vec![
        record("A", "target", 1, &[]),
        record("B", "target", 2, &["pick"]),
        record("C", "target", 3, &["pick"]),
        record("D", "other", 4, &["pick"]),
    ]);
    let session = session();
    let query = RecordQuery::new(&store, &session);

    let by_name: Vec<String> = query.by_name("target").unwrap().into_iter().map(|r| r.id).collect();
    let by_tag: Vec<String> = query.by_tag("pick").unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(by_name, vec!["A", "B", "C"]);
    assert_eq!(by_tag, vec!["B", "C", "D"]);

    let criteria = SearchCriteria::from_inputs("target", "pick").unwrap();
    let both: Vec<String> = query.search(&criteria).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(both, vec!["B", "C"]);
}

#[test]
fn group_pruning_deletes_all_but_newest() {
    let group = vec![
        record("mid", "Screens", 5, &[]),
        record("newest", "Screens", 9, &[]),
        record("oldest", "Screens", 1, &[]),
    ];
    let mut everything = group.clone();
    everything.push(Record {
        path: "Elsewhere".into(),
        ..record("elsewhere", "Screens", 2, &[])
    });
    let store = MemoryRecordStore::new(everything);
    let session = session();

    let fetched = RecordQuery::new(&store, &session)
        .by_name_and_path("Screens", "Workspaces\\Private\\RadiantDash")
        .unwrap();
    assert_eq!(fetched.len(), 3);

    let plan = RetentionPlan::new(&fetched);
    let report = store.delete_many(&session, &plan.candidates);

    assert_eq!(store.delete_attempts(), vec!["oldest", "mid"]);
    assert!(report.is_complete());
    let mut remaining = store.remaining_ids();
    remaining.sort();
    assert_eq!(remaining, vec!["elsewhere", "newest"]);
}

#[test]
fn review_skip_delete_exit_aborts_before_third_record() {
    let records = vec![
        record("one", "a", 1, &[]),
        record("two", "a", 2, &[]),
        record("three", "a", 3, &[]),
    ];
    let store = MemoryRecordStore::new(records.clone());
    let mut prompt = ScriptedPrompt::new(&["s", "D", "e"]);

    let summary = run_review(&store, &session(), records, &mut prompt).unwrap();

    assert_eq!(summary.state, ReviewState::Aborted);
    assert!(summary.aborted());
    assert_eq!(summary.counts.skipped, 1);
    assert_eq!(summary.counts.deleted, 1);
    assert_eq!(summary.counts.reviewed, 2);
    assert_eq!(
        prompt.shown,
        vec![(0, "one".to_string()), (1, "two".to_string()), (2, "three".to_string())]
    );
    assert_eq!(prompt.steps, vec!["skipped:one", "deleted:two", "exited"]);
    assert_eq!(store.delete_attempts(), vec!["two"]);
}

#[test]
fn review_exit_on_first_record_never_shows_the_rest() {
    let records = vec![record("one", "a", 1, &[]), record("two", "a", 2, &[])];
    let store = MemoryRecordStore::new(records.clone());
    let mut prompt = ScriptedPrompt::new(&["E"]);

    let summary = run_review(&store, &session(), records, &mut prompt).unwrap();

    assert_eq!(summary.state, ReviewState::Aborted);
    assert_eq!(prompt.shown, vec![(0, "one".to_string())]);
    assert_eq!(summary.counts, ReviewCounts::default());
}

#[test]
fn review_invalid_input_represents_same_record() {
    let records = vec![record("one", "a", 1, &[]), record("two", "a", 2, &[])];
    let store = MemoryRecordStore::new(records.clone());
    let mut prompt = ScriptedPrompt::new(&["s", "x", "", "S"]);

    let summary = run_review(&store, &session(), records, &mut prompt).unwrap();

    assert_eq!(summary.state, ReviewState::Completed);
    assert_eq!(summary.counts.skipped, 2);
    assert_eq!(summary.counts.deleted, 0);
    let indices: Vec<usize> = prompt.shown.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 1, 1]);
    assert_eq!(prompt.steps, vec!["skipped:one", "invalid", "invalid", "skipped:two"]);
}

#[test]
fn review_failed_delete_is_reported_and_walk_completes() {
    let records = vec![record("one", "a", 1, &[]), record("two", "a", 2, &[])];
    let store = MemoryRecordStore::new(records.clone());
    store.fail_deletes_of("one");
    let mut prompt = ScriptedPrompt::new(&["d", "d"]);

    let summary = run_review(&store, &session(), records, &mut prompt).unwrap();

    assert_eq!(summary.state, ReviewState::Completed);
    assert_eq!(summary.counts.deleted, 1);
    assert_eq!(summary.counts.reviewed, 2);
    assert_eq!(prompt.steps, vec!["failed:one", "deleted:two"]);
    assert_eq!(store.remaining_ids(), vec!["one"]);
}

#[test]
fn message_item_review_uses_policy_query() {
    let store = MemoryRecordStore::new(vec![
        record("plain", "msg", 1, &["message_item"]),
        record("bundle", "msg", 2, &["message_item", "voice", "message"]),
        record("voice-only", "msg", 3, &["message_item", "voice"]),
        record("untagged", "msg", 4, &[]),
    ]);
    let session = session();
    let items = RecordQuery::new(&store, &session).message_items().unwrap();
    let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["plain", "voice-only"]);

    let mut prompt = ScriptedPrompt::new(&["d", "s"]);
    let summary = run_review(&store, &session, items, &mut prompt).unwrap();
    assert_eq!(summary.state, ReviewState::Completed);
    assert_eq!(store.delete_attempts(), vec!["plain"]);
}

#[test]
fn review_of_empty_sequence_completes_without_prompting() {
    let store = MemoryRecordStore::new(Vec::new());
    let mut prompt = ScriptedPrompt::new(&[]);
    let summary = run_review(&store, &session(), Vec::new(), &mut prompt).unwrap();
    assert_eq!(summary.state, ReviewState::Completed);
    assert!(prompt.shown.is_empty());
}
