//! Retention policy for superseded versions of one name+path group.
//!
//! Records are ordered ascending by `last_modification_time` with a stable
//! sort; the last one is kept, everything before it is a deletion
//! candidate. When several records share the newest timestamp, the one that
//! came last in the input survives. No grouping happens here: callers pass
//! an already-filtered group.

use crate::records::model::Record;

/// Ordered view of a group with the survivor split off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Oldest first; every record except `keep`.
    pub candidates: Vec<Record>,
    /// Most recently modified record, if the group is non-empty.
    pub keep: Option<Record>,
}

impl RetentionPlan {
    /// Build the plan for `records`.
    pub fn new(records: &[Record]) -> Self {
        let mut ordered = sort_oldest_first(records);
        let keep = ordered.pop();
        Self {
            candidates: ordered,
            keep,
        }
    }

    /// Whole group in ascending time order, survivor last.
    pub fn ordered(&self) -> impl Iterator<Item = &Record> {
        self.candidates.iter().chain(self.keep.iter())
    }
}

/// Every record except the most recently modified one.
///
/// Empty for zero or one records.
pub fn select_deletion_candidates(records: &[Record]) -> Vec<Record> {
    RetentionPlan::new(records).candidates
}

/// Stable ascending sort by modification time.
pub fn sort_oldest_first(records: &[Record]) -> Vec<Record> {
    let mut ordered = records.to_vec();
    ordered.sort_by_key(|r| r.last_modification_time);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(id: &str, day: u32) -> Record {
        Record {
            id: id.into(),
            name: "Screens".into(),
            path: "Workspaces\\Private\\RadiantDash".into(),
            last_modification_time: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            tags: Vec::new(),
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn empty_and_single_groups_have_no_candidates() {
        assert!(select_deletion_candidates(&[]).is_empty());
        assert!(select_deletion_candidates(&[at("only", 1)]).is_empty());
    }

    #[test]
    fn keeps_most_recent_and_orders_candidates_oldest_first() {
        let plan = RetentionPlan::new(&[at("mid", 10), at("new", 20), at("old", 1)]);
        assert_eq!(ids(&plan.candidates), vec!["old", "mid"]);
        assert_eq!(plan.keep.as_ref().map(|r| r.id.as_str()), Some("new"));
        let ordered: Vec<&str> = plan.ordered().map(|r| r.id.as_str()).collect();
        assert_eq!(ordered, vec!["old", "mid", "new"]);
    }

    #[test]
    fn tie_on_newest_keeps_last_in_input_order() {
        let candidates =
            select_deletion_candidates(&[at("first", 9), at("old", 2), at("second", 9)]);
        assert_eq!(ids(&candidates), vec!["old", "first"]);

        let swapped =
            select_deletion_candidates(&[at("second", 9), at("old", 2), at("first", 9)]);
        assert_eq!(ids(&swapped), vec!["old", "second"]);
    }
}
