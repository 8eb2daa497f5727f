//! Query composer: derives record subsets from the full record set.
//!
//! Predicates are a closed set of [`RecordFilter`] variants evaluated by
//! [`RecordFilter::matches`]. Every query re-fetches the full set through
//! the [`RecordStore`] and filters locally.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::error::ApiResult;
use crate::records::model::{Record, Session};
use crate::records::store::RecordStore;

/// Tag carried by standalone message items.
pub const MESSAGE_ITEM_TAG: &str = "message_item";
/// Tags that, together, mark a combined voice+text message bundle.
pub const VOICE_TAG: &str = "voice";
pub const MESSAGE_TAG: &str = "message";

/// Predicate over a single [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    NameEquals(String),
    PathEquals(String),
    NameAndPath { name: String, path: String },
    HasTag(String),
    /// Tag set intersects the given tags.
    AnyTag(Vec<String>),
    /// Tag set is a superset of the given tags.
    AllTags(Vec<String>),
    /// `message_item` records, excluding voice+message bundles.
    MessageItems,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            RecordFilter::NameEquals(name) => record.name == *name,
            RecordFilter::PathEquals(path) => record.path == *path,
            RecordFilter::NameAndPath { name, path } => {
                record.name == *name && record.path == *path
            }
            RecordFilter::HasTag(tag) => record.has_tag(tag),
            RecordFilter::AnyTag(tags) => tags.iter().any(|t| record.has_tag(t)),
            RecordFilter::AllTags(tags) => tags.iter().all(|t| record.has_tag(t)),
            RecordFilter::MessageItems => {
                record.has_tag(MESSAGE_ITEM_TAG)
                    && !(record.has_tag(VOICE_TAG) && record.has_tag(MESSAGE_TAG))
            }
        }
    }

    /// Keep the records matching this filter, preserving order.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Operator search input: a name, a tag, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    Name(String),
    Tag(String),
    NameAndTag { name: String, tag: String },
}

impl SearchCriteria {
    /// Build criteria from raw prompt input. Blank fields are skipped;
    /// returns `None` when both are blank.
    pub fn from_inputs(name: &str, tag: &str) -> Option<Self> {
        let name = name.trim();
        let tag = tag.trim();
        match (name.is_empty(), tag.is_empty()) {
            (true, true) => None,
            (false, true) => Some(SearchCriteria::Name(name.to_string())),
            (true, false) => Some(SearchCriteria::Tag(tag.to_string())),
            (false, false) => Some(SearchCriteria::NameAndTag {
                name: name.to_string(),
                tag: tag.to_string(),
            }),
        }
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriteria::Name(name) => write!(f, "name '{name}'"),
            SearchCriteria::Tag(tag) => write!(f, "tag '{tag}'"),
            SearchCriteria::NameAndTag { name, tag } => {
                write!(f, "both name '{name}' and tag '{tag}'")
            }
        }
    }
}

/// Read-only queries bound to a store and a session.
pub struct RecordQuery<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    session: &'a Session,
}

impl<'a, S: RecordStore + ?Sized> RecordQuery<'a, S> {
    pub fn new(store: &'a S, session: &'a Session) -> Self {
        Self { store, session }
    }

    /// Fetch the full set and keep what `filter` matches.
    pub fn filtered(&self, filter: &RecordFilter) -> ApiResult<Vec<Record>> {
        let all = self.store.fetch_all(self.session)?;
        let total = all.len();
        let matched = filter.apply(all);
        debug!(?filter, total, matched = matched.len(), "filtered records");
        Ok(matched)
    }

    pub fn by_name(&self, name: &str) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::NameEquals(name.to_string()))
    }

    pub fn by_path(&self, path: &str) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::PathEquals(path.to_string()))
    }

    pub fn by_name_and_path(&self, name: &str, path: &str) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::NameAndPath {
            name: name.to_string(),
            path: path.to_string(),
        })
    }

    pub fn by_tag(&self, tag: &str) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::HasTag(tag.to_string()))
    }

    pub fn by_any_tag(&self, tags: &[String]) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::AnyTag(tags.to_vec()))
    }

    pub fn by_all_tags(&self, tags: &[String]) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::AllTags(tags.to_vec()))
    }

    pub fn message_items(&self) -> ApiResult<Vec<Record>> {
        self.filtered(&RecordFilter::MessageItems)
    }

    /// Run an operator search.
    ///
    /// Name-and-tag searches run both queries independently (two fetches)
    /// and keep the name results whose id also appears in the tag results.
    pub fn search(&self, criteria: &SearchCriteria) -> ApiResult<Vec<Record>> {
        match criteria {
            SearchCriteria::Name(name) => self.by_name(name),
            SearchCriteria::Tag(tag) => self.by_tag(tag),
            SearchCriteria::NameAndTag { name, tag } => {
                let by_name = self.by_name(name)?;
                let by_tag = self.by_tag(tag)?;
                Ok(intersect_by_id(by_name, &by_tag))
            }
        }
    }
}

/// Records of `left` whose `id` also appears in `right`, in `left` order.
pub fn intersect_by_id(left: Vec<Record>, right: &[Record]) -> Vec<Record> {
    let ids: HashSet<&str> = right.iter().map(|r| r.id.as_str()).collect();
    left.into_iter()
        .filter(|r| ids.contains(r.id.as_str()))
        .collect()
}

/// Order by `last_modification_time`, most recent first.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.last_modification_time.cmp(&a.last_modification_time));
}
