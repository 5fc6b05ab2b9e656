//! Translation history: immutable records in a bounded, most-recent-first list

use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of records kept; older ones are evicted first
pub const MAX_HISTORY: usize = 50;

/// One completed translation.
///
/// Fields are read-only after construction. The serialized form uses the
/// `sourceLang`/`targetLang`/`timestamp` keys with a millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    id: String,
    #[serde(rename = "sourceLang")]
    source_language: Language,
    #[serde(rename = "targetLang")]
    target_language: Language,
    original: String,
    translated: String,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(
        id: impl Into<String>,
        source_language: Language,
        target_language: Language,
        original: impl Into<String>,
        translated: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            source_language,
            target_language,
            original: original.into(),
            translated: translated.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_language(&self) -> Language {
        self.source_language
    }

    pub fn target_language(&self) -> Language {
        self.target_language
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn translated(&self) -> &str {
        &self.translated
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// History list, newest first, never longer than [`MAX_HISTORY`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryList {
    records: Vec<HistoryRecord>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records that are already newest first, dropping any beyond the cap
    pub fn from_records(mut records: Vec<HistoryRecord>) -> Self {
        records.truncate(MAX_HISTORY);
        Self { records }
    }

    /// Put `record` at the front and evict the oldest entries over the cap
    pub fn push(&mut self, record: HistoryRecord) {
        self.records.insert(0, record);
        self.records.truncate(MAX_HISTORY);
    }

    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl<'a> IntoIterator for &'a HistoryList {
    type Item = &'a HistoryRecord;
    type IntoIter = std::slice::Iter<'a, HistoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Hands out time-derived record ids.
///
/// An id is the millisecond timestamp of the request start; when two requests
/// start within the same millisecond the later one is bumped forward so ids
/// stay unique and ordered. A stored id at `i64::MAX` cannot be followed, so
/// numbering falls back to the clock after it.
#[derive(Debug, Clone, Default)]
pub struct RecordIds {
    last: i64,
}

impl RecordIds {
    /// Continue after the highest numeric id already present in `history`
    pub fn after(history: &HistoryList) -> Self {
        let last = history
            .iter()
            .filter_map(|r| r.id.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self { last }
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> String {
        let now = now.timestamp_millis();
        let millis = match self.last.checked_add(1) {
            Some(floor) => now.max(floor),
            None => now,
        };
        self.last = millis;
        millis.to_string()
    }
}
