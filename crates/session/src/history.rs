//! Bounded search history with JSON persistence.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use core_types::{Language, Metric};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::SearchQuery;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub class: Option<String>,
    pub query: SearchQuery,
    /// Metric the search ran with; absent in files written before it was recorded.
    #[serde(default)]
    pub metric: Option<Metric>,
    pub result_count: usize,
}

impl HistoryEntry {
    pub fn new(
        query: SearchQuery,
        class: Option<String>,
        metric: Metric,
        result_count: usize,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            class,
            query,
            metric: Some(metric),
            result_count,
        }
    }

    /// One-line listing, e.g. `03/05 14:07 - Query: bolt (8 results)`.
    pub fn summary(&self, language: Language) -> String {
        let ts = self.timestamp.format("%m/%d %H:%M");
        let class = self.class.as_deref().unwrap_or("None");
        match language {
            Language::En => format!("{ts} - Query: {class} ({} results)", self.result_count),
            Language::Zh => format!("{ts} - 查询: {class} ({}结果)", self.result_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl SearchHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an entry, evicting the oldest once full.
    pub fn push(&mut self, entry: HistoryEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries newest first.
    pub fn iter_recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    /// Entry `index` positions back from the newest (0 = newest).
    pub fn get_recent(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.iter().rev().nth(index)
    }

    /// Load from a JSON file. A missing file is an empty history; entries beyond
    /// `capacity` are dropped oldest-first.
    pub fn load(path: &Path, capacity: usize) -> Result<Self> {
        let mut history = Self::new(capacity);
        if !path.exists() {
            return Ok(history);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading history {}", path.display()))?;
        let entries: Vec<HistoryEntry> = serde_json::from_str(&text)
            .with_context(|| format!("parsing history {}", path.display()))?;
        for entry in entries {
            history.push(entry);
        }
        Ok(history)
    }

    /// Write to a temp file next to `path` and rename it into place, so an
    /// interrupted save never leaves a truncated history behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating history dir {}", parent.display()))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temp file in {}", parent.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries).context("serializing history")?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("flushing history {}", path.display()))?;
        tmp.persist(path)
            .with_context(|| format!("writing history {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn entry(class: &str, count: usize) -> HistoryEntry {
        let query = SearchQuery {
            feature_file: PathBuf::from(format!("/q/{class}.npy")),
            candidate_input: PathBuf::from("/db"),
            is_single_file: false,
            artifact_dir: PathBuf::from("/models"),
            model_file: None,
        };
        HistoryEntry::new(query, Some(class.to_string()), Metric::Euclidean, count)
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut history = SearchHistory::new(3);
        for (i, class) in ["a", "b", "c", "d"].iter().enumerate() {
            history.push(entry(class, i));
        }
        assert_eq!(history.len(), 3);
        let classes: Vec<_> = history
            .iter_recent()
            .map(|e| e.class.clone().unwrap())
            .collect();
        assert_eq!(classes, vec!["d", "c", "b"]);
        assert_eq!(history.get_recent(2).unwrap().class.as_deref(), Some("b"));
        assert!(history.get_recent(3).is_none());
    }

    #[test]
    fn persists_as_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("state").join("history.json");
        let mut history = SearchHistory::new(20);
        history.push(entry("bolt", 8));
        history.push(entry("gear", 3));
        history.save(&path)?;

        let loaded = SearchHistory::load(&path, 20)?;
        assert_eq!(loaded, history);

        let shrunk = SearchHistory::load(&path, 1)?;
        assert_eq!(shrunk.len(), 1);
        assert_eq!(shrunk.get_recent(0).unwrap().class.as_deref(), Some("gear"));
        Ok(())
    }

    #[test]
    fn save_replaces_file_without_leftovers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[{\"timestamp\":")?;

        let mut history = SearchHistory::new(5);
        history.push(entry("bolt", 2));
        history.save(&path)?;
        history.push(entry("gear", 4));
        history.save(&path)?;

        assert_eq!(SearchHistory::load(&path, 5)?, history);
        let files: Vec<_> = std::fs::read_dir(dir.path())?.collect::<std::io::Result<_>>()?;
        assert_eq!(files.len(), 1);
        Ok(())
    }

    #[test]
    fn entries_without_metric_still_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("history.json");
        let mut value = serde_json::to_value(vec![entry("bolt", 1)])?;
        if let Some(fields) = value[0].as_object_mut() {
            fields.remove("metric");
        }
        std::fs::write(&path, value.to_string())?;

        let loaded = SearchHistory::load(&path, 5)?;
        assert_eq!(loaded.get_recent(0).unwrap().metric, None);
        Ok(())
    }

    #[test]
    fn missing_file_is_empty_history() -> Result<()> {
        let dir = tempdir()?;
        assert!(SearchHistory::load(&dir.path().join("nope.json"), 5)?.is_empty());
        Ok(())
    }

    #[test]
    fn summary_formats_timestamp_and_count() {
        let mut e = entry("bolt", 8);
        e.timestamp = Local
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 0)
            .single()
            .unwrap();
        assert_eq!(e.summary(Language::En), "03/05 14:07 - Query: bolt (8 results)");
        assert_eq!(e.summary(Language::Zh), "03/05 14:07 - 查询: bolt (8结果)");
    }
}
