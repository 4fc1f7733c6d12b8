//! Search session: the state a front end keeps between retrievals.
//!
//! A [`Session`] owns the current query class, the latest labelled result set,
//! the page cursor and the search history. Front ends pass it around
//! explicitly instead of keeping this state in globals.

pub mod history;
pub mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use core_types::config::{AppConfig, MAX_RESULTS_LIMIT};
use core_types::{Language, RetrievalHit, model_class};
use retrieval::{CandidateSource, RetrieveOptions, load_matrix, retrieve_with};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use history::{HistoryEntry, SearchHistory};
pub use report::{render_text_report, save_text_report};

/// Number of results shown per page.
pub const PAGE_SIZE: usize = 8;

/// Everything needed to run (or replay) one retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// `.npy` file with the query model's features.
    pub feature_file: PathBuf,
    /// Database `.npy` file or directory of per-model `.npy` files.
    pub candidate_input: PathBuf,
    pub is_single_file: bool,
    /// Directory of model files whose sorted listing maps candidate rows.
    pub artifact_dir: PathBuf,
    /// Query model file, used to derive the query class.
    pub model_file: Option<PathBuf>,
}

impl SearchQuery {
    /// Class of the query: from the model file when known, else from the
    /// feature file (both follow the `<class>_<id>` naming).
    pub fn class(&self) -> String {
        model_class(self.model_file.as_deref().unwrap_or(&self.feature_file))
    }
}

/// A hit with its model class and whether that class matches the query's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledHit {
    #[serde(flatten)]
    pub hit: RetrievalHit,
    pub class: String,
    pub matches: bool,
}

impl LabelledHit {
    pub fn label(hit: RetrievalHit, query_class: Option<&str>) -> Self {
        let class = model_class(&hit.path);
        let matches = query_class == Some(class.as_str());
        Self {
            hit,
            class,
            matches,
        }
    }
}

/// Run a query against the engine without touching any session state.
pub fn run_query(query: &SearchQuery, options: &RetrieveOptions) -> Result<Vec<RetrievalHit>> {
    let features = load_matrix(&query.feature_file)
        .with_context(|| format!("loading query features {}", query.feature_file.display()))?;
    let source = CandidateSource::from_path(&query.candidate_input, query.is_single_file);
    retrieve_with(features.view(), source, &query.artifact_dir, options).with_context(|| {
        format!(
            "retrieving against {} (models in {})",
            query.candidate_input.display(),
            query.artifact_dir.display()
        )
    })
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

#[derive(Debug)]
pub struct Session {
    language: Language,
    result_limit: usize,
    options: RetrieveOptions,
    query_class: Option<String>,
    last_query: Option<SearchQuery>,
    results: Vec<LabelledHit>,
    page: usize,
    history: SearchHistory,
    history_path: Option<PathBuf>,
}

impl Session {
    /// Session with an in-memory history only.
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            language: cfg.report.language,
            result_limit: cfg.retrieval.max_results.clamp(1, MAX_RESULTS_LIMIT),
            options: RetrieveOptions::from(&cfg.retrieval),
            query_class: None,
            last_query: None,
            results: Vec::new(),
            page: 0,
            history: SearchHistory::new(cfg.history.max_items),
            history_path: None,
        }
    }

    /// Session whose history is loaded from, and saved to, the configured file.
    ///
    /// An unreadable history file is moved aside to `<name>.bak` and the
    /// session starts with an empty history.
    pub fn open(cfg: &AppConfig) -> Self {
        let path = cfg.history_path();
        let history = match SearchHistory::load(&path, cfg.history.max_items) {
            Ok(history) => {
                debug!(path = %path.display(), entries = history.len(), "loaded search history");
                history
            }
            Err(err) => {
                let backup = backup_path(&path);
                warn!(
                    error = %format!("{err:#}"),
                    path = %path.display(),
                    backup = %backup.display(),
                    "discarding unreadable search history"
                );
                if let Err(err) = std::fs::rename(&path, &backup) {
                    warn!(error = %err, "failed to back up search history");
                }
                SearchHistory::new(cfg.history.max_items)
            }
        };
        Self {
            history,
            history_path: Some(path),
            ..Self::new(cfg)
        }
    }

    pub const fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub const fn result_limit(&self) -> usize {
        self.result_limit
    }

    /// Set how many results a search keeps (clamped to `1..=100`).
    pub fn set_result_limit(&mut self, limit: usize) {
        self.result_limit = limit.clamp(1, MAX_RESULTS_LIMIT);
    }

    pub const fn options(&self) -> &RetrieveOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RetrieveOptions {
        &mut self.options
    }

    pub fn query_class(&self) -> Option<&str> {
        self.query_class.as_deref()
    }

    pub const fn last_query(&self) -> Option<&SearchQuery> {
        self.last_query.as_ref()
    }

    pub fn results(&self) -> &[LabelledHit] {
        &self.results
    }

    pub const fn history(&self) -> &SearchHistory {
        &self.history
    }

    /// Run a retrieval and make its (truncated) result the current one.
    pub fn search(&mut self, query: SearchQuery) -> Result<&[LabelledHit]> {
        let hits = run_query(&query, &self.options)?;
        Ok(self.apply(query, hits))
    }

    /// Like [`Session::search`] but runs the retrieval on tokio's blocking pool.
    pub async fn search_async(&mut self, query: SearchQuery) -> Result<&[LabelledHit]> {
        let options = self.options.clone();
        let job = query.clone();
        let hits = tokio::task::spawn_blocking(move || run_query(&job, &options))
            .await
            .context("retrieval worker failed")??;
        Ok(self.apply(query, hits))
    }

    /// Re-run history entry `index` (0 = most recent) with the metric it
    /// originally used. Entries that predate metric recording use the
    /// session's current metric.
    pub fn replay(&mut self, index: usize) -> Result<&[LabelledHit]> {
        let entry = self
            .history
            .get_recent(index)
            .cloned()
            .with_context(|| format!("no history entry at position {index}"))?;
        if let Some(metric) = entry.metric {
            self.options.metric = metric;
        }
        info!(index, class = ?entry.class, metric = %self.options.metric, "replaying search");
        self.search(entry.query)
    }

    /// Drop the current result set and query class. History is kept.
    pub fn clear(&mut self) {
        self.query_class = None;
        self.last_query = None;
        self.results.clear();
        self.page = 0;
    }

    fn apply(&mut self, query: SearchQuery, mut hits: Vec<RetrievalHit>) -> &[LabelledHit] {
        let total = hits.len();
        hits.truncate(self.result_limit);

        let class = query.class();
        self.query_class = Some(class.clone());
        self.results = hits
            .into_iter()
            .map(|hit| LabelledHit::label(hit, Some(class.as_str())))
            .collect();
        self.page = 0;

        let matched = self.results.iter().filter(|r| r.matches).count();
        info!(
            class = %class,
            candidates = total,
            kept = self.results.len(),
            matched,
            "search completed"
        );

        self.history.push(HistoryEntry::new(
            query.clone(),
            Some(class),
            self.options.metric,
            self.results.len(),
        ));
        if let Some(path) = &self.history_path {
            if let Err(err) = self.history.save(path) {
                warn!(error = %err, path = %path.display(), "failed to persist search history");
            }
        }
        self.last_query = Some(query);
        &self.results
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.results.len().div_ceil(PAGE_SIZE)
    }

    /// Results on the current page.
    pub fn current_page_results(&self) -> &[LabelledHit] {
        let start = (self.page * PAGE_SIZE).min(self.results.len());
        let end = (start + PAGE_SIZE).min(self.results.len());
        &self.results[start..end]
    }

    /// Jump to `page`, returning whether it exists.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < self.page_count() {
            self.page = page;
            true
        } else {
            false
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.page.checked_sub(1) {
            Some(page) => self.go_to_page(page),
            None => false,
        }
    }

    /// Text report of the whole current result set.
    pub fn text_report(&self) -> String {
        render_text_report(self.query_class(), &self.results, self.language)
    }

    pub fn save_report(&self, path: &Path) -> Result<()> {
        save_text_report(path, self.query_class(), &self.results, self.language)?;
        info!(path = %path.display(), "results saved");
        Ok(())
    }
}
