//! Debounced article search
//!
//! [`SearchController`] holds the state behind a search box. Each change
//! restarts a quiet-period timer; only when the timer expires is a request
//! dispatched. A dispatched request is never cancelled, but its result is
//! applied only if no newer query arrived in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app::articles::{ArticleRepository, QueryState};
use crate::app::models::Article;

pub mod config;

pub use config::SearchConfig;

/// Search results as seen by the search box
pub type SearchState = QueryState<Vec<Article>>;

/// Trailing-edge debounced search over published articles
#[derive(Debug)]
pub struct SearchController {
    repo: ArticleRepository,
    config: SearchConfig,
    tx: Arc<watch::Sender<SearchState>>,
    rx: watch::Receiver<SearchState>,
    /// Token of the latest query; results carrying an older token are dropped
    sequence: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SearchController {
    pub fn new(repo: ArticleRepository, config: SearchConfig) -> Self {
        let (tx, rx) = watch::channel(SearchState::ready(Vec::new()));
        Self {
            repo,
            config,
            tx: Arc::new(tx),
            rx,
            sequence: Arc::new(AtomicU64::new(0)),
            timer: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Current results
    pub fn state(&self) -> SearchState {
        self.rx.borrow().clone()
    }

    /// Wait for the next update. Returns `false` once no more updates can come.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until no search is pending and return the results
    pub async fn settled(&mut self) -> SearchState {
        let settled = match self.rx.wait_for(|state| !state.loading).await {
            Ok(state) => Some((*state).clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.state())
    }

    /// Replace the query text
    ///
    /// Text shorter than the minimum clears the results at once. Anything
    /// longer marks the state loading and schedules a dispatch after the
    /// quiet period, replacing any dispatch still waiting.
    pub fn set_query(&self, text: &str) {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        // Taken under the lock so the newest token owns the surviving timer
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        if !self.config.accepts(text) {
            self.tx.send_replace(SearchState::ready(Vec::new()));
            return;
        }

        self.tx.send_modify(|state| state.loading = true);

        let repo = self.repo.clone();
        let tx = Arc::clone(&self.tx);
        let sequence = Arc::clone(&self.sequence);
        let debounce = self.config.debounce;
        let text = text.to_string();

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // Detached so a later keystroke aborting the timer leaves it running
            tokio::spawn(async move {
                tracing::debug!("Dispatching search for {:?}", text);
                let result = repo.search(&text).await;
                if let Err(e) = &result {
                    tracing::warn!("Search for {:?} failed: {}", text, e);
                }
                // Checked under the channel lock so a newer query's loading
                // state can never be overwritten by this result
                let applied = tx.send_if_modified(|state| {
                    if sequence.load(Ordering::SeqCst) != token {
                        return false;
                    }
                    *state = SearchState::from_result(result);
                    true
                });
                if !applied {
                    tracing::debug!("Discarding stale results for {:?}", text);
                }
            });
        }));
    }

    /// Drop any pending dispatch and clear the results
    pub fn clear(&self) {
        self.set_query("");
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(pending) = timer.take() {
                pending.abort();
            }
        }
    }
}
