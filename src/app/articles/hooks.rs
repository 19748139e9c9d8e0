//! The hook surface consumed by the presentation layer
//!
//! Each `use_*` call starts one query and returns a [`QueryHandle`] that
//! settles with `{data, loading: false}`. Preload-aware hooks answer from
//! the injected [`PreloadHandle`] when it is ready and holds data, and only
//! fall back to the network otherwise.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::config::FeedConfig;
use super::repository::{filter_by_category, ArticleRepository};
use super::state::QueryHandle;
use crate::app::client::RemoteDataClient;
use crate::app::models::Article;
use crate::app::preload::PreloadHandle;
use crate::app::search::{SearchConfig, SearchController};

/// Factory for article queries
#[derive(Debug, Clone)]
pub struct ArticleHooks {
    repo: ArticleRepository,
    preload: PreloadHandle,
}

impl ArticleHooks {
    /// Hooks without a preload; every query goes to the network
    pub fn new(client: Arc<dyn RemoteDataClient>, config: FeedConfig) -> Self {
        Self {
            repo: ArticleRepository::new(client, config),
            preload: PreloadHandle::detached(),
        }
    }

    /// Consult `preload` before touching the network
    pub fn with_preload(mut self, preload: PreloadHandle) -> Self {
        self.preload = preload;
        self
    }

    pub fn repository(&self) -> &ArticleRepository {
        &self.repo
    }

    pub fn preload(&self) -> &PreloadHandle {
        &self.preload
    }

    /// All published articles, newest first
    pub fn use_articles(&self) -> QueryHandle<Vec<Article>> {
        if let Some(articles) = self.preload.snapshot().ready_articles() {
            tracing::debug!("Serving {} articles from preload", articles.len());
            return QueryHandle::resolved(articles.to_vec());
        }
        let repo = self.repo.clone();
        QueryHandle::spawn("articles", async move { repo.published().await })
    }

    /// The published article with `slug`
    pub fn use_article(&self, slug: &str) -> QueryHandle<Option<Article>> {
        let repo = self.repo.clone();
        let slug = slug.to_string();
        QueryHandle::spawn("article", async move { repo.by_slug(&slug).await })
    }

    /// Featured articles, newest first
    pub fn use_featured(&self) -> QueryHandle<Vec<Article>> {
        let repo = self.repo.clone();
        QueryHandle::spawn("featured", async move { repo.featured().await })
    }

    /// Published articles in category `slug`, newest first
    pub fn use_articles_by_category(&self, slug: &str) -> QueryHandle<Vec<Article>> {
        if let Some(articles) = self.preload.snapshot().ready_articles() {
            return QueryHandle::resolved(filter_by_category(articles, slug));
        }
        let repo = self.repo.clone();
        let slug = slug.to_string();
        QueryHandle::spawn("category", async move { repo.by_category(&slug).await })
    }

    /// Trending articles in ranking order
    pub fn use_trending(&self) -> QueryHandle<Vec<Article>> {
        if let Some(trending) = self.preload.snapshot().ready_trending() {
            return QueryHandle::resolved(trending.to_vec());
        }
        let repo = self.repo.clone();
        QueryHandle::spawn("trending", async move { repo.trending().await })
    }

    /// Debounced text search over published articles
    pub fn use_search(&self, config: SearchConfig) -> SearchController {
        SearchController::new(self.repo.clone(), config)
    }

    /// Load the article with `slug` and record a view for it
    ///
    /// The increment starts once the article resolves and runs on its own
    /// task: dropping the view does not cancel it, and its failure is only
    /// logged. [`ArticleView::finish_recording`] waits for it.
    pub fn view_article(&self, slug: &str) -> ArticleView {
        let repo = self.repo.clone();
        let slug = slug.to_string();
        let (view_tx, view_rx) = oneshot::channel();
        let article = QueryHandle::spawn("article", async move {
            let article = repo.by_slug(&slug).await?;
            if let Some(article) = &article {
                // The view may have been dropped already
                let _ = view_tx.send(record_view(repo, article.id.clone()));
            }
            Ok(article)
        });
        ArticleView {
            article,
            recording: view_rx,
        }
    }
}

/// An article query plus the view count increment it triggers
#[derive(Debug)]
pub struct ArticleView {
    article: QueryHandle<Option<Article>>,
    recording: oneshot::Receiver<JoinHandle<bool>>,
}

impl ArticleView {
    /// The article query
    pub fn article(&mut self) -> &mut QueryHandle<Option<Article>> {
        &mut self.article
    }

    /// Wait up to `limit` for the view increment to finish
    ///
    /// Returns `true` only when the service recorded the view. No article,
    /// a failed increment or an elapsed `limit` all give `false`.
    pub async fn finish_recording(self, limit: Duration) -> bool {
        let Self { article, recording } = self;
        let outcome = tokio::time::timeout(limit, async move {
            match recording.await {
                Ok(task) => task.await.unwrap_or(false),
                Err(_) => false,
            }
        })
        .await;
        drop(article);

        outcome.unwrap_or_else(|_| {
            tracing::warn!("View count still pending after {}ms", limit.as_millis());
            false
        })
    }
}

/// View count increment on its own task; resolves to whether it was recorded
pub fn record_view(repo: ArticleRepository, article_id: String) -> JoinHandle<bool> {
    tokio::spawn(async move {
        match repo.increment_view_count(&article_id).await {
            Ok(()) => {
                tracing::debug!("Recorded view for {}", article_id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to record view for {}: {}", article_id, e);
                false
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::SnapshotClient;
    use crate::app::preload::PreloadCache;
    use crate::app::test_support::{article_row, ids_of, sample_client};
    use crate::constants::service;
    use serde_json::json;

    fn hooks(client: SnapshotClient) -> (Arc<SnapshotClient>, ArticleHooks) {
        let client = Arc::new(client);
        let hooks = ArticleHooks::new(client.clone(), FeedConfig::default());
        (client, hooks)
    }

    /// A ready preload filled from the same client the hooks use
    async fn preloaded(hooks: &ArticleHooks) -> PreloadHandle {
        let preload = PreloadHandle::new();
        let repo = hooks.repository();
        preload
            .publish(PreloadCache {
                articles: repo.published().await.unwrap(),
                trending: repo.trending().await.unwrap(),
            })
            .unwrap();
        preload
    }

    #[tokio::test]
    async fn test_category_cache_matches_network() {
        let (_, direct) = hooks(sample_client());
        let preload = preloaded(&direct).await;
        let cached = direct.clone().with_preload(preload);

        for slug in ["culture", "film", "news", "missing"] {
            let from_network = direct.use_articles_by_category(slug).settled().await;
            let from_cache = cached.use_articles_by_category(slug).state();
            assert!(!from_cache.loading);
            assert_eq!(from_network.data, from_cache.data, "category {}", slug);
        }

        let culture = cached.use_articles_by_category("culture").state();
        assert_eq!(ids_of(&culture.data), vec!["a6", "a3", "a1"]);
    }

    #[tokio::test]
    async fn test_category_cache_matches_network_for_string_categories() {
        let mut legacy = article_row("l1", "film", "2024-03-02T00:00:00Z");
        legacy["category"] = json!("Film");
        let rows = vec![article_row("f1", "film", "2024-03-01T00:00:00Z"), legacy];
        let (_, direct) = hooks(SnapshotClient::new().with_articles(rows));
        let preload = preloaded(&direct).await;
        let cached = direct.clone().with_preload(preload);

        let from_network = direct.use_articles_by_category("film").settled().await;
        let from_cache = cached.use_articles_by_category("film").state();
        assert_eq!(ids_of(&from_network.data), vec!["l1", "f1"]);
        assert_eq!(from_network.data, from_cache.data);
    }

    #[tokio::test]
    async fn test_ready_preload_skips_network() {
        let (client, hooks) = hooks(sample_client().with_trending(["a2", "a5"]));
        let preload = preloaded(&hooks).await;
        let calls_before = client.calls().len();
        let hooks = hooks.with_preload(preload);

        let articles = hooks.use_articles();
        let trending = hooks.use_trending();
        let category = hooks.use_articles_by_category("film");
        assert!(!articles.is_loading());
        assert_eq!(ids_of(&trending.state().data), vec!["a2", "a5"]);
        assert_eq!(ids_of(&category.state().data), vec!["a5", "a2"]);
        assert_eq!(client.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_empty_preload_falls_back_to_network() {
        let (client, hooks) = hooks(sample_client().with_trending(["a3"]));
        let preload = PreloadHandle::new();
        preload
            .publish(PreloadCache {
                articles: hooks.repository().published().await.unwrap(),
                trending: Vec::new(),
            })
            .unwrap();
        let hooks = hooks.with_preload(preload);
        let calls_before = client.calls().len();

        let mut trending = hooks.use_trending();
        assert!(trending.is_loading());
        assert_eq!(ids_of(&trending.settled().await.data), vec!["a3"]);
        assert!(client.calls().len() > calls_before);
    }

    #[tokio::test]
    async fn test_not_ready_preload_fetches() {
        let (client, hooks) = hooks(sample_client());
        let hooks = hooks.with_preload(PreloadHandle::new());
        let state = hooks.use_articles().settled().await;
        assert_eq!(state.data.len(), 7);
        assert_eq!(client.row_query_count(), 1);
    }

    #[tokio::test]
    async fn test_featured_returns_five_of_seven() {
        let rows = (0..7)
            .map(|i| {
                let mut row = article_row(
                    &format!("f{}", i),
                    "news",
                    &format!("2024-02-0{}T00:00:00Z", i + 1),
                );
                row["featured"] = json!(true);
                row
            })
            .collect();
        let (_, hooks) = hooks(SnapshotClient::new().with_articles(rows));
        let state = hooks.use_featured().settled().await;
        assert_eq!(state.data.len(), 5);
        assert!(state.data.iter().all(|a| a.featured));
    }

    #[tokio::test]
    async fn test_failure_is_empty_not_loading() {
        let (client, hooks) = hooks(sample_client());
        client.fail_on(service::ARTICLES_TABLE);
        let state = hooks.use_articles().settled().await;
        assert!(state.data.is_empty());
        assert!(!state.loading);
        assert!(state.is_failed());

        let single = hooks.use_article("story-a1").settled().await;
        assert!(single.data.is_none());
        assert!(single.is_failed());
    }

    #[tokio::test]
    async fn test_view_article_records_view() {
        let (client, hooks) = hooks(sample_client());
        let mut view = hooks.view_article("story-a4");
        let state = view.article().settled().await;
        assert_eq!(state.data.map(|a| a.id), Some("a4".to_string()));

        assert!(view.finish_recording(Duration::from_secs(1)).await);
        assert_eq!(client.view_count("a4"), 1);
    }

    #[tokio::test]
    async fn test_finish_recording_without_waiting_for_article() {
        let (client, hooks) = hooks(sample_client());
        let view = hooks.view_article("story-a2");
        assert!(view.finish_recording(Duration::from_secs(1)).await);
        assert_eq!(client.view_count("a2"), 1);
    }

    #[tokio::test]
    async fn test_view_failure_does_not_fail_article() {
        let (client, hooks) = hooks(sample_client());
        client.fail_on(service::VIEW_COUNT_PROCEDURE);
        let mut view = hooks.view_article("story-a4");
        let state = view.article().settled().await;
        assert!(state.data.is_some());
        assert!(!state.is_failed());
        assert!(!view.finish_recording(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_missing_article_records_nothing() {
        let (client, hooks) = hooks(sample_client());
        let mut view = hooks.view_article("nope");
        let state = view.article().settled().await;
        assert!(state.data.is_none());
        assert!(!state.is_failed());
        assert!(!view.finish_recording(Duration::from_secs(1)).await);
        assert!(client
            .calls()
            .iter()
            .all(|call| matches!(call, crate::app::client::SnapshotCall::Rows(_))));
    }
}
