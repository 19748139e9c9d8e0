//! One-shot preload bootstrap
//!
//! Fetches all published articles and the hydrated trending list
//! concurrently, warms a bounded set of cover images, then publishes the
//! cache. The handle always ends `Ready`, whatever failed along the way.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::PreloadConfig;
use super::images::{collect_cover_urls, warm_images, ImagePrefetcher};
use super::state::{PreloadCache, PreloadHandle};
use crate::app::articles::ArticleRepository;
use crate::errors::PreloadError;

/// What a bootstrap run achieved
#[derive(Debug, Clone, Default)]
pub struct PreloadReport {
    pub articles: usize,
    pub trending: usize,
    pub images_warmed: usize,
    pub images_failed: usize,
    /// Fetch failures that left a dataset empty
    pub errors: Vec<String>,
    pub elapsed: Duration,
}

impl PreloadReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the preload against a repository
pub struct PreloadBootstrap {
    repo: ArticleRepository,
    prefetcher: Arc<dyn ImagePrefetcher>,
    config: PreloadConfig,
}

impl std::fmt::Debug for PreloadBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadBootstrap")
            .field("repo", &self.repo)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PreloadBootstrap {
    pub fn new(
        repo: ArticleRepository,
        prefetcher: Arc<dyn ImagePrefetcher>,
        config: PreloadConfig,
    ) -> Self {
        Self {
            repo,
            prefetcher,
            config,
        }
    }

    /// Run once against `handle`
    ///
    /// # Errors
    ///
    /// Returns `PreloadError` only if `handle` was already started or
    /// published; fetch failures are reported in [`PreloadReport::errors`].
    pub async fn run(&self, handle: &PreloadHandle) -> Result<PreloadReport, PreloadError> {
        handle.begin()?;
        let start = Instant::now();
        tracing::info!("Preloading articles and trending");

        let (articles, trending) = tokio::join!(self.repo.published(), self.repo.trending());

        let mut report = PreloadReport::default();
        let articles = articles.unwrap_or_else(|e| {
            tracing::error!("Preload of articles failed: {}", e);
            report.errors.push(format!("articles: {}", e));
            Vec::new()
        });
        let trending = trending.unwrap_or_else(|e| {
            tracing::error!("Preload of trending failed: {}", e);
            report.errors.push(format!("trending: {}", e));
            Vec::new()
        });

        let urls = collect_cover_urls(&articles, &trending, self.config.image_warm_limit);
        let outcome = warm_images(self.prefetcher.as_ref(), &urls).await;
        tracing::debug!(
            "Warmed {} of {} cover images",
            outcome.warmed,
            urls.len()
        );

        report.articles = articles.len();
        report.trending = trending.len();
        report.images_warmed = outcome.warmed;
        report.images_failed = outcome.failed;

        handle.publish(PreloadCache { articles, trending })?;
        report.elapsed = start.elapsed();
        Ok(report)
    }

    /// Run on a background task, returning immediately
    pub fn spawn(
        self,
        handle: PreloadHandle,
    ) -> tokio::task::JoinHandle<Result<PreloadReport, PreloadError>> {
        tokio::spawn(async move { self.run(&handle).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::articles::FeedConfig;
    use crate::app::client::SnapshotClient;
    use crate::app::test_support::{article_row, ids_of, sample_client};
    use crate::constants::service;
    use crate::errors::FetchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPrefetcher {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImagePrefetcher for RecordingPrefetcher {
        async fn prefetch(&self, url: &str) -> FetchResult<()> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn bootstrap(
        client: SnapshotClient,
    ) -> (Arc<SnapshotClient>, Arc<RecordingPrefetcher>, PreloadBootstrap) {
        let client = Arc::new(client);
        let prefetcher = Arc::new(RecordingPrefetcher::default());
        let repo = ArticleRepository::new(client.clone(), FeedConfig::default());
        let bootstrap = PreloadBootstrap::new(repo, prefetcher.clone(), PreloadConfig::default());
        (client, prefetcher, bootstrap)
    }

    #[tokio::test]
    async fn test_ready_with_both_datasets() {
        let (_, _, bootstrap) = bootstrap(sample_client().with_trending(["a4", "a2"]));
        let handle = PreloadHandle::new();

        let report = bootstrap.run(&handle).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.articles, 7);

        let snapshot = handle.snapshot();
        assert!(snapshot.is_ready);
        assert_eq!(snapshot.articles()[0].id, "a6");
        assert_eq!(ids_of(snapshot.trending()), vec!["a4", "a2"]);
    }

    #[tokio::test]
    async fn test_trending_failure_still_becomes_ready() {
        let (client, _, bootstrap) = bootstrap(sample_client().with_trending(["a1"]));
        client.fail_on(service::TRENDING_PROCEDURE);
        let handle = PreloadHandle::new();

        let report = bootstrap.run(&handle).await.unwrap();
        assert_eq!(report.errors.len(), 1);

        let snapshot = handle.snapshot();
        assert!(snapshot.is_ready);
        assert!(!snapshot.articles().is_empty());
        assert!(snapshot.trending().is_empty());
    }

    #[tokio::test]
    async fn test_total_failure_still_becomes_ready() {
        let (client, prefetcher, bootstrap) = bootstrap(sample_client().with_trending(["a1"]));
        client.fail_on(service::ARTICLES_TABLE);
        client.fail_on(service::TRENDING_PROCEDURE);
        let handle = PreloadHandle::new();

        let report = bootstrap.run(&handle).await.unwrap();
        assert_eq!(report.errors.len(), 2);
        assert!(handle.is_ready());
        assert!(prefetcher.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_warm_up_is_bounded() {
        let rows = (0..20)
            .map(|i| article_row(&format!("n{:02}", i), "news", "2024-03-01T00:00:00Z"))
            .collect();
        let (_, prefetcher, bootstrap) = bootstrap(SnapshotClient::new().with_articles(rows));

        let report = bootstrap.run(&PreloadHandle::new()).await.unwrap();
        assert_eq!(report.images_warmed, 8);

        let urls = prefetcher.urls.lock().unwrap().clone();
        assert_eq!(urls.len(), 8);
        let distinct: std::collections::HashSet<_> = urls.iter().collect();
        assert_eq!(distinct.len(), 8);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected() {
        let (_, _, bootstrap) = bootstrap(sample_client());
        let handle = PreloadHandle::new();
        bootstrap.run(&handle).await.unwrap();
        assert!(matches!(
            bootstrap.run(&handle).await,
            Err(PreloadError::AlreadyStarted)
        ));
    }
}
