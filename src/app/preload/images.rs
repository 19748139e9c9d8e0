//! Cover image warm-up
//!
//! Image loading is fire-and-forget: a failed prefetch is logged and never
//! affects readiness.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::app::models::Article;
use crate::errors::{FetchError, FetchResult};

/// Something that can load an image ahead of time
#[async_trait]
pub trait ImagePrefetcher: Send + Sync {
    async fn prefetch(&self, url: &str) -> FetchResult<()>;
}

/// Prefetcher that downloads images into an in-memory cache
#[derive(Debug, Default)]
pub struct HttpImagePrefetcher {
    client: Client,
    cache: Mutex<HashMap<String, Arc<Vec<u8>>>>,
}

impl HttpImagePrefetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Bytes of a previously warmed image
    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(url).cloned())
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ImagePrefetcher for HttpImagePrefetcher {
    async fn prefetch(&self, url: &str) -> FetchResult<()> {
        if self.get(url).is_some() {
            return Ok(());
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(FetchError::NotAnImage {
                url: url.to_string(),
                content_type,
            });
        }

        let bytes = response.bytes().await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), Arc::new(bytes.to_vec()));
        }
        Ok(())
    }
}

/// Distinct cover URLs from `articles` then `trending`, first seen first,
/// at most `max`
pub fn collect_cover_urls(articles: &[Article], trending: &[Article], max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .chain(trending)
        .filter_map(Article::cover_url)
        .filter(|url| seen.insert(url.to_string()))
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Outcome of one warm-up pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmOutcome {
    pub warmed: usize,
    pub failed: usize,
}

/// Prefetch every URL concurrently; failures are logged and counted
pub async fn warm_images(prefetcher: &dyn ImagePrefetcher, urls: &[String]) -> WarmOutcome {
    let results = join_all(urls.iter().map(|url| async move {
        let result = prefetcher.prefetch(url).await;
        if let Err(e) = &result {
            tracing::debug!("Image warm-up failed for {}: {}", url, e);
        }
        result.is_ok()
    }))
    .await;

    let warmed = results.iter().filter(|ok| **ok).count();
    WarmOutcome {
        warmed,
        failed: results.len() - warmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::article_row;
    use serde_json::json;

    fn articles(count: usize) -> Vec<Article> {
        (0..count)
            .map(|i| {
                serde_json::from_value(article_row(
                    &format!("c{}", i),
                    "news",
                    "2024-01-01T00:00:00Z",
                ))
                .unwrap()
            })
            .collect()
    }

    struct FlakyPrefetcher;

    #[async_trait]
    impl ImagePrefetcher for FlakyPrefetcher {
        async fn prefetch(&self, url: &str) -> FetchResult<()> {
            if url.contains("c1.") {
                Err(FetchError::Status {
                    status: 404,
                    body: String::new(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_collect_is_bounded() {
        let urls = collect_cover_urls(&articles(20), &[], 8);
        assert_eq!(urls.len(), 8);
        assert_eq!(urls[0], "https://cdn.test/c0.jpg");
    }

    #[test]
    fn test_collect_deduplicates_and_skips_missing_covers() {
        let mut list = articles(3);
        list[1].cover_image = Some("  ".to_string());
        let trending = vec![list[0].clone(), list[2].clone()];

        let urls = collect_cover_urls(&list, &trending, 8);
        assert_eq!(
            urls,
            vec!["https://cdn.test/c0.jpg", "https://cdn.test/c2.jpg"]
        );
    }

    #[tokio::test]
    async fn test_warm_counts_failures() {
        let urls = collect_cover_urls(&articles(3), &[], 8);
        let outcome = warm_images(&FlakyPrefetcher, &urls).await;
        assert_eq!(outcome, WarmOutcome { warmed: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_http_prefetch_rejects_non_images() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cover.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "an image"})))
            .mount(&server)
            .await;

        let prefetcher = HttpImagePrefetcher::new(Client::new());
        let cover = format!("{}/cover.jpg", server.uri());
        prefetcher.prefetch(&cover).await.unwrap();
        assert_eq!(prefetcher.get(&cover).map(|b| b.len()), Some(3));

        let page = format!("{}/page.html", server.uri());
        assert!(matches!(
            prefetcher.prefetch(&page).await,
            Err(FetchError::NotAnImage { .. })
        ));
        assert_eq!(prefetcher.cached_count(), 1);
    }
}
