//! Article query shapes against the remote data client
//!
//! One async operation per query shape. All of them return `FetchResult` so
//! callers can tell an empty result from a failed request. The pure helpers
//! at the bottom are shared with the preload cache path.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::config::FeedConfig;
use crate::app::client::{Filter, RemoteDataClient, RowQuery};
use crate::app::models::{Article, ArticleStatus, RankedId};
use crate::constants::service;
use crate::errors::{FetchError, FetchResult};

/// Data access for published articles
#[derive(Clone)]
pub struct ArticleRepository {
    client: Arc<dyn RemoteDataClient>,
    config: FeedConfig,
}

impl std::fmt::Debug for ArticleRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleRepository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArticleRepository {
    pub fn new(client: Arc<dyn RemoteDataClient>, config: FeedConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn RemoteDataClient> {
        &self.client
    }

    /// Published articles with the category joined in
    fn published_query() -> RowQuery {
        RowQuery::on(service::ARTICLES_TABLE)
            .select(service::ARTICLE_SELECT)
            .eq("status", ArticleStatus::Published)
    }

    /// All published articles, newest first
    pub async fn published(&self) -> FetchResult<Vec<Article>> {
        let query = Self::published_query().order("published_at", true);
        decode_rows(self.client.query_rows(&query).await?)
    }

    /// The published article with `slug`, if any
    pub async fn by_slug(&self, slug: &str) -> FetchResult<Option<Article>> {
        let query = Self::published_query().eq("slug", slug).single();
        match self.client.query_single(&query).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Featured articles, newest first, at most `featured_limit`
    pub async fn featured(&self) -> FetchResult<Vec<Article>> {
        let query = Self::published_query()
            .eq("featured", true)
            .order("published_at", true)
            .limit(self.config.featured_limit);
        decode_rows(self.client.query_rows(&query).await?)
    }

    /// Published articles in category `slug`, newest first
    ///
    /// The embedded-relation filter alone keeps rows whose join did not
    /// match (with a null category), so the response goes through the same
    /// predicate the preload cache uses.
    pub async fn by_category(&self, slug: &str) -> FetchResult<Vec<Article>> {
        let query = Self::published_query()
            .eq("category.slug", slug)
            .order("published_at", true);
        let articles = decode_rows(self.client.query_rows(&query).await?)?;
        Ok(filter_by_category(&articles, slug))
    }

    /// Ranked trending ids, best first
    pub async fn trending_ids(&self) -> FetchResult<Vec<String>> {
        let value = self
            .client
            .call_procedure(
                service::TRENDING_PROCEDURE,
                json!({ "max_results": self.config.trending_limit }),
            )
            .await?;

        let rows: Vec<RankedId> = match value {
            Value::Null => Vec::new(),
            Value::Array(_) => serde_json::from_value(value)?,
            other => {
                return Err(FetchError::Procedure {
                    name: service::TRENDING_PROCEDURE.to_string(),
                    reason: format!("expected a list of ids, got {}", other),
                })
            }
        };
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    /// Full records for `ids`, in the order of `ids`
    pub async fn hydrate(&self, ids: &[String]) -> FetchResult<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = Self::published_query().in_list("id", ids.iter().cloned());
        let records = decode_rows(self.client.query_rows(&query).await?)?;
        Ok(hydrate_in_rank_order(ids, records))
    }

    /// Trending articles in ranking order
    pub async fn trending(&self) -> FetchResult<Vec<Article>> {
        let ids = self.trending_ids().await?;
        if ids.is_empty() {
            tracing::debug!("Trending ranking is empty");
            return Ok(Vec::new());
        }
        self.hydrate(&ids).await
    }

    /// Published articles whose title, excerpt or subtitle contains `text`
    pub async fn search(&self, text: &str) -> FetchResult<Vec<Article>> {
        let pattern = format!("%{}%", text);
        let query = Self::published_query()
            .any_of(vec![
                Filter::ilike("title", pattern.as_str()),
                Filter::ilike("excerpt", pattern.as_str()),
                Filter::ilike("subtitle", pattern.as_str()),
            ])
            .order("published_at", true)
            .limit(self.config.search_limit);
        decode_rows(self.client.query_rows(&query).await?)
    }

    /// Record one view of an article; never retried
    pub async fn increment_view_count(&self, article_id: &str) -> FetchResult<()> {
        self.client
            .call_procedure_once(
                service::VIEW_COUNT_PROCEDURE,
                json!({ "article_id": article_id }),
            )
            .await?;
        Ok(())
    }
}

/// Decode article rows, skipping rows that do not match the projection
///
/// Fails only when every row is malformed.
fn decode_rows(rows: Vec<Value>) -> FetchResult<Vec<Article>> {
    let mut articles = Vec::with_capacity(rows.len());
    let mut first_error = None;
    for row in rows {
        match serde_json::from_value::<Article>(row) {
            Ok(article) => articles.push(article),
            Err(e) => {
                tracing::warn!("Skipping malformed article row: {}", e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if articles.is_empty() => Err(FetchError::Decode(e)),
        _ => Ok(articles),
    }
}

/// Map each ranked id to its record, dropping ids without one
///
/// The order of the result is the order of `ids`, whatever order `records`
/// came back in. A repeated id is kept at its first position only.
pub fn hydrate_in_rank_order(ids: &[String], records: Vec<Article>) -> Vec<Article> {
    let mut by_id: HashMap<String, Article> = records
        .into_iter()
        .map(|article| (article.id.clone(), article))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// Articles whose category slug is `slug`, order preserved
pub fn filter_by_category<'a, I>(articles: I, slug: &str) -> Vec<Article>
where
    I: IntoIterator<Item = &'a Article>,
{
    articles
        .into_iter()
        .filter(|article| article.category.slug() == Some(slug))
        .cloned()
        .collect()
}

/// Up to `count` articles other than `exclude_id`, order preserved
pub fn more_stories(articles: &[Article], exclude_id: &str, count: usize) -> Vec<Article> {
    articles
        .iter()
        .filter(|article| article.id != exclude_id)
        .take(count)
        .cloned()
        .collect()
}
