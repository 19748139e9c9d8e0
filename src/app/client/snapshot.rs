//! In-memory data client over a JSON snapshot
//!
//! Evaluates [`RowQuery`] filters, ordering and limits against rows held in
//! memory, and answers the trending and view-count procedures locally. Used
//! for offline runs against an exported dataset and as the fake service in
//! tests. Every dispatched call is recorded.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};

use super::query::{lookup, RowQuery};
use super::RemoteDataClient;
use crate::app::models::CategoryRef;
use crate::constants::service;
use crate::errors::{FetchError, FetchResult};

/// A call observed by the snapshot client
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotCall {
    Rows(RowQuery),
    Procedure { name: String, args: Value },
}

#[derive(Debug, Default)]
struct SnapshotState {
    calls: Vec<SnapshotCall>,
    views: HashMap<String, u64>,
    failing: HashSet<String>,
}

/// Data client answering from an in-memory dataset
#[derive(Debug, Default)]
pub struct SnapshotClient {
    tables: HashMap<String, Vec<Value>>,
    trending: Vec<String>,
    state: Mutex<SnapshotState>,
}

impl SnapshotClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of the articles table
    ///
    /// Older rows that store the category as a bare name get the embedded
    /// record shape, so `category.slug` filters see them.
    pub fn with_articles(mut self, rows: Vec<Value>) -> Self {
        let rows = rows.into_iter().map(embed_legacy_category).collect();
        self.tables
            .insert(service::ARTICLES_TABLE.to_string(), rows);
        self
    }

    /// Ranked trending ids, best first
    pub fn with_trending<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trending = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Build from `{"articles": [...], "trending": [...]}`. Trending entries
    /// may be bare ids or `{"id": ...}` objects.
    pub fn from_value(value: Value) -> FetchResult<Self> {
        let articles = match value.get("articles") {
            Some(Value::Array(rows)) => rows.clone(),
            Some(_) => {
                return Err(FetchError::Snapshot {
                    reason: "\"articles\" must be an array".to_string(),
                })
            }
            None => Vec::new(),
        };

        let trending = value
            .get("trending")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match entry {
                        Value::String(id) => Some(id.clone()),
                        other => other.get("id").and_then(Value::as_str).map(String::from),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Self::new().with_articles(articles).with_trending(trending))
    }

    /// Load a snapshot file
    pub async fn from_file(path: &Path) -> FetchResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FetchError::Snapshot {
                reason: format!("Failed to read {}: {}", path.display(), e),
            })?;
        let value: Value = serde_json::from_str(&content)?;
        let client = Self::from_value(value)?;
        tracing::info!(
            "Loaded snapshot {} ({} articles)",
            path.display(),
            client.tables.get(service::ARTICLES_TABLE).map_or(0, Vec::len)
        );
        Ok(client)
    }

    /// Make every call against `target` (a table or procedure name) fail
    pub fn fail_on(&self, target: impl Into<String>) {
        self.lock().failing.insert(target.into());
    }

    /// All calls dispatched so far
    pub fn calls(&self) -> Vec<SnapshotCall> {
        self.lock().calls.clone()
    }

    /// Number of row queries dispatched so far
    pub fn row_query_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, SnapshotCall::Rows(_)))
            .count()
    }

    /// Views recorded for an article
    pub fn view_count(&self, article_id: &str) -> u64 {
        self.lock().views.get(article_id).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SnapshotState> {
        // A panic while holding the lock cannot leave the state half-written
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: SnapshotCall, target: &str) -> FetchResult<()> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(target) {
            return Err(FetchError::Snapshot {
                reason: format!("{} is unavailable", target),
            });
        }
        Ok(())
    }

    fn evaluate(&self, query: &RowQuery) -> FetchResult<Vec<Value>> {
        let rows = self
            .tables
            .get(&query.table)
            .ok_or_else(|| FetchError::Snapshot {
                reason: format!("Unknown table {}", query.table),
            })?;

        let mut matched: Vec<Value> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();

        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                compare_nulls_last(
                    lookup(a, &order.column),
                    lookup(b, &order.column),
                    order.descending,
                )
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}

/// Rewrite a string category as the record article decoding derives from it
fn embed_legacy_category(mut row: Value) -> Value {
    let embedded = match row.get("category") {
        Some(Value::String(name)) if name.trim().is_empty() => Value::Null,
        Some(Value::String(name)) => {
            serde_json::to_value(CategoryRef::from_name(name)).unwrap_or(Value::Null)
        }
        _ => return row,
    };
    row["category"] = embedded;
    row
}

fn compare_nulls_last(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_values(a, b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            match (
                DateTime::<FixedOffset>::parse_from_rfc3339(a),
                DateTime::<FixedOffset>::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl RemoteDataClient for SnapshotClient {
    async fn query_rows(&self, query: &RowQuery) -> FetchResult<Vec<Value>> {
        self.record(SnapshotCall::Rows(query.clone()), &query.table)?;
        self.evaluate(query)
    }

    async fn query_single(&self, query: &RowQuery) -> FetchResult<Option<Value>> {
        self.record(SnapshotCall::Rows(query.clone()), &query.table)?;
        let mut rows = self.evaluate(query)?;
        // Same contract as the REST layer: anything but exactly one row is "none"
        if rows.len() == 1 {
            Ok(rows.pop())
        } else {
            Ok(None)
        }
    }

    async fn call_procedure(&self, name: &str, args: Value) -> FetchResult<Value> {
        self.record(
            SnapshotCall::Procedure {
                name: name.to_string(),
                args: args.clone(),
            },
            name,
        )?;

        match name {
            service::TRENDING_PROCEDURE => {
                let max = args
                    .get("max_results")
                    .and_then(Value::as_u64)
                    .map_or(self.trending.len(), |n| n as usize);
                let rows: Vec<Value> = self
                    .trending
                    .iter()
                    .take(max)
                    .map(|id| json!({ "id": id }))
                    .collect();
                Ok(Value::Array(rows))
            }
            service::VIEW_COUNT_PROCEDURE => {
                let id = args
                    .get("article_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FetchError::Procedure {
                        name: name.to_string(),
                        reason: "missing article_id".to_string(),
                    })?;
                *self.lock().views.entry(id.to_string()).or_default() += 1;
                Ok(Value::Null)
            }
            other => Err(FetchError::Procedure {
                name: other.to_string(),
                reason: "unknown procedure".to_string(),
            }),
        }
    }
}
