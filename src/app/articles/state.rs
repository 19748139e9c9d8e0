//! Reactive result containers returned by the hooks
//!
//! A [`QueryHandle`] owns the task that fills it. Readers take a
//! [`QueryState`] snapshot or wait for the next change; dropping the handle
//! aborts the task, so an unmounted consumer never keeps a request alive.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{FetchError, FetchResult};

/// `{data, loading}` plus the error that emptied `data`, if any
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<Arc<FetchError>>,
}

impl<T: Default> QueryState<T> {
    /// Empty data, request pending
    pub fn pending() -> Self {
        Self {
            data: T::default(),
            loading: true,
            error: None,
        }
    }

    /// Settled with data
    pub fn ready(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: None,
        }
    }

    /// Settled with an empty result because the request failed
    pub fn failed(error: FetchError) -> Self {
        Self {
            data: T::default(),
            loading: false,
            error: Some(Arc::new(error)),
        }
    }

    pub fn from_result(result: FetchResult<T>) -> Self {
        match result {
            Ok(data) => Self::ready(data),
            Err(e) => Self::failed(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Handle to one hook's result
#[derive(Debug)]
pub struct QueryHandle<T> {
    rx: watch::Receiver<QueryState<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T> QueryHandle<T>
where
    T: Default + Clone + Send + Sync + 'static,
{
    /// Start in the loading state and settle with the outcome of `fetch`
    pub(crate) fn spawn<F>(label: &'static str, fetch: F) -> Self
    where
        F: Future<Output = FetchResult<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(QueryState::pending());
        let task = tokio::spawn(async move {
            let result = fetch.await;
            if let Err(e) = &result {
                tracing::warn!("{} query failed: {}", label, e);
            }
            // Receivers may all be gone; nothing to report then
            let _ = tx.send(QueryState::from_result(result));
        });
        Self {
            rx,
            task: Some(task),
        }
    }

    /// Already settled, no task
    pub(crate) fn resolved(data: T) -> Self {
        let (_tx, rx) = watch::channel(QueryState::ready(data));
        Self { rx, task: None }
    }

    /// Current state
    pub fn state(&self) -> QueryState<T> {
        self.rx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.rx.borrow().loading
    }

    /// Wait for the next update. Returns `false` once no more updates can come.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Wait until `loading` is false and return that state
    pub async fn settled(&mut self) -> QueryState<T> {
        let settled = match self.rx.wait_for(|state| !state.loading).await {
            Ok(state) => Some((*state).clone()),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| self.state())
    }

    /// Whether this handle still has a fetch running
    pub fn is_fetching(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
