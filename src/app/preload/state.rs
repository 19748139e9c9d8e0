//! Shared preload state
//!
//! A [`PreloadHandle`] is the injectable replacement for an ambient context:
//! hooks receive one at construction and read a [`PreloadSnapshot`] from it.
//! The state moves `Idle → Loading → Ready` once; the cache is written a
//! single time, on the transition to `Ready`, and never changes afterwards.

use std::sync::Arc;

use tokio::sync::watch;

use crate::app::models::Article;
use crate::errors::PreloadError;

/// Phase of the one-shot bootstrap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadPhase {
    Idle,
    Loading,
    Ready,
}

/// Datasets warmed by the bootstrap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadCache {
    /// All published articles, newest first
    pub articles: Vec<Article>,
    /// Trending articles in ranking order
    pub trending: Vec<Article>,
}

#[derive(Debug)]
struct PreloadStatus {
    phase: PreloadPhase,
    cache: Arc<PreloadCache>,
}

/// What a hook sees when it consults the preload
#[derive(Debug, Clone)]
pub struct PreloadSnapshot {
    pub cache: Arc<PreloadCache>,
    pub is_ready: bool,
}

impl PreloadSnapshot {
    pub fn articles(&self) -> &[Article] {
        &self.cache.articles
    }

    pub fn trending(&self) -> &[Article] {
        &self.cache.trending
    }

    /// Preloaded published articles, when ready and non-empty
    pub fn ready_articles(&self) -> Option<&[Article]> {
        (self.is_ready && !self.cache.articles.is_empty()).then(|| self.articles())
    }

    /// Preloaded trending articles, when ready and non-empty
    pub fn ready_trending(&self) -> Option<&[Article]> {
        (self.is_ready && !self.cache.trending.is_empty()).then(|| self.trending())
    }
}

/// Cloneable handle to the shared preload state
#[derive(Debug, Clone)]
pub struct PreloadHandle {
    tx: Arc<watch::Sender<PreloadStatus>>,
}

impl Default for PreloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PreloadHandle {
    /// A fresh handle in the `Idle` phase
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PreloadStatus {
            phase: PreloadPhase::Idle,
            cache: Arc::new(PreloadCache::default()),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Handle for consumers running without a bootstrap. Nothing will ever
    /// publish to it, so hooks always fetch directly.
    pub fn detached() -> Self {
        Self::new()
    }

    pub fn phase(&self) -> PreloadPhase {
        self.tx.borrow().phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == PreloadPhase::Ready
    }

    pub fn snapshot(&self) -> PreloadSnapshot {
        let status = self.tx.borrow();
        PreloadSnapshot {
            cache: Arc::clone(&status.cache),
            is_ready: status.phase == PreloadPhase::Ready,
        }
    }

    /// Move from `Idle` to `Loading`
    ///
    /// # Errors
    ///
    /// Returns `PreloadError::AlreadyStarted` if the bootstrap already ran
    pub fn begin(&self) -> Result<(), PreloadError> {
        let started = self.tx.send_if_modified(|status| {
            if status.phase == PreloadPhase::Idle {
                status.phase = PreloadPhase::Loading;
                true
            } else {
                false
            }
        });
        if started {
            Ok(())
        } else {
            Err(PreloadError::AlreadyStarted)
        }
    }

    /// Store the cache and move to `Ready`. Only the first call has effect.
    ///
    /// # Errors
    ///
    /// Returns `PreloadError::AlreadyPublished` on every call after the first
    pub fn publish(&self, cache: PreloadCache) -> Result<(), PreloadError> {
        let mut cache = Some(cache);
        let published = self.tx.send_if_modified(|status| {
            if status.phase == PreloadPhase::Ready {
                return false;
            }
            status.phase = PreloadPhase::Ready;
            status.cache = Arc::new(cache.take().unwrap_or_default());
            true
        });

        if published {
            let snapshot = self.snapshot();
            tracing::info!(
                "Preload ready: {} articles, {} trending",
                snapshot.articles().len(),
                snapshot.trending().len()
            );
            Ok(())
        } else {
            tracing::warn!("Ignoring second preload publish");
            Err(PreloadError::AlreadyPublished)
        }
    }

    /// Wait until the cache is ready. Never returns for a detached handle.
    pub async fn wait_ready(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|status| status.phase == PreloadPhase::Ready).await;
    }
}
