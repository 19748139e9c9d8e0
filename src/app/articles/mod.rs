//! Article data access
//!
//! - `repository`: one async operation per query shape, returning `FetchResult`
//! - `hooks`: the `use_*` surface, preload-aware where it pays off
//! - `state`: the `{data, loading}` containers the hooks hand out
//! - `config`: query limits

pub mod config;
pub mod hooks;
pub mod repository;
pub mod state;

pub use config::FeedConfig;
pub use hooks::{record_view, ArticleHooks, ArticleView};
pub use repository::{filter_by_category, hydrate_in_rank_order, more_stories, ArticleRepository};
pub use state::{QueryHandle, QueryState};
