//! Command handlers for the newsdesk CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the data-access layer. Every article read goes through
//! [`ArticleHooks`], fed by the preload bootstrap unless `--no-preload`.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::app::articles::more_stories;
use crate::app::{
    Article, ArticleHooks, ClientConfig, HttpImagePrefetcher, PreloadBootstrap,
    PreloadConfig, PreloadHandle, PreloadReport, RemoteDataClient, RestClient, SearchConfig,
    SnapshotClient, SplashGate,
};
use crate::cli::{Commands, ConfigAction, ConfigArgs, GlobalArgs, MediaAction, MediaArgs};
use crate::config::AppConfig;
use crate::constants::{feed, service};
use crate::errors::{AppError, Result};

/// Clients and settings shared by the command handlers
pub struct Session {
    pub hooks: ArticleHooks,
    /// Present only when talking to the hosted service
    pub rest: Option<RestClient>,
    client_config: ClientConfig,
    preload_config: PreloadConfig,
    search_config: SearchConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("hooks", &self.hooks)
            .field("online", &self.rest.is_some())
            .field("preload_config", &self.preload_config)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build the data client from the snapshot flag or the service settings
    pub async fn open(global: &GlobalArgs, config: &AppConfig) -> Result<Self> {
        let (client_config, feed_config, mut preload_config, search_config) =
            config.to_runtime_config();
        if global.no_preload {
            preload_config = preload_config.with_enabled(false);
        }

        let snapshot = global
            .snapshot
            .clone()
            .or_else(|| config.service.snapshot.clone());

        let (client, rest): (Arc<dyn RemoteDataClient>, Option<RestClient>) = match snapshot {
            Some(path) => {
                info!("Reading from snapshot {}", path.display());
                (Arc::new(SnapshotClient::from_file(&path).await?), None)
            }
            None => {
                let endpoint = config.service_endpoint()?;
                info!("Using service at {}", endpoint.base_url);
                let rest = RestClient::new(endpoint, &client_config)?;
                (Arc::new(rest.clone()), Some(rest))
            }
        };

        Ok(Self {
            hooks: ArticleHooks::new(client, feed_config),
            rest,
            client_config,
            preload_config,
            search_config,
        })
    }

    /// Run the bootstrap and attach its result to the hooks
    ///
    /// With `splash` set, the spinner stays up for at least the configured
    /// minimum display time.
    pub async fn preload(&mut self, splash: bool, quiet: bool) -> Result<PreloadReport> {
        let handle = PreloadHandle::new();
        let prefetcher = Arc::new(HttpImagePrefetcher::new(
            self.client_config.build_http_client()?,
        ));
        let bootstrap = PreloadBootstrap::new(
            self.hooks.repository().clone(),
            prefetcher,
            self.preload_config.clone(),
        );

        let min_display = if splash {
            self.preload_config.splash_min_display
        } else {
            Duration::ZERO
        };
        let gate = SplashGate::start(min_display);
        let spinner = splash_spinner(quiet);

        let task = bootstrap.spawn(handle.clone());
        gate.wait(&handle).await;
        spinner.finish_and_clear();

        let report = task
            .await
            .map_err(|e| AppError::generic(format!("Preload task failed: {}", e)))??;

        for error in &report.errors {
            warn!("Preload incomplete: {}", error);
        }
        self.hooks = self.hooks.clone().with_preload(handle);
        Ok(report)
    }

    fn storage(&self) -> Result<crate::app::StorageClient> {
        self.rest
            .as_ref()
            .map(|rest| rest.storage(service::MEDIA_BUCKET))
            .ok_or_else(|| AppError::generic("Media commands need the hosted service, not a snapshot"))
    }
}

fn splash_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.red} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
    }
    spinner.set_message("Loading the latest stories...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Handle the article read commands
pub async fn handle_read(global: &GlobalArgs, config: &AppConfig, command: Commands) -> Result<()> {
    let mut session = Session::open(global, config).await?;
    if session.preload_config.enabled {
        session.preload(false, global.quiet).await?;
    } else {
        debug!("Preload disabled; reading straight from the service");
    }
    let hooks = &session.hooks;

    match command {
        Commands::Latest { limit } => {
            let state = hooks.use_articles().settled().await;
            let shown: Vec<Article> = state.data.into_iter().take(limit).collect();
            print_list("Latest", &shown, state.error.is_some());
        }
        Commands::Featured => {
            let state = hooks.use_featured().settled().await;
            print_list("Featured", &state.data, state.error.is_some());
        }
        Commands::Category { slug } => {
            let state = hooks.use_articles_by_category(&slug).settled().await;
            print_list(&format!("Category '{}'", slug), &state.data, state.error.is_some());
        }
        Commands::Trending => {
            let state = hooks.use_trending().settled().await;
            print_list("Trending", &state.data, state.error.is_some());
        }
        Commands::Article { slug } => {
            let mut view = hooks.view_article(&slug);
            let state = view.article().settled().await;
            match state.data {
                Some(article) => {
                    print_article(&article);
                    let all = hooks.use_articles().settled().await;
                    let more = more_stories(&all.data, &article.id, feed::MORE_STORIES);
                    if !more.is_empty() {
                        println!();
                        print_list("More stories", &more, false);
                    }
                    if !view.finish_recording(feed::VIEW_RECORD_WAIT).await {
                        debug!("View of {} was not recorded", article.id);
                    }
                }
                None if state.error.is_some() => {
                    return Err(AppError::generic(format!("Could not load '{}'", slug)))
                }
                None => println!("No published article with slug '{}'", slug),
            }
        }
        Commands::Search { text } => {
            let mut search = hooks.use_search(session.search_config.clone());
            if !search.config().accepts(&text) {
                println!(
                    "Type at least {} characters to search",
                    search.config().min_query_chars
                );
                return Ok(());
            }
            search.set_query(&text);
            let state = search.settled().await;
            print_list(&format!("Results for '{}'", text), &state.data, state.error.is_some());
        }
        other => {
            return Err(AppError::generic(format!("Not a read command: {:?}", other)));
        }
    }
    Ok(())
}

/// Handle the preload command
pub async fn handle_preload(global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let mut session = Session::open(global, config).await?;
    let report = session.preload(true, global.quiet).await?;

    println!("📰 Preload Summary:");
    println!("  Articles: {}", report.articles);
    println!("  Trending: {}", report.trending);
    println!(
        "  Images warmed: {} ({} failed)",
        report.images_warmed, report.images_failed
    );
    println!("  Time: {:?}", report.elapsed);
    if !report.is_complete() {
        println!("\nErrors:");
        for error in &report.errors {
            println!("  • {}", error);
        }
    }
    Ok(())
}

/// Handle the media bucket commands
pub async fn handle_media(global: &GlobalArgs, config: &AppConfig, args: MediaArgs) -> Result<()> {
    let session = Session::open(global, config).await?;
    let storage = session.storage()?;

    match args.action {
        MediaAction::List => {
            let objects = storage.list().await?;
            if objects.is_empty() {
                println!("Bucket '{}' is empty", storage.bucket());
            }
            for object in objects {
                println!(
                    "  {}  {}  {}",
                    object.created_at.as_deref().unwrap_or("-"),
                    object.name,
                    object.url
                );
            }
        }
        MediaAction::Upload { file } => {
            let name = storage.upload_file(&file).await?;
            println!("✅ Uploaded {} as {}", file.display(), name);
            println!("   {}", storage.public_url(&name)?);
        }
        MediaAction::Remove { names } => {
            storage.remove(&names).await?;
            println!("🗑️  Removed {} object(s)", names.len());
        }
    }
    Ok(())
}

/// Handle the configuration commands
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(path) => path,
                None => AppConfig::get_default_config_path()?,
            };
            AppConfig::write_default(&path, force).await?;
            println!("📁 Created configuration file:");
            println!("   {}", path.display());
        }
        ConfigAction::Show => {
            let config = AppConfig::load(global.config.clone()).await?;
            print!("{}", config.to_display_toml()?);
        }
    }
    Ok(())
}

fn print_list(heading: &str, articles: &[Article], failed: bool) {
    println!("{}", heading);
    println!("{}", "=".repeat(heading.chars().count()));
    if articles.is_empty() {
        if failed {
            println!("Could not reach the service; nothing to show.");
        } else {
            println!("No articles found.");
        }
        return;
    }
    for (i, article) in articles.iter().enumerate() {
        println!("{}", format_line(i + 1, article));
    }
}

fn format_line(position: usize, article: &Article) -> String {
    format!(
        "{:>3}. {}  [{}]  {}  ({})",
        position,
        article.title,
        article.category.name(),
        article.sort_key().format("%Y-%m-%d"),
        article.slug
    )
}

fn print_article(article: &Article) {
    println!("{}", article.title);
    if let Some(subtitle) = &article.subtitle {
        println!("{}", subtitle);
    }
    println!(
        "{} · {} · {}",
        article.category.name(),
        article.author_name.as_deref().unwrap_or("Staff"),
        article.sort_key().format("%B %-d, %Y")
    );
    if let Some(cover) = article.cover_url() {
        println!("Cover: {}", cover);
    }
    if let Some(excerpt) = &article.excerpt {
        println!();
        println!("{}", excerpt);
    }
}
