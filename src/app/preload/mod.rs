//! Startup preload of the article datasets
//!
//! A bootstrap runs once per process, fills the shared cache and flips the
//! handle to ready. Hooks consult the handle before touching the network.

pub mod bootstrap;
pub mod config;
pub mod images;
pub mod splash;
pub mod state;

pub use bootstrap::{PreloadBootstrap, PreloadReport};
pub use config::PreloadConfig;
pub use images::{collect_cover_urls, warm_images, HttpImagePrefetcher, ImagePrefetcher};
pub use splash::SplashGate;
pub use state::{PreloadCache, PreloadHandle, PreloadPhase, PreloadSnapshot};
