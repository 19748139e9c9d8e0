//! Command-line interface components
//!
//! This module contains CLI-specific code for newsdesk: argument parsing
//! and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, MediaAction, MediaArgs,
};
pub use commands::{handle_config, handle_media, handle_preload, handle_read, Session};
