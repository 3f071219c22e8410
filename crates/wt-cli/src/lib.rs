//! Work time tracker CLI library.
//!
//! This crate provides the CLI interface for the work time tracker.

mod calendar;
mod cli;
pub mod commands;
mod config;

pub use calendar::holiday_provider;
pub use cli::{Cli, Commands};
pub use config::Config;
