//! CLI subcommand implementations.

pub mod check;
pub mod report;
pub mod target;
pub mod track;
pub mod util;
