//! Command-line interface module.

mod commands;
mod extract;
mod migrate;

pub use commands::{Cli, Commands};
pub use extract::handle_extract;
pub use migrate::handle_migrate;
