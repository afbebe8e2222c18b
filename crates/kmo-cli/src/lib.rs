mod args;
mod commands;
mod handlers;
mod logging;
mod options;
pub mod types;

pub use args::{Cli, Commands, ConfigCommand, OptionArgs};
pub use commands::run;
