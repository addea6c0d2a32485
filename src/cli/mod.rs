pub mod commands;
pub mod models;
pub mod progress;
pub mod run;
pub mod validate;

pub use commands::{Cli, Commands};

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);
