pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::BlacklistSettings;

#[cfg(feature = "cli")]
pub use config::args::{AliasArgs, BlacklistArgs, CheckArgs};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use core::{blacklist::BlacklistPipeline, engine::SyncEngine};
pub use utils::error::{Result, SyncError};
