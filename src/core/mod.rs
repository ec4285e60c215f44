pub mod blacklist;
pub mod engine;
pub mod extract;
pub mod profiles;
pub mod report;
pub mod watermark;

pub use crate::domain::model::{EmailAddress, SlackTs, SyncReport};
pub use crate::domain::ports::{BlacklistTable, ChatHistory, Pipeline, Storage, UserDirectory};
pub use crate::utils::error::Result;
