// Adapters layer: concrete implementations of the domain ports for Slack and Genesys Cloud.

pub mod genesys;
pub mod http;
pub mod slack;
