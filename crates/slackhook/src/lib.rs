pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod hook;
pub mod http;
pub mod payload;

pub use connection::{ChainedConnections, Connection, ConnectionSource, EnvConnections};
pub use error::HookError;
pub use hook::{resolve_token, SlackWebhookHook, WebhookOptions};
pub use payload::SlackMessage;
