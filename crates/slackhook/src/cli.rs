use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use crate::hook::WebhookOptions;

/// slackhook – post messages to Slack incoming webhooks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate verbose output (-v, -vv, etc.)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Post a message to a webhook
    Send(SendArgs),
    /// Print build information
    Version {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct SendArgs {
    /// Connection holding the webhook token in its password field
    #[arg(long, value_name = "NAME")]
    pub http_conn_id: Option<String>,

    /// Webhook token, or the full webhook URL when no connection is given
    #[arg(long, value_name = "TOKEN")]
    pub webhook_token: Option<String>,

    /// Message text
    #[arg(short, long, default_value = "")]
    pub message: String,

    /// Attachments as a JSON array
    #[arg(long, value_name = "JSON", value_parser = parse_json_list)]
    pub attachments: Option<JsonList>,

    /// Blocks as a JSON array
    #[arg(long, value_name = "JSON", value_parser = parse_json_list)]
    pub blocks: Option<JsonList>,

    /// Channel to post to, overriding the webhook default
    #[arg(long)]
    pub channel: Option<String>,

    /// Username to post as
    #[arg(long)]
    pub username: Option<String>,

    /// Emoji used as the poster's icon
    #[arg(long)]
    pub icon_emoji: Option<String>,

    /// Image URL used as the poster's icon
    #[arg(long)]
    pub icon_url: Option<String>,

    /// Link channel and user names found in the message
    #[arg(long)]
    pub link_names: bool,

    /// Proxy for the HTTPS webhook call
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Resolve the token and print the payload without sending it
    #[arg(long)]
    pub dry_run: bool,
}

/// A JSON array given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonList(pub Vec<Value>);

fn parse_json_list(raw: &str) -> Result<JsonList, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Ok(JsonList(items)),
        Ok(_) => Err("expected a JSON array".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

impl SendArgs {
    pub fn into_options(self) -> WebhookOptions {
        WebhookOptions {
            http_conn_id: self.http_conn_id,
            webhook_token: self.webhook_token,
            message: self.message,
            attachments: self.attachments.map(|l| l.0),
            blocks: self.blocks.map(|l| l.0),
            channel: self.channel,
            username: self.username,
            icon_emoji: self.icon_emoji,
            icon_url: self.icon_url,
            link_names: self.link_names,
            proxy: self.proxy,
        }
    }
}
