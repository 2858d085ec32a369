//! Command-line arguments for the vidchat binary.

use clap::{Args, Parser, Subcommand};

/// Chat with a YouTube video from the terminal
#[derive(Parser, Debug)]
#[command(name = "vidchat")]
#[command(about = "Submit a YouTube video for processing, follow its progress, and chat about it")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Backend base URL
    #[arg(long, global = true, env = "VIDCHAT_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Milliseconds between status polls
    #[arg(long, global = true, env = "VIDCHAT_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a YouTube URL and create a chat for it
    Submit {
        /// YouTube video URL
        url: String,

        /// Keep polling and show progress until processing finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Follow the processing status of an existing chat
    Status {
        /// Chat identifier returned by `submit`
        chat_id: String,
    },
    /// Send a message to a chat and stream the reply to stdout
    Send {
        chat_id: String,
        message: String,
    },
}
