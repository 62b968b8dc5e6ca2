use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Manage a roster of Marvel characters stored in a JSON document.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // https://github.com/clap-rs/clap/issues/3857#issuecomment-1239419407
    #[clap(flatten)]
    pub serve: ServeArgs,
}

/// Actions
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the characters REST API
    Serve(ServeArgs),

    /// Interactive terminal client for a running API
    Ui(UiArgs),

    /// Load character documents and validate them. Echoes the collections back.
    Check {
        /// Path or glob pattern of documents to check
        pattern: String,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// JSON document holding the characters
    #[arg(long, env = "CHARACTERS_FILE", default_value = "characters.json")]
    pub data_file: PathBuf,

    /// Address to listen on
    #[arg(long, env = "CHARACTERS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CHARACTERS_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Create an empty document if the data file does not exist
    #[arg(long, env = "CHARACTERS_INIT")]
    pub init: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UiArgs {
    /// Base URL of the characters API
    #[arg(long, env = "CHARACTERS_API_URL", default_value = "http://localhost:3000")]
    pub base_url: String,
}

impl ServeArgs {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
