mod character;
mod cli;
mod client;
mod http;
mod roster;
mod storage;
mod terminal;
mod ui;

use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tokio::io::BufReader;

use cli::{Cli, Command, ServeArgs, UiArgs};
use client::HttpClient;
use roster::Roster;
use storage::{Document, JsonStore};

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let store = JsonStore::open(args.data_file.clone());
    if args.init && store.create_if_missing()? {
        log::info!("Initialized {:?}", store.path());
    }
    log::info!("Serving characters from {:?}", store.path());

    let app = http::router(Arc::new(Roster::new(store)));
    let address = args.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("error binding {}", address))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_ui(args: UiArgs) -> anyhow::Result<()> {
    let client = HttpClient::new(args.base_url);
    log::info!("Using characters API at {}", client.base_url());
    let mut app = ui::App::new(client);
    let mut console =
        terminal::Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.run(&mut app).await?;
    Ok(())
}

fn check(pattern: &str) -> anyhow::Result<()> {
    let mut checked = 0;
    let mut failures = Vec::new();
    let entries =
        glob::glob(pattern).with_context(|| format!("error figuring out path {}", pattern))?;
    for entry in entries {
        let path = entry.with_context(|| "error handling file")?;
        checked += 1;
        match Document::from_json_file(&path) {
            Ok(document) => {
                log::info!("{:?}: {} characters", path, document.characters.len());
                println!("{}", document.to_pretty_json()?);
            }
            Err(e) => {
                log::error!("{}", e);
                failures.push(e);
            }
        }
    }

    if checked == 0 {
        return Err(anyhow!("No documents match {}", pattern));
    }
    if !failures.is_empty() {
        return Err(anyhow!("{} of {} documents are invalid", failures.len(), checked));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        None => serve(cli.serve).await,
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Ui(args)) => run_ui(args).await,
        Some(Command::Check { pattern }) => check(&pattern),
    }
}
