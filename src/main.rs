mod app;
mod catalog;
mod cli;
mod config;
mod engine;
mod migrate;
mod model;
mod reminder;
mod render;
mod server;
mod storage;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    app::run(cli::Cli::parse()).await
}
