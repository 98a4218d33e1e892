mod allocator;
mod app;
mod chunk;
mod config;
mod envelope;
mod error;
mod file;
mod header;
mod keys;
mod processor;
mod types;
mod ui;
mod worker;

use crate::app::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    App::init()?.execute().await
}
