//! websearch - search the web and stream an AI-written answer.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    websearch::cli::run().await
}
