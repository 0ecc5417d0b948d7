use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    soulreplay_cli::cli::run().await
}
