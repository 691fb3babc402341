use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gp_moderation_cli::cli::app::run().await
}
