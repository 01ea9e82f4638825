use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    qkbrew::cli::run().await
}
