use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    minify_cli::main_entry().await
}
