//! medsearch HTTP server binary.

use server::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;
    server::start_server(config).await?;

    Ok(())
}
