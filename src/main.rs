use chrono::Local;
use momo_scrap::{config, info_time, process, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = config::load(&config_path)?;

    process::run(config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
