use dhaba_edge::{Config, Server, init_logger, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    init_logger(Some(&config.log_level), Some(&config.work_dir));

    print_banner();
    tracing::info!(
        environment = %config.environment,
        timezone = %config.timezone,
        cutoff = %config.business_day_cutoff,
        "Dhaba edge server starting"
    );

    let server = Server::new(config);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(e);
    }
    Ok(())
}
