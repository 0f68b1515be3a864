use vitrine_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (media host, repositories, routes)
    let (_state, router) = vitrine_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    vitrine_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
