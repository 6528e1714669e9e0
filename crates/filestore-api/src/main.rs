use filestore_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    let (_state, router) = filestore_api::setup::initialize_app(config.clone()).await?;

    filestore_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
