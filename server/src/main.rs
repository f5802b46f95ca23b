use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    server::init_tracing(&config)?;

    server::start_server(config).await?;

    Ok(())
}
