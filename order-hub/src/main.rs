use order_hub::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    let config = setup_environment();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Order hub starting...");

    // 2. State (work dir, database, catalog seed)
    let state = ServerState::initialize(&config)?;

    // 3. Serve until Ctrl+C
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
