use std::sync::Arc;

use unillm::server::build_router;
use unillm::util::{env_bind_addr, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let state = Arc::new(AppState::default());
    let services = state.providers.services().collect::<Vec<_>>().join(", ");
    tracing::info!(%services, "provider registry initialized");

    let app = build_router(state);
    let addr = env_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("unillm listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
