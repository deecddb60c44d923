use std::path::Path;
use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config;
use crate::errors::SiteguardError;
use tracing::info;

pub async fn handle_serve(args: ServeArgs) -> Result<(), SiteguardError> {
    let mut config = config::load_config(args.config.as_deref().map(Path::new)).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = api::create_app_state(config)?;
    let app = api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| SiteguardError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
