#[cfg(feature = "http_api")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use irrigation_tool::{AppConfig, http_api};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let addr: SocketAddr = config.http_addr.parse()?;

    // The weather and geocoding clients block, so they are built before the
    // async runtime starts.
    let planner = config.build_planner()?;
    let mut state = http_api::AppState::new(planner);
    if let Some(geocoder) = config.build_geocoder()? {
        state = state.with_geocoder(geocoder);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(http_api::serve(addr, state))?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
