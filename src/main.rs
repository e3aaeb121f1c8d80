use moodseed_api::{
    api::{create_router, AppState},
    config::Config,
    services::{catalog::Catalog, ranking::RankingConfig},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let ranking = RankingConfig::default();
    ranking.validate()?;

    let catalog = Catalog::load(&config.catalog_path)?;
    if catalog.is_empty() {
        tracing::warn!("Catalog is empty; every search will return no candidates");
    }

    let state = AppState::with_ranking(catalog, ranking);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
