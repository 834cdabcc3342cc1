use anyhow::{Context, Result};
use statefiscal::{config::Settings, dashboard, state::AppState};
use std::env;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(log_level.parse().unwrap_or(Level::INFO.into()));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) settings & shared state ──────────────────────────────────
    let settings = Settings::from_env();
    let bind = settings.bind;
    info!(url = %settings.source.url, ttl = ?settings.cache_ttl, "source configured");
    let state = AppState::new(settings);

    // ─── 3) eager load: a broken source stops startup ────────────────
    let table = state
        .table()
        .await
        .context("initial load of the revenue table")?;
    info!(
        records = table.len(),
        states = table.states().len(),
        categories = table.tax_categories().len(),
        quarters = table.fiscal_quarters().len(),
        "table ready"
    );

    // ─── 4) serve ────────────────────────────────────────────────────
    info!("Server starting on {}", bind);
    info!("Dashboard: http://localhost:{}/", bind.port());
    warp::serve(dashboard::routes(state)).run(bind).await;

    Ok(())
}
