use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;

use access_admin::{
    auth::{
        TokenIssuer,
        providers::{AuthProvider, LocalAuthProvider},
    },
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    routes::app,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.logging.rust_log);

    let db_cfg = cfg
        .database
        .as_ref()
        .context("database section is required (APP_DATABASE__URL)")?;
    let auth_cfg = cfg
        .auth
        .clone()
        .context("auth section is required (APP_AUTH__JWT_SECRET, APP_AUTH__ADMIN_EMAIL, APP_AUTH__ADMIN_PASSWORD)")?;

    let db = connection::connect(db_cfg).await?;
    let services = ServiceContext::new(&db);

    let provider = LocalAuthProvider::new(services.admin(), TokenIssuer::from_config(&auth_cfg));
    provider.seed_admin(&auth_cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;
    let state = AppState::new(db, Arc::new(provider));
    let app = app(Arc::clone(&state));

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
