use planet_guestbook::{app, db, logging, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env().map_err(|err| err.0)?;
    let db_pool = db::connect(&config.database_url).await.map_err(|err| err.0)?;

    let bind_addr = config.bind_addr;
    tracing::info!("backend data in {}", config.data_dir.display());

    let app_state = AppState::new(db_pool, config).map_err(|err| err.0)?;
    if !app_state.mirror.is_enabled() {
        tracing::info!("remote mirror disabled");
    }
    let app = app(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on http://{bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
