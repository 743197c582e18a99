use tokio::net::TcpListener;
use tracing::info;
use trips::config::AppConfig;
use trips::db::{connect_with_retry, migrate};
use trips::error::AppError;
use trips::routes::create_router;
use trips::services::memory::MemoryStore;
use trips::services::sqlite::SqliteStore;
use trips::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AppConfig::from_env()?;
    let state = if config.database_url.starts_with("memory:") {
        info!("using the in-memory document store, contents are lost on exit");
        AppState::new(MemoryStore::new())
    } else {
        let db = connect_with_retry(&config).await?;
        migrate(&db).await?;
        let store = SqliteStore::new(db, config.project_id.clone());
        info!("serving documents for project {}", store.project());
        AppState::new(store)
    };

    let app = create_router(state);

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trips=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
