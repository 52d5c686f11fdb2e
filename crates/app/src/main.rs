use std::{net::SocketAddr, sync::Arc};

use engine::BroadcastNotifier;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "roomledger={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let server = settings.server;
    tasks.spawn(async move {
        tracing::info!("Found server settings...");
        let db = match parse_database(&server.database).await {
            Ok(db) => db,
            Err(err) => {
                tracing::error!("failed to initialize database: {err}");
                return;
            }
        };

        let events = BroadcastNotifier::new(server.event_capacity);
        let engine = match engine::Engine::builder()
            .database(db.clone())
            .notifier(Arc::new(events.clone()))
            .build()
            .await
        {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!("failed to build engine from database: {err}");
                return;
            }
        };

        let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
        let addr: SocketAddr = match format!("{}:{}", bind, server.port).parse() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::error!("invalid bind address {bind}: {err}");
                return;
            }
        };

        let state = server::ServerState {
            engine: Arc::new(engine),
            db,
            events,
        };
        server::run(state, addr).await;
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
