//! Herald - topic-addressed alert notification gateway

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::{
    config::Args,
    db::schemas::TopicDoc,
    db::{AlertStore, MemoryStore, MongoClient, MongoStore},
    delivery::{LogPresenter, NotifyPermission, SessionDispatcher},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("herald={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Herald - Alert Notification Gateway");
    info!("======================================");
    info!("Node ID: {}", args.node_id);
    info!("Listen: {}", args.listen);
    info!(
        "Mode: {}",
        if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" }
    );
    info!("Public URL: {}", args.base_url());
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    // Connect to MongoDB; fall back to the in-memory store in dev mode
    let (store, store_backend): (Arc<dyn AlertStore>, &'static str) =
        match connect_mongo(&args).await {
            Ok(store) => {
                info!("MongoDB connected successfully");
                (store, "mongodb")
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    let memory = MemoryStore::new();
                    // Seed a starter topic so the topic API is usable out of the box
                    memory
                        .insert_topic(TopicDoc::new(
                            "Site Monitoring",
                            "Automated site health alerts",
                            args.base_url(),
                        ))
                        .await?;
                    (Arc::new(memory), "memory")
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let state = Arc::new(AppState::new(args, store, store_backend));

    // In dev mode, attach a local session that logs every delivery
    if state.args.dev_mode {
        let session = SessionDispatcher::new(
            NotifyPermission::Granted,
            Some(Arc::new(LogPresenter)),
        );
        session.start(&state.feed);
        info!("Local feed session started (deliveries are logged)");
    }

    server::run(state).await?;

    Ok(())
}

async fn connect_mongo(args: &Args) -> herald::Result<Arc<dyn AlertStore>> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    let store = MongoStore::new(&client).await?;
    Ok(Arc::new(store))
}
