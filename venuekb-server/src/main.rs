use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};
use venuekb_core::{GeminiClient, LanguageModel, PgKnowledgeStore, VenueKbConfig};

use venuekb_server::{server, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "venuekb.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience; production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match VenueKbConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let pool = match venuekb_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match venuekb_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        match venuekb_core::db::count_knowledge_entries(&pool).await {
            Ok(n) => println!("✅ knowledge_entries table present ({} rows)", n),
            Err(e) => {
                println!("❌ knowledge_entries check failed (run the server once to migrate): {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ VenueKB DB health check passed");
        return Ok(());
    }

    venuekb_core::db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let llm: Arc<dyn LanguageModel> = match GeminiClient::from_llm_config(&config.llm) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("Failed to create language model client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(model = %config.llm.model, "Language model client ready");

    let store = Arc::new(PgKnowledgeStore::new(pool.clone()));
    let state = AppState::new(pool, config.clone(), llm, store);

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    if config.http.enabled {
        let http_state = state.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = venuekb_server::http::start_http_server(http_state, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    server::run_unix_server(&config.service.socket_path, state, tx.subscribe()).await?;

    Ok(())
}
