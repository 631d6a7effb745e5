use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderdesk::config::Config;
use orderdesk::db::{AppState, create_pool, init_db, queries};
use orderdesk::handlers;
use orderdesk::models::DirectoryUser;
use orderdesk::views::ViewCache;

/// Lifetime of dev sessions created by `--seed` (30 days).
const DEV_SESSION_TTL_SECS: i64 = 30 * 86400;

#[derive(Parser, Debug)]
#[command(name = "orderdesk")]
#[command(about = "Projects, service orders and member lookup for small teams")]
struct Cli {
    /// Seed the directory with dev users and print session tokens
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the directory with dev users and issues a session for each.
/// Only runs in dev mode and when the directory is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    if queries::search_directory(&conn, "orderdesk.local")
        .map(|found| !found.is_empty())
        .unwrap_or(false)
    {
        tracing::info!("Directory already seeded, skipping");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let users = [
        ("dev-ana", "ana@orderdesk.local", Some("Ana Silva")),
        ("dev-bruno", "bruno@orderdesk.local", Some("Bruno Costa")),
        ("dev-carla", "carla.dias@orderdesk.local", Some("Carla Dias")),
        ("dev-joao", "joao.pedro@orderdesk.local", None),
    ];

    println!();
    println!("--- COPY FROM HERE ---");
    for (id, email, name) in users {
        let user = DirectoryUser {
            id: id.to_string(),
            email: email.to_string(),
            name: name.map(String::from),
        };
        queries::upsert_directory_user(&conn, &user).expect("Failed to create dev directory user");
        let token = queries::create_session(&conn, id, DEV_SESSION_TTL_SECS)
            .expect("Failed to create dev session");

        tracing::info!("Directory user: {} ({})", user.email, user.display_label());
        println!("  {}: {}", id, token);
    }
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        views: ViewCache::new(config.view_cache_ttl),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ORDERDESK_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("orderdesk listening on {} ({})", addr, config.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
