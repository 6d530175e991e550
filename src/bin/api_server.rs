// src/bin/api_server.rs

use academic_records::infra::config::Config;
use academic_records::infra::ledger::Ledger;
use academic_records::transport;
use academic_records::{ContentStore, LocalLedger, RecordsService, StudentService, TransactionSigner};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(&config);

    // --- Ledger Initialization ---
    let ledger: Arc<dyn Ledger> = match &config.ledger_state_path {
        Some(path) => Arc::new(LocalLedger::open(&config.genesis_admins, path.clone()).await?),
        None => {
            warn!("LEDGER_STATE_PATH not set, ledger state will not survive a restart");
            Arc::new(LocalLedger::in_memory(&config.genesis_admins))
        }
    };
    let status = ledger.status().await?;
    info!(
        block_number = status.block_number,
        students = status.subject_count,
        admins = ?status.registry_admins,
        "Ledger ready"
    );

    // --- Content Store Initialization ---
    let store = Arc::new(ContentStore::from_config(&config.ipfs)?);
    let health = store.health().await;
    if health.degraded {
        warn!("No IPFS backend reachable, uploads fall back to local fingerprints");
    } else {
        info!(backends = ?health.backends, "Content store ready");
    }

    // --- Service Initialization ---
    let signer = Arc::new(TransactionSigner::from_secret(config.admin_key.as_ref())?);
    if !signer.has_default_key() {
        warn!("ADMIN_PRIVATE_KEY not set, mutating requests must carry privateKey");
    }
    let app_state = transport::http::AppState {
        students: Arc::new(StudentService::new(ledger.clone(), signer.clone())),
        records: Arc::new(RecordsService::new(ledger.clone(), store.clone(), signer)),
        store,
        ledger,
        max_upload_bytes: config.max_upload_bytes,
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("Graceful shutdown complete");
    Ok(())
}
