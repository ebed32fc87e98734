//! HTTP server bootstrap for Autho.D.oX.
//!
//! This module wires together:
//! - configuration
//! - the SQLite cache pool
//! - content store, ledger client and wallet session
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::chain_reader::ChainReader;
use crate::content::{ContentResolver, ContentUploader, KeyStatus, PinataConfig, PinataContentStore};
use crate::gallery::GalleryService;
use crate::infra::{ContentStore, ProofCache, ProofLedger, SqliteProofCache, WalletProvider};
use crate::ledger::{AlloyLedger, LedgerConfig};
use crate::submission::SubmissionFlow;
use crate::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};
use crate::wallet::WalletSession;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Apply embedded migrations at startup.
    pub migrate_on_startup: bool,
    /// Seed for the wallet session's manual-disconnect flag.
    pub wallet_manually_disconnected: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://authodox.db".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {host}:{port}: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            migrate_on_startup: env_flag("DB_MIGRATE_ON_STARTUP", true),
            wallet_manually_disconnected: env_flag("WALLET_MANUALLY_DISCONNECTED", false),
        })
    }
}

/// Parse a boolean-ish environment variable.
pub fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn ProofCache>,
    pub resolver: ContentResolver,
    pub gallery: GalleryService,
    pub session: Arc<WalletSession>,
    /// Present when a ledger is configured
    pub wallet: Option<Arc<dyn WalletProvider>>,
    /// Present when a ledger is configured
    pub submission: Option<Arc<SubmissionFlow>>,
    pub key_status: KeyStatus,
}

/// Collaborators the application state is assembled from.
pub struct Services {
    pub cache: Arc<dyn ProofCache>,
    pub content: Arc<dyn ContentStore>,
    pub ledger: Option<Arc<dyn ProofLedger>>,
    pub wallet: Option<Arc<dyn WalletProvider>>,
    pub session: Arc<WalletSession>,
    pub required_chain_id: u64,
    pub key_status: KeyStatus,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        let Services {
            cache,
            content,
            ledger,
            wallet,
            session,
            required_chain_id,
            key_status,
        } = services;

        let chain_reader = ledger.clone().map(ChainReader::new);
        let submission = match (ledger, wallet.clone()) {
            (Some(ledger), Some(wallet)) => Some(Arc::new(SubmissionFlow::new(
                ContentUploader::new(content.clone()),
                ledger,
                wallet,
                session.clone(),
                cache.clone(),
                required_chain_id,
            ))),
            _ => None,
        };

        Self {
            gallery: GalleryService::new(cache.clone(), chain_reader),
            resolver: ContentResolver::new(content),
            cache,
            session,
            wallet,
            submission,
            key_status,
        }
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_telemetry(&TelemetryConfig::from_env())
        .map_err(|e| anyhow::anyhow!("telemetry init failed: {e}"))?;

    info!("Starting Autho.D.oX v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    // Connect to SQLite
    info!("Opening proof cache at {}...", config.database_url);
    let cache = SqliteProofCache::connect(&config.database_url, config.max_connections).await?;
    if config.migrate_on_startup {
        info!("Running database migrations...");
        cache.initialize().await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    // Content store
    let pinata = PinataConfig::from_env();
    let key_status = pinata.key_status();
    if key_status.is_valid() {
        info!("Pinata credential looks valid");
    } else {
        warn!("{}; uploads will fail", key_status.message());
    }
    let content: Arc<dyn ContentStore> = Arc::new(PinataContentStore::new(pinata));

    // Ledger client (optional - only if PROOF_REGISTRY_ADDRESS is set)
    let (ledger, wallet, required_chain_id) = match LedgerConfig::from_env() {
        Some(ledger_config) => {
            info!("Ledger configured:");
            info!("  RPC URL: {}", ledger_config.rpc_url);
            info!("  Registry: {:?}", ledger_config.registry_address);
            info!("  Required chain ID: {}", ledger_config.required_chain_id);
            let required_chain_id = ledger_config.required_chain_id;
            let alloy = Arc::new(AlloyLedger::new(ledger_config)?);
            match alloy.signer_address() {
                Some(address) => info!("  Signer: {}", address),
                None => info!("  No WALLET_PRIVATE_KEY; submissions disabled"),
            }
            let ledger: Arc<dyn ProofLedger> = alloy.clone();
            let wallet: Arc<dyn WalletProvider> = alloy;
            (Some(ledger), Some(wallet), required_chain_id)
        }
        None => {
            info!("Ledger not configured (set PROOF_REGISTRY_ADDRESS to enable)");
            (None, None, crate::domain::POLYGON_AMOY_CHAIN_ID)
        }
    };

    // Wallet session
    let session = Arc::new(WalletSession::with_manual_disconnect(
        config.wallet_manually_disconnected,
    ));
    if let Some(wallet) = &wallet {
        if let Err(e) = session.restore(wallet.as_ref()).await {
            warn!("Wallet auto-reconnect failed: {}", e);
        }
    }

    let state = AppState::new(Services {
        cache: Arc::new(cache),
        content,
        ledger,
        wallet,
        session,
        required_chain_id,
        key_status,
    });

    // Build router
    let app = build_router(cors_layer_from_env()?).with_state(state);

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("Autho.D.oX is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Build the full router (API, health and readiness).
pub fn build_router(cors: Option<CorsLayer>) -> Router<AppState> {
    let mut router = Router::new()
        .nest("/api", crate::api::router())
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors {
        router = router.layer(cors_layer);
    }

    router
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "authodox",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    match state.cache.count().await {
        Ok(cached) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
            "cached_proofs": cached,
            "ledger": state.submission.is_some(),
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {}", e),
        )),
    }
}
