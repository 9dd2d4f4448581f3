//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiChatAdapter},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, refresh_handler, signup_handler, verify_token_handler},
        broadcast::BroadcastHub,
        chat::chat_handler,
        import::import_excel_handler,
        middleware::require_auth,
        rest::{root_handler, ApiDoc},
        state::AppState,
        tokens::TokenConfig,
        ws_handler::ws_handler,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use qualitybot_core::ports::ChatService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Chat Adapter (optional) ---
    // Without an API key the /chat endpoint stays up but reports failure in
    // its response envelope.
    let chat: Option<Arc<dyn ChatService>> = match config.openai_api_key.as_ref() {
        Some(key) => {
            let openai_config = OpenAIConfig::new().with_api_key(key);
            let client = Client::with_config(openai_config);
            Some(Arc::new(OpenAiChatAdapter::new(
                client,
                config.chat_model.clone(),
            )))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; /chat will report failure responses.");
            None
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: db_adapter,
        config: config.clone(),
        tokens: TokenConfig::from_config(&config),
        chat,
        hub: Arc::new(BroadcastHub::new()),
    });

    // --- 5. CORS ---
    let mut origins = Vec::new();
    for origin in &config.cors_origins {
        let value = origin.parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("Invalid CORS origin '{}': {}", origin, e))
        })?;
        origins.push(value);
    }
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/chat", post(chat_handler))
        .route("/import-excel", post(import_excel_handler))
        .route("/ws", get(ws_handler));

    // Protected routes (bearer access token required)
    let protected_routes = Router::new()
        .route("/verify-token", get(verify_token_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
