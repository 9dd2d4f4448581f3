//! services/api/src/web/rest.rs
//!
//! The liveness endpoint and the master definition for the OpenAPI
//! specification.

use axum::response::Json;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::web::{auth, chat, import};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::verify_token_handler,
        auth::refresh_handler,
        import::import_excel_handler,
        chat::chat_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::AuthResponse,
            auth::UserResponse,
            import::ExcelImportResponse,
            chat::ChatRequest,
            chat::ChatResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "QualityBot API", description = "Authentication, quality-data import, and AI chat endpoints.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme referenced by the protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Liveness
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    message: String,
}

/// GET / - Liveness probe.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn root_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "QualityBot AI Backend is running!".to_string(),
    })
}
