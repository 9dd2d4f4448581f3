//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login, token verification, and refresh.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use qualitybot_core::domain::User;
use qualitybot_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::password::{hash_password, verify_password};
use crate::web::state::AppState;
use crate::web::tokens::TokenError;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// User fields plus a freshly minted token pair.
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// User fields only, returned by token verification.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /signup - Create a new user account and mint both tokens.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Hash the password
    let password_hash = hash_password(&req.password).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password".to_string(),
        )
    })?;

    // 2. Create user in database; a duplicate email is a client error.
    let user = state
        .store
        .create_user(&req.name, &req.email, &password_hash, &req.role)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (
                StatusCode::BAD_REQUEST,
                "Email already registered".to_string(),
            ),
            other => {
                error!("Failed to create user: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create user".to_string(),
                )
            }
        })?;

    // 3. Mint the token pair so the client can operate statelessly.
    let response = mint_auth_response(&state, user.into_user())?;
    Ok((StatusCode::OK, Json(response)))
}

/// POST /login - Login with existing credentials and mint both tokens.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Look up by email. An unknown email and a wrong password produce the
    // same message, to avoid user enumeration.
    let creds = state
        .store
        .find_by_email(&req.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            )
        })?
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ))?;

    // 2. Verify password
    let valid = verify_password(&req.password, &creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;

    if !valid {
        return Err((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ));
    }

    // 3. Mint the token pair.
    let response = mint_auth_response(&state, creds.into_user())?;
    Ok((StatusCode::OK, Json(response)))
}

/// GET /verify-token - Resolve the bearer access token to its user.
///
/// The token itself is checked by the `require_auth` middleware; this handler
/// only resolves the subject to a row.
#[utoipa::path(
    get,
    path = "/verify-token",
    responses(
        (status = 200, description = "Token is valid", body = UserResponse),
        (status = 401, description = "Invalid token or token expired"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn verify_token_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let creds = state
        .store
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user {}: {:?}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            )
        })?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    Ok(Json(UserResponse::from(creds.into_user())))
}

/// POST /refresh - Exchange a refresh token for a new access token.
///
/// The refresh token is echoed back unchanged; there is no rotation.
#[utoipa::path(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = AuthResponse),
        (status = 401, description = "Invalid refresh token or refresh token expired"),
        (status = 404, description = "User not found")
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Verify against the refresh secret only.
    let user_id = state
        .tokens
        .verify_refresh(&req.refresh_token)
        .map_err(|e| {
            let message = match e {
                TokenError::Expired => "Refresh token expired",
                TokenError::Invalid => "Invalid refresh token",
            };
            (StatusCode::UNAUTHORIZED, message.to_string())
        })?;

    // 2. The subject must still resolve to a row.
    let creds = state
        .store
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to look up user {}: {:?}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error".to_string(),
            )
        })?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    // 3. Mint a new access token; echo the same refresh token.
    let user = creds.into_user();
    let access_token = state.tokens.issue_access(user.id).map_err(|e| {
        error!("Failed to issue access token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token".to_string(),
        )
    })?;

    Ok(Json(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        access_token,
        refresh_token: req.refresh_token,
    }))
}

/// Builds the signup/login response shape: user fields plus a fresh token pair.
fn mint_auth_response(
    state: &Arc<AppState>,
    user: User,
) -> Result<AuthResponse, (StatusCode, String)> {
    let issue_err = |e| {
        error!("Failed to issue token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token".to_string(),
        )
    };
    let access_token = state.tokens.issue_access(user.id).map_err(issue_err)?;
    let refresh_token = state.tokens.issue_refresh(user.id).map_err(issue_err)?;

    Ok(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        access_token,
        refresh_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::web::broadcast::BroadcastHub;
    use crate::web::state::AppState;
    use crate::web::tokens::TokenConfig;
    use async_trait::async_trait;
    use qualitybot_core::domain::UserCredentials;
    use qualitybot_core::ports::{PortResult, UserStore};
    use std::sync::Mutex;
    use tracing::Level;

    /// An in-memory credential store with the same uniqueness contract as
    /// the database adapter.
    #[derive(Default)]
    struct InMemoryStore {
        users: Mutex<Vec<UserCredentials>>,
    }

    #[async_trait]
    impl UserStore for InMemoryStore {
        async fn create_user(
            &self,
            name: &str,
            email: &str,
            password_hash: &str,
            role: &str,
        ) -> PortResult<UserCredentials> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == email) {
                return Err(PortError::Conflict(format!(
                    "Email {} already registered",
                    email
                )));
            }
            let creds = UserCredentials {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                role: role.to_string(),
                password_hash: password_hash.to_string(),
            };
            users.push(creds.clone());
            Ok(creds)
        }

        async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> PortResult<Option<UserCredentials>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.id == id).cloned())
        }
    }

    fn test_state() -> Arc<AppState> {
        let config = Config {
            bind_address: "127.0.0.1:8000".parse().unwrap(),
            database_url: String::new(),
            log_level: Level::INFO,
            access_token_secret: "test-access-secret".to_string(),
            refresh_token_secret: "test-refresh-secret".to_string(),
            refresh_token_expire_minutes: 43200,
            openai_api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            cors_origins: Vec::new(),
        };
        let tokens = TokenConfig::from_config(&config);
        Arc::new(AppState {
            store: Arc::new(InMemoryStore::default()),
            config: Arc::new(config),
            tokens,
            chat: None,
            hub: Arc::new(BroadcastHub::new()),
        })
    }

    fn signup_req(email: &str) -> SignupRequest {
        SignupRequest {
            name: "A".to_string(),
            email: email.to_string(),
            password: "pw123".to_string(),
            role: "engineer".to_string(),
        }
    }

    #[tokio::test]
    async fn second_signup_with_same_email_is_rejected() {
        let state = test_state();

        let first = signup_handler(State(state.clone()), Json(signup_req("a@x.com"))).await;
        assert!(first.is_ok());

        // Same email with different other fields must still be rejected.
        let mut dup = signup_req("a@x.com");
        dup.name = "B".to_string();
        dup.role = "msme".to_string();
        let (status, message) = signup_handler(State(state), Json(dup))
            .await
            .err()
            .expect("duplicate signup must fail");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Email already registered");
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = test_state();
        signup_handler(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .ok()
            .expect("signup must succeed");

        let unknown = LoginRequest {
            email: "nobody@x.com".to_string(),
            password: "pw123".to_string(),
        };
        let (unknown_status, unknown_message) =
            login_handler(State(state.clone()), Json(unknown))
                .await
                .err()
                .expect("unknown email must fail");

        let wrong = LoginRequest {
            email: "a@x.com".to_string(),
            password: "wrong-password".to_string(),
        };
        let (wrong_status, wrong_message) = login_handler(State(state), Json(wrong))
            .await
            .err()
            .expect("wrong password must fail");

        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_message, wrong_message);
        assert_eq!(unknown_message, "Invalid email or password");
    }

    #[tokio::test]
    async fn login_with_correct_credentials_succeeds() {
        let state = test_state();
        signup_handler(State(state.clone()), Json(signup_req("a@x.com")))
            .await
            .ok()
            .expect("signup must succeed");

        let req = LoginRequest {
            email: "a@x.com".to_string(),
            password: "pw123".to_string(),
        };
        assert!(login_handler(State(state), Json(req)).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_for_a_missing_user_is_not_found() {
        let state = test_state();

        // A valid refresh token whose subject has no row behind it.
        let orphan = state.tokens.issue_refresh(Uuid::new_v4()).unwrap();
        let (status, message) = refresh_handler(
            State(state),
            Json(RefreshRequest {
                refresh_token: orphan,
            }),
        )
        .await
        .err()
        .expect("refresh for a missing user must fail");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "User not found");
    }
}
