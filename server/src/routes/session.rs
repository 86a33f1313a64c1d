//! Login.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountService;
use crate::auth::Credential;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
}

/// Exchange an email and password for a session token.
pub async fn login(
    State(accounts): State<Arc<AccountService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let LoginRequest { email, password } = request;
    let credential = Credential::new(password);

    let issued =
        tokio::task::spawn_blocking(move || accounts.login(&email, &credential)).await??;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}
