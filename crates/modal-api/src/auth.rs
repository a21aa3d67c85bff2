use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};

use modal_assistant::Assistant;
use modal_db::models::NewUser;
use modal_db::{Backend, Store};
use modal_types::api::{ApiResponse, AuthResponse, Claims, LoginRequest, RegisterRequest};
use modal_types::models::User;

use crate::error::ApiError;
use crate::report::PdfRenderer;

pub const MIN_PASSWORD_LEN: usize = 6;
const SESSION_DAYS: i64 = 30;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    pub backend: Backend,
    /// Source document for `/api/migrate`.
    pub json_path: PathBuf,
    pub jwt_secret: String,
    pub pdf: PdfRenderer,
    /// One assistant per session user, created on first query.
    pub assistants: Mutex<HashMap<i64, Assistant>>,
}

impl AppStateInner {
    pub fn new(
        store: Arc<dyn Store>,
        backend: Backend,
        json_path: PathBuf,
        jwt_secret: String,
        pdf: PdfRenderer,
    ) -> Self {
        Self {
            store,
            backend,
            json_path,
            jwt_secret,
            pdf,
            assistants: Mutex::new(HashMap::new()),
        }
    }
}

/// Run a store call off the async runtime.
pub async fn with_store<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Store) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.store.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::from)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();
    if email.is_empty() || name.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Please fill in all fields"));
    }
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email address"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let lookup = email.clone();
    if with_store(&state, move |store| store.get_user_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password = hash_password(&req.password)?;
    let user = with_store(&state, move |store| {
        store.create_user(&NewUser {
            email,
            password,
            name,
        })
    })
    .await?;

    let token = create_token(&state.jwt_secret, &user)?;
    info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(AuthResponse {
            user: user.into(),
            token,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".into());

    let email = req.email.trim().to_lowercase();
    let user = with_store(&state, move |store| store.get_user_by_email(&email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password) {
        return Err(invalid());
    }

    let token = create_token(&state.jwt_secret, &user)?;

    Ok(Json(ApiResponse::data(AuthResponse {
        user: user.into(),
        token,
    })))
}

/// Argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

/// False for a wrong password and for a stored value that is not a PHC
/// string (e.g. plaintext carried over from an old JSON document).
pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
        .is_ok()
}

pub fn create_token(secret: &str, user: &User) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "hunter22"));
    }

    #[test]
    fn tokens_only_decode_with_their_secret() {
        let user = User {
            id: 7,
            email: "t@example.com".into(),
            password: String::new(),
            name: "T".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let token = create_token("s1", &user).unwrap();
        assert_eq!(crate::middleware::decode_token("s1", &token).unwrap().sub, 7);
        assert!(crate::middleware::decode_token("s2", &token).is_err());
    }
}
