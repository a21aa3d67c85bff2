use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use modal_db::models::{NewSecurityQuestions, NewUserProfile, ProfileUpdate, UserUpdate};
use modal_types::api::{
    ApiResponse, Claims, OnlineUsersResponse, PublicUser, SecurityQuestionsRequest,
    UpdateProfileRequest, UpdateUserRequest,
};

use crate::auth::{AppState, MIN_PASSWORD_LEN, hash_password, with_store};
use crate::error::ApiError;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub;
    let user = with_store(&state, move |store| store.get_user_by_id(id))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(ApiResponse::data(PublicUser::from(user))))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let id = claims.sub;

    let email = req.email.map(|e| e.trim().to_lowercase());
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(ApiError::bad_request("Invalid email address"));
        }
        let lookup = email.clone();
        let holder = with_store(&state, move |store| store.get_user_by_email(&lookup)).await?;
        if holder.is_some_and(|u| u.id != id) {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
    }

    let name = req.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }

    let password = match req.password {
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            return Err(ApiError::bad_request(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    let update = UserUpdate {
        email,
        password,
        name,
    };
    let user = with_store(&state, move |store| store.update_user(id, &update))
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = id, "user updated");
    Ok(Json(ApiResponse::data(PublicUser::from(user))))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub;
    let profile = with_store(&state, move |store| store.get_user_profile(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(Json(ApiResponse::data(profile)))
}

/// Update the session user's profile, creating it on first write.
pub async fn put_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user_id = claims.sub;

    let profile = with_store(&state, move |store| {
        if store.get_user_profile(user_id)?.is_some() {
            let update = ProfileUpdate {
                bio: req.bio,
                avatar_url: req.avatar_url,
            };
            store.update_user_profile(user_id, &update)?.ok_or_else(|| {
                anyhow::anyhow!("profile for user {} vanished during update", user_id)
            })
        } else {
            store.create_user_profile(&NewUserProfile {
                user_id,
                bio: req.bio.unwrap_or_default(),
                avatar_url: req.avatar_url.unwrap_or_default(),
            })
        }
    })
    .await?;

    Ok(Json(ApiResponse::data(profile)))
}

pub async fn get_security_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub;
    let questions = with_store(&state, move |store| store.get_security_questions(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Security questions not found"))?;
    Ok(Json(ApiResponse::data(questions)))
}

pub async fn create_security_questions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SecurityQuestionsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let questions = NewSecurityQuestions {
        question1: req.question1,
        answer1: req.answer1,
        question2: req.question2,
        answer2: req.answer2,
        question3: req.question3,
        answer3: req.answer3,
    };
    let filled = [
        &questions.question1,
        &questions.answer1,
        &questions.question2,
        &questions.answer2,
        &questions.question3,
        &questions.answer3,
    ]
    .iter()
    .all(|field| !field.trim().is_empty());
    if !filled {
        return Err(ApiError::bad_request("Please fill in all fields"));
    }

    let user_id = claims.sub;
    if with_store(&state, move |store| store.get_security_questions(user_id))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Security questions already set".into()));
    }

    let stored = with_store(&state, move |store| {
        store.create_security_questions(user_id, &questions)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(stored))))
}

pub async fn online_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let user_ids = with_store(&state, |store| store.get_online_users()).await?;
    Ok(Json(ApiResponse::data(OnlineUsersResponse { user_ids })))
}
