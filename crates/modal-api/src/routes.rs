use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{
    assistant, calculations, export, logic, messages, migrate, preferences, quiz, users,
};

/// Every `/api` route. The binary adds the WebSocket endpoint, static files
/// and the HTTP layers on top.
pub fn router(state: AppState) -> Router {
    // Calculator endpoints identify the user in the path or body.
    let open_routes = Router::new()
        .route("/api/migrate", post(migrate::run_migration))
        .route("/api/calculations", post(calculations::save_calculation))
        .route(
            "/api/calculations/{id}",
            get(calculations::get_history).delete(calculations::delete_calculation),
        )
        .route("/api/preferences", post(preferences::save_preferences))
        .route("/api/preferences/{user_id}", get(preferences::get_preferences))
        .route("/api/export/pdf", post(export::export_pdf))
        .route(
            "/api/export/calculation/{calculation_id}",
            post(export::export_calculation),
        )
        .route("/api/logic/process", post(logic::process_text))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/online", get(users::online_users))
        .route("/api/assistant/suggestions", get(assistant::suggestions));

    let session_routes = Router::new()
        .route("/api/users/me", get(users::get_me).put(users::update_me))
        .route(
            "/api/users/me/profile",
            get(users::get_profile).put(users::put_profile),
        )
        .route(
            "/api/users/me/security-questions",
            get(users::get_security_questions).post(users::create_security_questions),
        )
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/{other_user_id}", get(messages::get_conversation))
        .route(
            "/api/quiz-results",
            post(quiz::record_result).get(quiz::list_results),
        )
        .route("/api/assistant/query", post(assistant::query))
        .route(
            "/api/assistant/history",
            get(assistant::history).delete(assistant::clear_history),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(open_routes)
        .merge(session_routes)
        .with_state(state)
}
