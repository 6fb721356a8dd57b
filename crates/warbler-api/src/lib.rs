pub mod auth;
pub mod convert;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod users;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing::error;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use middleware::{CURR_USER_KEY, CurrentUser, session_layer};

/// Builds every Warbler route. The caller adds the session layer on top.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(messages::home))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::show_user))
        .route("/messages/{message_id}", get(messages::show_message));

    let protected_routes = Router::new()
        .route("/users/{user_id}/following", get(users::show_following))
        .route("/users/{user_id}/followers", get(users::show_followers))
        .route("/users/follow/{user_id}", post(users::add_follow))
        .route("/users/stop-following/{user_id}", post(users::stop_following))
        .route("/users/profile", post(users::update_profile))
        .route("/users/delete", post(users::delete_user))
        .route("/messages/new", post(messages::add_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Runs blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
}
