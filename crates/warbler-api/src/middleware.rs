use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use time::Duration;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer, cookie::SameSite};
use tracing::warn;
use uuid::Uuid;
use warbler_db::User;

use crate::{ApiError, AppState, run_blocking};

/// Session key holding the logged-in user's id. Its presence is the only
/// authentication signal.
pub const CURR_USER_KEY: &str = "curr_user";

/// The logged-in user, inserted by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Cookie-backed sessions kept in process memory.
pub fn session_layer(secure: bool, idle: Duration) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(idle))
}

/// Resolves the session's identity key to a user. A key pointing at a user
/// that no longer exists is dropped and the request is treated as anonymous.
pub async fn load_current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(user_id) = session.get::<Uuid>(CURR_USER_KEY).await? else {
        return Ok(None);
    };

    let user = run_blocking(state, move |s| Ok(s.db.get_user_by_id(user_id)?)).await?;
    if user.is_none() {
        warn!("Session refers to missing user {}", user_id);
        session.remove::<Uuid>(CURR_USER_KEY).await?;
    }

    Ok(user)
}

/// Rejects anonymous requests with 401 and exposes the user as `CurrentUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = load_current_user(&state, &session)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Marks the session as belonging to `user`, rotating its id first.
pub async fn do_login(session: &Session, user: &User) -> Result<(), ApiError> {
    session.cycle_id().await?;
    session.insert(CURR_USER_KEY, user.id).await?;
    Ok(())
}

pub async fn do_logout(session: &Session) -> Result<(), ApiError> {
    session.remove::<Uuid>(CURR_USER_KEY).await?;
    Ok(())
}
