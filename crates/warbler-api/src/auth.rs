use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tower_sessions::Session;
use tracing::info;

use warbler_crypto::CredentialHasher;
use warbler_db::{Database, authenticate};
use warbler_types::api::{LoginRequest, SessionResponse, SignupRequest};

use crate::middleware::{do_login, do_logout};
use crate::{ApiError, run_blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub hasher: Box<dyn CredentialHasher>,
}

impl AppStateInner {
    pub fn new(db: Database, hasher: impl CredentialHasher + 'static) -> AppState {
        Arc::new(Self {
            db,
            hasher: Box::new(hasher),
        })
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.contains('@')
}

pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }
    if !is_valid_email(&req.email) {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = run_blocking(&state, move |s| {
        let mut tx = s.db.session();
        let user = warbler_db::signup(
            &mut tx,
            s.hasher.as_ref(),
            &req.username,
            &req.email,
            &req.password,
            req.image_url.as_deref(),
        )?;

        match tx.commit() {
            Ok(()) => Ok(user),
            Err(e) if e.is_integrity() => {
                tx.rollback();
                Err(ApiError::Conflict("Username or email already taken".into()))
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    do_login(&session, &user).await?;
    info!("New user signed up: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user_id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_blocking(&state, move |s| {
        Ok(authenticate(&s.db, s.hasher.as_ref(), &req.username, &req.password)?)
    })
    .await?
    .ok_or(ApiError::InvalidCredentials)?;

    do_login(&session, &user).await?;

    Ok(Json(SessionResponse {
        user_id: user.id,
        username: user.username,
    }))
}

pub async fn logout(session: Session) -> Result<impl IntoResponse, ApiError> {
    do_logout(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
