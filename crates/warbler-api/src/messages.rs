use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::{debug, info};
use uuid::Uuid;

use warbler_db::Message;
use warbler_db::models::MAX_MESSAGE_LEN;
use warbler_types::api::{NewMessageRequest, TimelineResponse};

use crate::convert;
use crate::middleware::{CurrentUser, load_current_user};
use crate::{ApiError, AppState, run_blocking};

const TIMELINE_LIMIT: u32 = 100;

/// Home page. Anonymous visitors get an empty, flagged response; logged-in
/// users get their own and followed users' latest messages.
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, ApiError> {
    let Some(user) = load_current_user(&state, &session).await? else {
        debug!("Anonymous home page request");
        return Ok(Json(TimelineResponse {
            anonymous: true,
            messages: vec![],
        }));
    };

    let messages = run_blocking(&state, move |s| Ok(s.db.timeline(user.id, TIMELINE_LIMIT)?)).await?;

    Ok(Json(TimelineResponse {
        anonymous: false,
        messages: convert::messages(&messages),
    }))
}

pub async fn add_message(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(req): Json<NewMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.trim().to_string();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Message text is required".into()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message text must be at most {} characters",
            MAX_MESSAGE_LEN
        )));
    }

    let message = Message::new(text, current.id);
    let stored = message.clone();
    run_blocking(&state, move |s| {
        let mut tx = s.db.session();
        tx.add_message(stored);
        Ok(tx.commit()?)
    })
    .await?;

    info!("{} posted message {}", current.username, message.id);
    Ok((StatusCode::CREATED, Json(convert::message(&message))))
}

pub async fn show_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = run_blocking(&state, move |s| {
        s.db.get_message(message_id)?
            .ok_or(ApiError::NotFound("message"))
    })
    .await?;

    Ok(Json(convert::message(&message)))
}

/// Deletes a message. Only its owner may do so.
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |s| {
        let message = s
            .db
            .get_message(message_id)?
            .ok_or(ApiError::NotFound("message"))?;
        if message.user_id != current.id {
            return Err(ApiError::Forbidden);
        }

        let mut tx = s.db.session();
        tx.delete_message(message.id);
        Ok(tx.commit()?)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
