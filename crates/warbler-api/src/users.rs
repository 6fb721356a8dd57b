use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use warbler_db::{User, authenticate};
use warbler_types::api::{UpdateProfileRequest, UserDetailResponse, UserListResponse, UserSearchQuery};

use crate::auth::is_valid_email;
use crate::convert;
use crate::middleware::{CurrentUser, do_logout};
use crate::{ApiError, AppState, run_blocking};

/// Messages shown on a profile page.
const PROFILE_MESSAGE_LIMIT: u32 = 100;

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_blocking(&state, move |s| Ok(s.db.list_users(query.q.as_deref())?)).await?;

    Ok(Json(UserListResponse {
        users: convert::summaries(&users),
    }))
}

pub async fn show_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = run_blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("user"))?;
        let messages = s.db.get_user_messages(user.id, Some(PROFILE_MESSAGE_LIMIT))?;
        let following_count = user.following(&s.db)?.len();
        let followers_count = user.followers(&s.db)?.len();

        Ok(UserDetailResponse {
            user: convert::profile(&user),
            messages: convert::messages(&messages),
            following_count,
            followers_count,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn show_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("user"))?;
        Ok(user.following(&s.db)?)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: convert::summaries(&users),
    }))
}

pub async fn show_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_blocking(&state, move |s| {
        let user = s
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("user"))?;
        Ok(user.followers(&s.db)?)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: convert::summaries(&users),
    }))
}

/// Follows `user_id` and returns the current user's updated following list.
pub async fn add_follow(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    // The store accepts self-follows; the HTTP surface does not offer them.
    if user_id == current.id {
        return Err(ApiError::BadRequest("You cannot follow yourself".into()));
    }

    let users = run_blocking(&state, move |s| {
        let followee = s
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("user"))?;
        if current.is_following(&s.db, &followee)? {
            return Err(ApiError::Conflict(format!(
                "Already following {}",
                followee.username
            )));
        }

        let mut tx = s.db.session();
        tx.follow(current.id, followee.id);
        tx.commit()?;

        info!("{} followed {}", current.username, followee.username);
        Ok(current.following(&s.db)?)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: convert::summaries(&users),
    }))
}

/// Unfollows `user_id` and returns the current user's updated following list.
pub async fn stop_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_blocking(&state, move |s| {
        let followee = s
            .db
            .get_user_by_id(user_id)?
            .ok_or(ApiError::NotFound("user"))?;

        let mut tx = s.db.session();
        tx.unfollow(current.id, followee.id);
        tx.commit()?;

        Ok(current.following(&s.db)?)
    })
    .await?;

    Ok(Json(UserListResponse {
        users: convert::summaries(&users),
    }))
}

/// Edits the current user's profile after re-checking their password.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // a blank email leaves the current one in place
    let bad_email = req
        .email
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty() && !is_valid_email(e));
    if bad_email {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }

    let updated = run_blocking(&state, move |s| {
        let Some(mut user) =
            authenticate(&s.db, s.hasher.as_ref(), &current.username, &req.password)?
        else {
            return Err(ApiError::InvalidCredentials);
        };

        apply_profile_changes(&mut user, req);

        let mut tx = s.db.session();
        tx.update_user(user.clone());
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

    Ok(Json(convert::profile(&updated)))
}

/// Deletes the current user and everything they own, then logs them out.
/// The session is only cleared once the delete has committed.
pub async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let username = current.username.clone();
    run_blocking(&state, move |s| {
        let mut tx = s.db.session();
        tx.delete_user(current.id);
        Ok(tx.commit()?)
    })
    .await?;

    do_logout(&session).await?;
    info!("Deleted user {}", username);
    Ok(StatusCode::NO_CONTENT)
}

fn apply_profile_changes(user: &mut User, req: UpdateProfileRequest) {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    if let Some(username) = non_empty(req.username) {
        user.username = username;
    }
    if let Some(email) = non_empty(req.email) {
        user.email = email;
    }
    if let Some(image_url) = non_empty(req.image_url) {
        user.image_url = image_url;
    }
    if let Some(header_image_url) = non_empty(req.header_image_url) {
        user.header_image_url = header_image_url;
    }
    if let Some(bio) = req.bio {
        user.bio = Some(bio).filter(|b| !b.is_empty());
    }
    if let Some(location) = req.location {
        user.location = Some(location).filter(|l| !l.is_empty());
    }
}
