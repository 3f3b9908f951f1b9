//! Notification inbox routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use campuspay_db::{NotificationRepository, entities::notifications};
use campuspay_shared::types::{PageRequest, PageResponse};

/// Creates the notification routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{notification_id}/read", post(mark_read))
}

/// A notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    /// Notification ID.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Client payload.
    pub data: serde_json::Value,
    /// When it was read, if ever.
    pub read_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(m: notifications::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            body: m.body,
            data: m.data,
            read_at: m.read_at.map(|t| t.with_timezone(&Utc)),
            created_at: m.created_at.with_timezone(&Utc),
        }
    }
}

/// GET /notifications
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<NotificationResponse>>> {
    let list = NotificationRepository::new(state.conn())
        .list(auth.user_id(), &page)
        .await?;
    Ok(Json(list.map(NotificationResponse::from)))
}

/// POST /notifications/{notification_id}/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let updated = NotificationRepository::new(state.conn())
        .mark_read(auth.user_id(), notification_id)
        .await?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "NOTIFICATION_NOT_FOUND",
            "Notification not found or already read",
        ))
    }
}
