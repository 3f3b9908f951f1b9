//! Notification repository.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use campuspay_core::wallet::Notification;
use campuspay_shared::types::{NotificationId, PageRequest, PageResponse};

use crate::entities::notifications;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, notification: &Notification) -> Result<notifications::Model, DbErr> {
        notifications::ActiveModel {
            id: Set(NotificationId::new().into_inner()),
            user_id: Set(notification.user_id),
            title: Set(notification.title.clone()),
            body: Set(notification.body.clone()),
            data: Set(notification.data.clone()),
            read_at: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<notifications::Model>, DbErr> {
        let page = page.clamped();
        let query = notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id));

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Marks one of the user's notifications as read.
    ///
    /// Returns false if it does not exist, belongs to someone else, or was
    /// already read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(Utc::now()))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
