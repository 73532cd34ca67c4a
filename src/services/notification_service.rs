use crate::database::DbPool;
use crate::entities::{NotificationType, notification_entity as notifications};
use crate::error::{AppError, AppResult};
use crate::models::NotificationResponse;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};

const LIST_LIMIT: u64 = 50;

#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
}

impl NotificationService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn notify_with<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        message: String,
        action_url: Option<&str>,
    ) -> AppResult<()> {
        notifications::ActiveModel {
            user_id: Set(user_id),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            message: Set(message),
            is_read: Set(false),
            action_url: Set(action_url.map(str::to_string)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    pub async fn list(&self, user_id: i64) -> AppResult<Vec<NotificationResponse>> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(LIST_LIMIT)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Only the recipient may mark a notification read.
    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> AppResult<NotificationResponse> {
        let notification = notifications::Entity::find_by_id(notification_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
        if notification.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        if notification.is_read {
            return Ok(notification.into());
        }
        let mut am = notification.into_active_model();
        am.is_read = Set(true);
        Ok(am.update(&*self.pool).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IntoPool;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_mark_read_rejects_other_users() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notifications::Model {
                id: 3,
                user_id: 10,
                notification_type: NotificationType::RewardEarned,
                title: "Reward earned".to_string(),
                message: "You earned 20 CB Points".to_string(),
                is_read: false,
                action_url: None,
                created_at: Utc::now(),
            }]])
            .into_pool();

        let result = NotificationService::new(db).mark_read(11, 3).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
