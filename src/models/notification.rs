use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{NotificationType, notification_entity};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<notification_entity::Model> for NotificationResponse {
    fn from(m: notification_entity::Model) -> Self {
        NotificationResponse {
            id: m.id,
            notification_type: m.notification_type,
            title: m.title,
            message: m.message,
            is_read: m.is_read,
            action_url: m.action_url,
            created_at: m.created_at,
        }
    }
}
