use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{CompletionStatus, TaskStatus, task_completion_entity, task_entity};
use crate::error::{AppError, AppResult};

pub const DEFAULT_TOTAL_SLOTS: i32 = 100;
pub const MIN_TASK_REWARD: i64 = 10;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub business_id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub reward_amount: i64,
    pub total_slots: i32,
    pub completed_slots: i32,
    pub requires_proof: bool,
    pub proof_instructions: Option<String>,
    pub task_url: Option<String>,
    pub task_image: Option<String>,
    pub status: TaskStatus,
    pub admin_notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<task_entity::Model> for TaskResponse {
    fn from(m: task_entity::Model) -> Self {
        TaskResponse {
            id: m.id,
            business_id: m.business_id,
            title: m.title,
            description: m.description,
            category: m.category,
            reward_amount: m.reward_amount,
            total_slots: m.total_slots,
            completed_slots: m.completed_slots,
            requires_proof: m.requires_proof,
            proof_instructions: m.proof_instructions,
            task_url: m.task_url,
            task_image: m.task_image,
            status: m.status,
            admin_notes: m.admin_notes,
            expires_at: m.expires_at,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskCompletionResponse {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub proof_url: Option<String>,
    pub proof_text: Option<String>,
    pub status: CompletionStatus,
    /// Frozen at completion time, already VIP-adjusted
    pub reward_amount: i64,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<task_completion_entity::Model> for TaskCompletionResponse {
    fn from(m: task_completion_entity::Model) -> Self {
        TaskCompletionResponse {
            id: m.id,
            task_id: m.task_id,
            user_id: m.user_id,
            proof_url: m.proof_url,
            proof_text: m.proof_text,
            status: m.status,
            reward_amount: m.reward_amount,
            reviewed_by: m.reviewed_by,
            reviewed_at: m.reviewed_at,
            rejection_reason: m.rejection_reason,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CompleteTaskRequest {
    pub proof_url: Option<String>,
    pub proof_text: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteTaskResponse {
    pub completion: TaskCompletionResponse,
    /// True when the reward was credited immediately
    pub auto_approved: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    #[schema(example = "Follow us on Instagram")]
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    #[schema(example = 20)]
    pub reward_amount: i64,
    pub total_slots: Option<i32>,
    #[serde(default)]
    pub requires_proof: bool,
    pub proof_instructions: Option<String>,
    pub task_url: Option<String>,
    pub task_image: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().chars().count() < 5 {
            return Err(AppError::ValidationError(
                "Title must be at least 5 characters".to_string(),
            ));
        }
        if self.description.trim().chars().count() < 20 {
            return Err(AppError::ValidationError(
                "Description must be at least 20 characters".to_string(),
            ));
        }
        if self.reward_amount < MIN_TASK_REWARD {
            return Err(AppError::ValidationError(format!(
                "Reward must be at least {MIN_TASK_REWARD} CB Points"
            )));
        }
        if self.total_slots.is_some_and(|s| s < 1) {
            return Err(AppError::ValidationError(
                "Task must have at least 1 slot".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update by the owning business. `status` is limited to the
/// transitions a business may make.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub proof_instructions: Option<String>,
    pub task_url: Option<String>,
    pub task_image: Option<String>,
    pub status: Option<TaskStatus>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(title) = &self.title
            && title.trim().chars().count() < 5
        {
            return Err(AppError::ValidationError(
                "Title must be at least 5 characters".to_string(),
            ));
        }
        if let Some(description) = &self.description
            && description.trim().chars().count() < 20
        {
            return Err(AppError::ValidationError(
                "Description must be at least 20 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Admin notes on approval, reason on rejection
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_task() -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Follow us on X".into(),
            description: "Follow the account and keep notifications on".into(),
            category: Some("social".into()),
            reward_amount: 10,
            total_slots: None,
            requires_proof: false,
            proof_instructions: None,
            task_url: None,
            task_image: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_create_task_accepts_minimums() {
        assert!(valid_task().validate().is_ok());
    }

    #[test]
    fn test_create_task_rejections() {
        let mut t = valid_task();
        t.title = "Four".into();
        assert!(t.validate().is_err());

        let mut t = valid_task();
        t.description = "too short".into();
        assert!(t.validate().is_err());

        let mut t = valid_task();
        t.reward_amount = 9;
        assert!(t.validate().is_err());

        let mut t = valid_task();
        t.total_slots = Some(0);
        assert!(t.validate().is_err());
    }
}
