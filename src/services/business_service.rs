use crate::database::DbPool;
use crate::entities::{TaskStatus, business_entity as businesses, task_entity as tasks};
use crate::error::{AppError, AppResult};
use crate::models::{
    BusinessResponse, CreateBusinessRequest, CreateTaskRequest, DEFAULT_TOTAL_SLOTS, TaskResponse,
    UpdateTaskRequest,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

/// Status moves a business may make on its own task. Activation and
/// rejection are reserved for administrators.
pub fn business_may_transition(from: TaskStatus, to: TaskStatus) -> bool {
    use TaskStatus::*;
    matches!(
        (from, to),
        (Draft, PendingApproval) | (PendingApproval, Draft) | (Active, Paused) | (Paused, Active)
    )
}

#[derive(Clone)]
pub struct BusinessService {
    pool: DbPool,
}

impl BusinessService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find_for_owner(&self, user_id: i64) -> AppResult<Option<businesses::Model>> {
        Ok(businesses::Entity::find()
            .filter(businesses::Column::UserId.eq(user_id))
            .one(&*self.pool)
            .await?)
    }

    async fn require_business(&self, user_id: i64) -> AppResult<businesses::Model> {
        self.find_for_owner(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Business profile not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<Option<BusinessResponse>> {
        Ok(self.find_for_owner(user_id).await?.map(Into::into))
    }

    /// One profile per user.
    pub async fn create_profile(
        &self,
        user_id: i64,
        req: CreateBusinessRequest,
    ) -> AppResult<BusinessResponse> {
        req.validate()?;
        if self.find_for_owner(user_id).await?.is_some() {
            return Err(AppError::ValidationError(
                "Business profile already exists".to_string(),
            ));
        }
        let created = businesses::ActiveModel {
            user_id: Set(user_id),
            business_name: Set(req.business_name.trim().to_string()),
            business_email: Set(req.business_email),
            business_phone: Set(req.business_phone),
            business_logo: Set(req.business_logo),
            business_description: Set(req.business_description),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;
        log::info!("Business {} created for user {user_id}", created.id);
        Ok(created.into())
    }

    pub async fn list_tasks(&self, user_id: i64) -> AppResult<Vec<TaskResponse>> {
        let business = self.require_business(user_id).await?;
        let rows = tasks::Entity::find()
            .filter(tasks::Column::BusinessId.eq(business.id))
            .order_by_desc(tasks::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// New tasks go straight to the admin approval queue.
    pub async fn create_task(&self, user_id: i64, req: CreateTaskRequest) -> AppResult<TaskResponse> {
        req.validate()?;
        let business = self.require_business(user_id).await?;
        let created = tasks::ActiveModel {
            business_id: Set(business.id),
            title: Set(req.title.trim().to_string()),
            description: Set(req.description.trim().to_string()),
            category: Set(req.category),
            reward_amount: Set(req.reward_amount),
            total_slots: Set(req.total_slots.unwrap_or(DEFAULT_TOTAL_SLOTS)),
            completed_slots: Set(0),
            requires_proof: Set(req.requires_proof),
            proof_instructions: Set(req.proof_instructions),
            task_url: Set(req.task_url),
            task_image: Set(req.task_image),
            status: Set(TaskStatus::PendingApproval),
            expires_at: Set(req.expires_at),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;
        log::info!("Task {} submitted by business {}", created.id, business.id);
        Ok(created.into())
    }

    pub async fn update_task(
        &self,
        user_id: i64,
        task_id: i64,
        req: UpdateTaskRequest,
    ) -> AppResult<TaskResponse> {
        req.validate()?;
        let business = self.require_business(user_id).await?;
        let task = tasks::Entity::find_by_id(task_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
        if task.business_id != business.id {
            return Err(AppError::Forbidden);
        }
        if let Some(to) = req.status
            && to != task.status
            && !business_may_transition(task.status, to)
        {
            return Err(AppError::ValidationError(format!(
                "Cannot move task from {} to {}",
                task.status, to
            )));
        }

        let mut am = task.into_active_model();
        if let Some(title) = req.title {
            am.title = Set(title.trim().to_string());
        }
        if let Some(description) = req.description {
            am.description = Set(description.trim().to_string());
        }
        if let Some(category) = req.category {
            am.category = Set(Some(category));
        }
        if let Some(instructions) = req.proof_instructions {
            am.proof_instructions = Set(Some(instructions));
        }
        if let Some(url) = req.task_url {
            am.task_url = Set(Some(url));
        }
        if let Some(image) = req.task_image {
            am.task_image = Set(Some(image));
        }
        if let Some(status) = req.status {
            am.status = Set(status);
        }
        am.updated_at = Set(Utc::now());
        Ok(am.update(&*self.pool).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::*;

    #[test]
    fn test_allowed_business_transitions() {
        assert!(business_may_transition(Draft, PendingApproval));
        assert!(business_may_transition(PendingApproval, Draft));
        assert!(business_may_transition(Active, Paused));
        assert!(business_may_transition(Paused, Active));
    }

    #[test]
    fn test_admin_only_transitions_are_refused() {
        assert!(!business_may_transition(PendingApproval, Active));
        assert!(!business_may_transition(PendingApproval, Rejected));
        assert!(!business_may_transition(Draft, Active));
        assert!(!business_may_transition(Completed, Active));
        assert!(!business_may_transition(Rejected, PendingApproval));
    }
}
