use crate::database::DbPool;
use crate::entities::{
    CompletionStatus, WithdrawalStatus, task_completion_entity as completions,
    task_entity as tasks, user_entity as users, withdrawal_entity as withdrawals,
};
use crate::error::AppResult;
use crate::models::AdminStats;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[derive(Clone)]
pub struct AdminService {
    pool: DbPool,
}

impl AdminService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn stats(&self) -> AppResult<AdminStats> {
        let total_users = users::Entity::find().count(&*self.pool).await?;
        let total_tasks = tasks::Entity::find().count(&*self.pool).await?;
        let pending_withdrawals = withdrawals::Entity::find()
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Pending))
            .count(&*self.pool)
            .await?;
        let pending_completions = completions::Entity::find()
            .filter(completions::Column::Status.eq(CompletionStatus::Pending))
            .count(&*self.pool)
            .await?;

        Ok(AdminStats {
            total_users,
            total_tasks,
            pending_withdrawals,
            pending_completions,
        })
    }
}
