use crate::database::DbPool;
use crate::entities::{
    CompletionStatus, NotificationType, TaskStatus, TransactionType, task_completion_entity as completions,
    task_entity as tasks, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    CompleteTaskRequest, CompleteTaskResponse, TaskCompletionResponse, TaskResponse,
};
use crate::services::{
    LedgerEntry, LedgerReference, NotificationService, UserService, VipService, WalletService,
    vip_service::{compute_task_reward, multiplier_for},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

const NOT_AVAILABLE: &str = "Task not available";
const ALREADY_COMPLETED: &str = "Task already completed";

/// Fields of a task after one more slot is consumed.
pub fn fill_slot(task: &tasks::Model) -> (i32, TaskStatus) {
    let completed = task.completed_slots + 1;
    let status = if completed >= task.total_slots {
        TaskStatus::Completed
    } else {
        task.status
    };
    (completed, status)
}

#[derive(Clone)]
pub struct TaskService {
    pool: DbPool,
    vip_service: VipService,
    user_service: UserService,
}

impl TaskService {
    pub fn new(pool: DbPool, vip_service: VipService, user_service: UserService) -> Self {
        Self {
            pool,
            vip_service,
            user_service,
        }
    }

    /// Active tasks that still have a free slot, newest first.
    pub async fn list_available(&self) -> AppResult<Vec<TaskResponse>> {
        let rows = tasks::Entity::find()
            .filter(tasks::Column::Status.eq(TaskStatus::Active))
            .filter(
                Expr::col(tasks::Column::CompletedSlots).lt(Expr::col(tasks::Column::TotalSlots)),
            )
            .order_by_desc(tasks::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_task(&self, task_id: i64) -> AppResult<TaskResponse> {
        tasks::Entity::find_by_id(task_id)
            .one(&*self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
    }

    pub async fn my_completions(&self, user_id: i64) -> AppResult<Vec<TaskCompletionResponse>> {
        let rows = completions::Entity::find()
            .filter(completions::Column::UserId.eq(user_id))
            .order_by_desc(completions::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn consume_slot<C: ConnectionTrait>(conn: &C, task: tasks::Model) -> AppResult<()> {
        let (completed, status) = fill_slot(&task);
        let task_id = task.id;
        let mut am = task.into_active_model();
        am.completed_slots = Set(completed);
        am.status = Set(status);
        am.updated_at = Set(Utc::now());
        am.update(conn).await?;
        if status == TaskStatus::Completed {
            log::info!("Task {task_id} filled all its slots");
        }
        Ok(())
    }

    async fn pay_reward<C: ConnectionTrait>(
        conn: &C,
        completion: &completions::Model,
        task_title: &str,
    ) -> AppResult<()> {
        WalletService::credit_with(
            conn,
            &LedgerEntry::new(
                completion.user_id,
                completion.reward_amount,
                TransactionType::TaskReward,
                format!("Reward for task: {task_title}"),
                Some(LedgerReference::new("task", completion.task_id)),
            ),
        )
        .await?;
        NotificationService::notify_with(
            conn,
            completion.user_id,
            NotificationType::RewardEarned,
            "Reward earned",
            format!(
                "You earned {} CB Points for completing \"{task_title}\"",
                completion.reward_amount
            ),
            Some("/wallet"),
        )
        .await
    }

    pub async fn complete_task(
        &self,
        user_id: i64,
        task_id: i64,
        req: CompleteTaskRequest,
    ) -> AppResult<CompleteTaskResponse> {
        let txn = self.pool.begin().await?;

        let task = tasks::Entity::find_by_id(task_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::TaskUnavailable(NOT_AVAILABLE.to_string()))?;
        if !task.is_available() {
            return Err(AppError::TaskUnavailable(NOT_AVAILABLE.to_string()));
        }

        let existing = completions::Entity::find()
            .filter(completions::Column::TaskId.eq(task_id))
            .filter(completions::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::TaskUnavailable(ALREADY_COMPLETED.to_string()));
        }

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let tier = VipService::find_level_with(&txn, user.vip_level).await?;
        let reward = compute_task_reward(task.reward_amount, multiplier_for(tier.as_ref()));

        let auto_approved = !task.requires_proof;
        let now = Utc::now();
        let completion = completions::ActiveModel {
            task_id: Set(task_id),
            user_id: Set(user_id),
            proof_url: Set(req.proof_url),
            proof_text: Set(req.proof_text),
            status: Set(if auto_approved {
                CompletionStatus::Approved
            } else {
                CompletionStatus::Pending
            }),
            reward_amount: Set(reward),
            reviewed_at: Set(auto_approved.then_some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::TaskUnavailable(ALREADY_COMPLETED.to_string())
            }
            _ => AppError::from(e),
        })?;

        if auto_approved {
            let title = task.title.clone();
            Self::consume_slot(&txn, task).await?;
            Self::pay_reward(&txn, &completion, &title).await?;
        }
        txn.commit().await?;

        // The completion is committed; follow-up bookkeeping must not undo it
        if let Err(e) = self.vip_service.check_upgrade(user_id).await {
            log::warn!("VIP check after task {task_id} failed for user {user_id}: {e}");
        }
        if let Err(e) = self.user_service.update_login_streak(user_id).await {
            log::warn!("Login streak update failed for user {user_id}: {e}");
        }

        Ok(CompleteTaskResponse {
            completion: completion.into(),
            auto_approved,
        })
    }

    pub async fn pending_completions(&self) -> AppResult<Vec<TaskCompletionResponse>> {
        let rows = completions::Entity::find()
            .filter(completions::Column::Status.eq(CompletionStatus::Pending))
            .order_by_asc(completions::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn lock_pending_completion<C: ConnectionTrait>(
        conn: &C,
        completion_id: i64,
    ) -> AppResult<completions::Model> {
        let completion = completions::Entity::find_by_id(completion_id)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Completion not found".to_string()))?;
        if completion.status != CompletionStatus::Pending {
            return Err(AppError::ValidationError(
                "Completion has already been reviewed".to_string(),
            ));
        }
        Ok(completion)
    }

    /// Approves a proof-backed completion: consumes a slot and pays the
    /// frozen reward.
    pub async fn approve_completion(
        &self,
        admin_id: i64,
        completion_id: i64,
    ) -> AppResult<TaskCompletionResponse> {
        let txn = self.pool.begin().await?;
        let completion = Self::lock_pending_completion(&txn, completion_id).await?;

        let task = tasks::Entity::find_by_id(completion.task_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::TaskUnavailable(NOT_AVAILABLE.to_string()))?;
        if !task.has_free_slot() {
            return Err(AppError::TaskUnavailable(
                "Task has no free slots left".to_string(),
            ));
        }

        let now = Utc::now();
        let mut am = completion.into_active_model();
        am.status = Set(CompletionStatus::Approved);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(now));
        am.updated_at = Set(now);
        let approved = am.update(&txn).await?;

        let title = task.title.clone();
        Self::consume_slot(&txn, task).await?;
        Self::pay_reward(&txn, &approved, &title).await?;
        txn.commit().await?;

        log::info!("Completion {completion_id} approved by admin {admin_id}");
        if let Err(e) = self.vip_service.check_upgrade(approved.user_id).await {
            log::warn!(
                "VIP check after approval {completion_id} failed for user {}: {e}",
                approved.user_id
            );
        }
        Ok(approved.into())
    }

    pub async fn reject_completion(
        &self,
        admin_id: i64,
        completion_id: i64,
        reason: String,
    ) -> AppResult<TaskCompletionResponse> {
        if reason.trim().is_empty() {
            return Err(AppError::ValidationError("Reason is required".to_string()));
        }
        let txn = self.pool.begin().await?;
        let completion = Self::lock_pending_completion(&txn, completion_id).await?;

        let now = Utc::now();
        let mut am = completion.into_active_model();
        am.status = Set(CompletionStatus::Rejected);
        am.reviewed_by = Set(Some(admin_id));
        am.reviewed_at = Set(Some(now));
        am.rejection_reason = Set(Some(reason));
        am.updated_at = Set(now);
        let rejected = am.update(&txn).await?;
        txn.commit().await?;

        log::info!("Completion {completion_id} rejected by admin {admin_id}");
        Ok(rejected.into())
    }

    pub async fn pending_tasks(&self) -> AppResult<Vec<TaskResponse>> {
        let rows = tasks::Entity::find()
            .filter(tasks::Column::Status.eq(TaskStatus::PendingApproval))
            .order_by_asc(tasks::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Admin decision on a task awaiting approval.
    pub async fn review_task(
        &self,
        admin_id: i64,
        task_id: i64,
        approve: bool,
        notes: Option<String>,
    ) -> AppResult<TaskResponse> {
        let task = tasks::Entity::find_by_id(task_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;
        if task.status != TaskStatus::PendingApproval {
            return Err(AppError::ValidationError(
                "Only tasks pending approval can be reviewed".to_string(),
            ));
        }
        if !approve && notes.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(AppError::ValidationError("Reason is required".to_string()));
        }

        let now = Utc::now();
        let mut am = task.into_active_model();
        am.status = Set(if approve {
            TaskStatus::Active
        } else {
            TaskStatus::Rejected
        });
        am.admin_notes = Set(notes);
        am.approved_by = Set(Some(admin_id));
        if approve {
            am.approved_at = Set(Some(now));
        }
        am.updated_at = Set(now);
        let updated = am.update(&*self.pool).await?;

        log::info!(
            "Task {task_id} {} by admin {admin_id}",
            if approve { "approved" } else { "rejected" }
        );
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{IntoPool, into_transaction_log};
    use crate::entities::{
        UserRole, notification_entity as notifications, transaction_entity as transactions,
        vip_level_entity as vip_levels, wallet_entity as wallets,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn task(completed: i32, total: i32, status: TaskStatus) -> tasks::Model {
        tasks::Model {
            id: 5,
            business_id: 1,
            title: "Follow us on X".to_string(),
            description: "Follow the account and keep notifications on".to_string(),
            category: None,
            reward_amount: 20,
            total_slots: total,
            completed_slots: completed,
            requires_proof: false,
            proof_instructions: None,
            task_url: None,
            task_image: None,
            status,
            admin_notes: None,
            approved_by: None,
            approved_at: None,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn completion(user_id: i64) -> completions::Model {
        completions::Model {
            id: 1,
            task_id: 5,
            user_id,
            proof_url: None,
            proof_text: None,
            status: CompletionStatus::Approved,
            reward_amount: 20,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(db: DbPool) -> TaskService {
        let wallet = WalletService::new(db.clone());
        TaskService::new(
            db.clone(),
            VipService::new(db.clone()),
            UserService::new(db, wallet),
        )
    }

    #[test]
    fn test_fill_slot_counts_up() {
        let (completed, status) = fill_slot(&task(3, 10, TaskStatus::Active));
        assert_eq!(completed, 4);
        assert_eq!(status, TaskStatus::Active);
    }

    #[test]
    fn test_last_slot_completes_task() {
        let (completed, status) = fill_slot(&task(9, 10, TaskStatus::Active));
        assert_eq!(completed, 10);
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_availability() {
        assert!(task(0, 1, TaskStatus::Active).is_available());
        assert!(!task(1, 1, TaskStatus::Active).is_available());
        assert!(!task(0, 1, TaskStatus::Paused).is_available());
    }

    #[tokio::test]
    async fn test_second_completion_is_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(1, 10, TaskStatus::Active)]])
            .append_query_results([vec![completion(7)]])
            .into_pool();

        let result = service(db)
            .complete_task(7, 5, CompleteTaskRequest::default())
            .await;
        match result {
            Err(AppError::TaskUnavailable(msg)) => assert_eq!(msg, "Task already completed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_task_is_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(10, 10, TaskStatus::Active)]])
            .into_pool();

        let result = service(db)
            .complete_task(7, 5, CompleteTaskRequest::default())
            .await;
        assert!(matches!(result, Err(AppError::TaskUnavailable(_))));
    }

    fn user(vip_level: i32) -> users::Model {
        users::Model {
            id: 7,
            open_id: "open-7".to_string(),
            name: None,
            email: None,
            phone: None,
            phone_verified: false,
            login_method: None,
            role: UserRole::User,
            vip_level,
            profile_image: None,
            referral_code: None,
            referred_by: None,
            two_factor_enabled: false,
            daily_login_streak: 0,
            last_login_date: None,
            is_active: true,
            is_suspended: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_signed_in: Utc::now(),
        }
    }

    fn silver() -> vip_levels::Model {
        vip_levels::Model {
            id: 3,
            level: 2,
            name: "Silver".to_string(),
            min_tasks: 50,
            min_earnings: 2500,
            task_reward_multiplier: 125,
            withdrawal_cooldown: 7,
            withdrawal_min_amount: 100,
            badge_image: None,
            benefits: None,
            created_at: Utc::now(),
        }
    }

    fn wallet(balance: i64) -> wallets::Model {
        wallets::Model {
            id: 1,
            user_id: 7,
            balance,
            total_earned: balance,
            total_withdrawn: 0,
            total_spent: 0,
            last_withdrawal_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_auto_approved_completion_pays_vip_adjusted_reward() {
        let mut approved = completion(7);
        approved.reward_amount = 25;
        let ledger = transactions::Model {
            id: 2,
            user_id: 7,
            transaction_type: TransactionType::TaskReward,
            amount: 25,
            balance_before: 0,
            balance_after: 25,
            description: None,
            reference_id: Some(5),
            reference_type: Some("task".to_string()),
            created_at: Utc::now(),
        };
        let notification = notifications::Model {
            id: 1,
            user_id: 7,
            notification_type: NotificationType::RewardEarned,
            title: "Reward earned".to_string(),
            message: String::new(),
            is_read: false,
            action_url: Some("/wallet".to_string()),
            created_at: Utc::now(),
        };
        // The VIP check and streak update that follow the commit run out of
        // mock results; their failures are only logged.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![task(3, 10, TaskStatus::Active)]])
            .append_query_results([Vec::<completions::Model>::new()])
            .append_query_results([vec![user(2)]])
            .append_query_results([vec![silver()]])
            .append_query_results([vec![approved]])
            .append_query_results([vec![task(4, 10, TaskStatus::Active)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([vec![wallet(0)]])
            .append_query_results([vec![wallet(25)]])
            .append_query_results([vec![ledger]])
            .append_query_results([vec![notification]])
            .into_pool();

        let result = service(db.clone())
            .complete_task(7, 5, CompleteTaskRequest::default())
            .await
            .unwrap();
        assert!(result.auto_approved);
        assert_eq!(result.completion.reward_amount, 25);

        let log = into_transaction_log(db);
        let completion_txn = format!("{:?}", log[0]);
        assert!(completion_txn.contains("task_reward"));
        assert!(completion_txn.contains("BigInt(Some(25))"));
        assert!(completion_txn.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_approval_needs_a_free_slot() {
        let mut pending = completion(7);
        pending.status = CompletionStatus::Pending;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending]])
            .append_query_results([vec![task(10, 10, TaskStatus::Completed)]])
            .into_pool();

        match service(db).approve_completion(1, 1).await {
            Err(AppError::TaskUnavailable(msg)) => assert_eq!(msg, "Task has no free slots left"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reviewed_completion_cannot_be_approved_again() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![completion(7)]])
            .into_pool();

        assert!(matches!(
            service(db).approve_completion(1, 1).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
