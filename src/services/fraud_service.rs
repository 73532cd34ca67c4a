use crate::database::DbPool;
use crate::entities::{FraudSeverity, fraud_log_entity as fraud_logs};
use crate::error::{AppError, AppResult};
use crate::models::{CreateFraudLogRequest, FraudLogResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

#[derive(Clone)]
pub struct FraudService {
    pool: DbPool,
}

impl FraudService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, admin_id: i64, req: CreateFraudLogRequest) -> AppResult<FraudLogResponse> {
        if req.fraud_type.trim().is_empty() {
            return Err(AppError::ValidationError("Fraud type is required".to_string()));
        }
        let evidence = req
            .evidence_data
            .map(|v| serde_json::to_string(&v))
            .transpose()?;
        let severity = req.severity.unwrap_or(FraudSeverity::Medium);

        let created = fraud_logs::ActiveModel {
            user_id: Set(req.user_id),
            fraud_type: Set(req.fraud_type.trim().to_string()),
            severity: Set(severity),
            description: Set(req.description),
            ip_address: Set(req.ip_address),
            evidence_data: Set(evidence),
            ..Default::default()
        }
        .insert(&*self.pool)
        .await?;

        log::warn!(
            "Fraud flag {} raised by admin {admin_id}: user={}, type={}, severity={severity:?}",
            created.id,
            created.user_id,
            created.fraud_type
        );
        Ok(created.into())
    }

    pub async fn list(&self, unresolved_only: bool) -> AppResult<Vec<FraudLogResponse>> {
        let mut query = fraud_logs::Entity::find();
        if unresolved_only {
            query = query.filter(fraud_logs::Column::ResolvedAt.is_null());
        }
        let rows = query
            .order_by_desc(fraud_logs::Column::CreatedAt)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn resolve(
        &self,
        admin_id: i64,
        log_id: i64,
        action_taken: String,
    ) -> AppResult<FraudLogResponse> {
        if action_taken.trim().is_empty() {
            return Err(AppError::ValidationError("Action taken is required".to_string()));
        }
        let entry = fraud_logs::Entity::find_by_id(log_id)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Fraud log not found".to_string()))?;
        if entry.resolved_at.is_some() {
            return Err(AppError::ValidationError(
                "Fraud log is already resolved".to_string(),
            ));
        }
        let mut am = entry.into_active_model();
        am.action_taken = Set(Some(action_taken));
        am.resolved_by = Set(Some(admin_id));
        am.resolved_at = Set(Some(Utc::now()));
        let resolved = am.update(&*self.pool).await?;
        log::info!("Fraud log {log_id} resolved by admin {admin_id}");
        Ok(resolved.into())
    }
}
