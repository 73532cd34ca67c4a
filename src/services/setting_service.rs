use crate::database::DbPool;
use crate::entities::setting_entity as settings;
use crate::error::{AppError, AppResult};
use crate::models::{SettingResponse, UpsertSettingRequest};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};

pub const REFERRAL_BONUS: &str = "referral_bonus";
pub const SPIN_DAILY_LIMIT: &str = "spin_daily_limit";

/// Keys read through `get_i64_with`
const INTEGER_KEYS: &[&str] = &[REFERRAL_BONUS, SPIN_DAILY_LIMIT];

/// Integer keys must hold a non-negative whole number; other keys are free text.
pub fn validate_setting_value(key: &str, value: &str) -> AppResult<()> {
    if !INTEGER_KEYS.contains(&key) {
        return Ok(());
    }
    match value.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(()),
        _ => Err(AppError::ValidationError(format!(
            "{key} must be a non-negative integer"
        ))),
    }
}

#[derive(Clone)]
pub struct SettingService {
    pool: DbPool,
}

impl SettingService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> AppResult<Vec<SettingResponse>> {
        let rows = settings::Entity::find()
            .order_by_asc(settings::Column::Key)
            .all(&*self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Integer setting, `default` when absent. A stored value that is not an
    /// integer is a configuration error, not a silent default.
    pub async fn get_i64_with<C: ConnectionTrait>(
        conn: &C,
        key: &str,
        default: i64,
    ) -> AppResult<i64> {
        let row = settings::Entity::find()
            .filter(settings::Column::Key.eq(key))
            .one(conn)
            .await?;
        match row {
            None => Ok(default),
            Some(row) => row.value.trim().parse::<i64>().map_err(|_| {
                AppError::InternalError(format!("setting {key} is not an integer: {}", row.value))
            }),
        }
    }

    pub async fn upsert(&self, admin_id: i64, req: UpsertSettingRequest) -> AppResult<SettingResponse> {
        let key = req.key.trim().to_string();
        if key.is_empty() {
            return Err(AppError::ValidationError("Setting key is required".to_string()));
        }
        validate_setting_value(&key, &req.value)?;

        let mut update_columns = vec![
            settings::Column::Value,
            settings::Column::UpdatedBy,
            settings::Column::UpdatedAt,
        ];
        if req.description.is_some() {
            update_columns.push(settings::Column::Description);
        }

        let saved = settings::Entity::insert(settings::ActiveModel {
            key: Set(key.clone()),
            value: Set(req.value),
            description: Set(req.description),
            updated_by: Set(Some(admin_id)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(settings::Column::Key)
                .update_columns(update_columns)
                .to_owned(),
        )
        .exec_with_returning(&*self.pool)
        .await?;

        log::info!("Setting {key} updated by admin {admin_id}");
        Ok(saved.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IntoPool;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn setting(value: &str) -> settings::Model {
        settings::Model {
            id: 1,
            key: REFERRAL_BONUS.to_string(),
            value: value.to_string(),
            description: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_i64_reads_value_or_default() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![setting("7")], vec![]])
            .into_connection();

        assert_eq!(SettingService::get_i64_with(&db, REFERRAL_BONUS, 5).await.unwrap(), 7);
        assert_eq!(SettingService::get_i64_with(&db, REFERRAL_BONUS, 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_get_i64_rejects_garbage() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![setting("five")]])
            .into_connection();

        assert!(SettingService::get_i64_with(&db, REFERRAL_BONUS, 5).await.is_err());
    }

    #[test]
    fn test_integer_keys_are_validated() {
        assert!(validate_setting_value(REFERRAL_BONUS, "10").is_ok());
        assert!(validate_setting_value(SPIN_DAILY_LIMIT, " 0 ").is_ok());
        assert!(validate_setting_value(REFERRAL_BONUS, "-5").is_err());
        assert!(validate_setting_value(SPIN_DAILY_LIMIT, "three").is_err());
        assert!(validate_setting_value("platform_name", "CashBucks").is_ok());
    }

    #[tokio::test]
    async fn test_upsert_refuses_non_integer_bonus() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_pool();
        let result = SettingService::new(db)
            .upsert(
                1,
                UpsertSettingRequest {
                    key: REFERRAL_BONUS.to_string(),
                    value: "ten".to_string(),
                    description: None,
                },
            )
            .await;
        match result {
            Err(AppError::ValidationError(msg)) => {
                assert_eq!(msg, "referral_bonus must be a non-negative integer")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
