use crate::database::DbPool;
use crate::entities::{referral_entity as referrals, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{VipService, WalletService};
use crate::utils::{format_kenyan_phone, validate_payout_phone};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Streak after a login at `now`, counted in whole elapsed days since the
/// previous login: exactly one day extends it, the same day keeps it, any
/// longer gap restarts at 1.
pub fn next_login_streak(current: i32, last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(last) = last_login else {
        return 1;
    };
    match (now - last).num_days() {
        1 => current + 1,
        0 => current,
        _ => 1,
    }
}

#[derive(Clone)]
pub struct UserService {
    pool: DbPool,
    wallet_service: WalletService,
}

impl UserService {
    pub fn new(pool: DbPool, wallet_service: WalletService) -> Self {
        Self {
            pool,
            wallet_service,
        }
    }

    pub async fn find_user(&self, user_id: i64) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find_by_id(user_id).one(&*self.pool).await?)
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<users::Model> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn referral_count(&self, user_id: i64) -> AppResult<u64> {
        Ok(referrals::Entity::find()
            .filter(referrals::Column::ReferrerId.eq(user_id))
            .count(&*self.pool)
            .await?)
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let user = self.get_user(user_id).await?;
        let wallet = self.wallet_service.get_or_create_wallet(user_id).await?;
        let vip = VipService::find_level_with(&*self.pool, user.vip_level).await?;
        let referral_count = self.referral_count(user_id).await?;

        Ok(ProfileResponse {
            user: user.into(),
            wallet: wallet.into(),
            vip: vip.map(Into::into),
            referral_count,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        req: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        req.validate()?;
        if req.name.is_none() && req.phone.is_none() && req.profile_image.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut am = self.get_user(user_id).await?.into_active_model();
        if let Some(name) = req.name {
            am.name = Set(Some(name.trim().to_string()));
        }
        if let Some(phone) = req.phone {
            validate_payout_phone(&phone)?;
            am.phone = Set(Some(format_kenyan_phone(&phone)));
            // A changed number has to be verified again
            am.phone_verified = Set(false);
        }
        if let Some(image) = req.profile_image {
            am.profile_image = Set(Some(image));
        }
        am.updated_at = Set(Utc::now());
        Ok(am.update(&*self.pool).await?.into())
    }

    pub async fn dashboard_stats(&self, user_id: i64) -> AppResult<DashboardStats> {
        let user = self.get_user(user_id).await?;
        let wallet = self.wallet_service.get_or_create_wallet(user_id).await?;
        let approved_tasks = VipService::approved_task_count(&*self.pool, user_id).await?;
        let referral_count = self.referral_count(user_id).await?;

        Ok(DashboardStats {
            balance: wallet.balance,
            total_earned: wallet.total_earned,
            approved_tasks,
            referral_count,
            vip_level: user.vip_level,
            daily_login_streak: user.daily_login_streak,
        })
    }

    pub async fn update_login_streak(&self, user_id: i64) -> AppResult<i32> {
        let user = self.get_user(user_id).await?;
        let now = Utc::now();
        let streak = next_login_streak(user.daily_login_streak, user.last_login_date, now);

        let mut am = user.into_active_model();
        am.daily_login_streak = Set(streak);
        am.last_login_date = Set(Some(now));
        am.update(&*self.pool).await?;
        Ok(streak)
    }

    /// Newest users first
    pub async fn list_users(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        let total = users::Entity::find().count(&*self.pool).await?;
        let rows = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&*self.pool)
            .await?;
        let items = rows.into_iter().map(UserResponse::from).collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn admin_update_user(
        &self,
        admin_id: i64,
        user_id: i64,
        req: AdminUpdateUserRequest,
    ) -> AppResult<UserResponse> {
        req.validate()?;
        let mut am = self.get_user(user_id).await?.into_active_model();
        if let Some(level) = req.vip_level {
            am.vip_level = Set(level);
        }
        if let Some(active) = req.is_active {
            am.is_active = Set(active);
        }
        if let Some(suspended) = req.is_suspended {
            am.is_suspended = Set(suspended);
        }
        if let Some(role) = req.role {
            am.role = Set(role);
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&*self.pool).await?;
        log::info!("User {user_id} updated by admin {admin_id}");
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_first_login_starts_streak() {
        assert_eq!(next_login_streak(0, None, Utc::now()), 1);
    }

    #[test]
    fn test_next_day_extends_streak() {
        let now = Utc::now();
        assert_eq!(next_login_streak(4, Some(now - Duration::hours(30)), now), 5);
    }

    #[test]
    fn test_same_day_keeps_streak() {
        let now = Utc::now();
        assert_eq!(next_login_streak(4, Some(now - Duration::hours(3)), now), 4);
    }

    #[test]
    fn test_gap_resets_streak() {
        let now = Utc::now();
        assert_eq!(next_login_streak(9, Some(now - Duration::days(3)), now), 1);
    }
}
