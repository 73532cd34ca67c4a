use crate::config::IdentityConfig;
use crate::database::DbPool;
use crate::entities::{UserRole, login_log_entity as login_logs, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, SessionRequest, UserResponse};
use crate::services::WalletService;
use crate::utils::JwtService;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};

/// Where a sign-in came from, as seen by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct LoginContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    jwt_service: JwtService,
    identity: IdentityConfig,
}

impl AuthService {
    pub fn new(pool: DbPool, jwt_service: JwtService, identity: IdentityConfig) -> Self {
        Self {
            pool,
            jwt_service,
            identity,
        }
    }

    /// Only the identity provider knows the shared secret. An unset secret
    /// refuses every caller.
    pub fn verify_identity_secret(&self, presented: Option<&str>) -> AppResult<()> {
        let expected = self.identity.shared_secret.as_str();
        match presented {
            Some(secret) if !expected.is_empty() && secret == expected => Ok(()),
            _ => Err(AppError::AuthError("Invalid identity secret".to_string())),
        }
    }

    fn is_owner(&self, open_id: &str) -> bool {
        self.identity
            .owner_open_id
            .as_deref()
            .is_some_and(|owner| owner == open_id)
    }

    /// Inserts or refreshes the user keyed by `open_id`. Only fields the
    /// provider sent overwrite stored values.
    async fn upsert_user<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        req: &SessionRequest,
    ) -> AppResult<users::Model> {
        let now = Utc::now();
        let mut am = users::ActiveModel {
            open_id: Set(req.open_id.clone()),
            last_signed_in: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let mut overwrite = vec![users::Column::LastSignedIn, users::Column::UpdatedAt];
        if let Some(name) = &req.name {
            am.name = Set(Some(name.clone()));
            overwrite.push(users::Column::Name);
        }
        if let Some(email) = &req.email {
            am.email = Set(Some(email.clone()));
            overwrite.push(users::Column::Email);
        }
        if let Some(method) = &req.login_method {
            am.login_method = Set(Some(method.clone()));
            overwrite.push(users::Column::LoginMethod);
        }
        if self.is_owner(&req.open_id) {
            am.role = Set(UserRole::Admin);
            overwrite.push(users::Column::Role);
        }

        Ok(users::Entity::insert(am)
            .on_conflict(
                OnConflict::column(users::Column::OpenId)
                    .update_columns(overwrite)
                    .to_owned(),
            )
            .exec_with_returning(conn)
            .await?)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, &user.open_id)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &user.open_id)?;
        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user: UserResponse::from(user),
        })
    }

    pub async fn sign_in(&self, req: SessionRequest, ctx: LoginContext) -> AppResult<AuthResponse> {
        if req.open_id.trim().is_empty() {
            return Err(AppError::ValidationError("open_id is required".to_string()));
        }

        let txn = self.pool.begin().await?;
        let user = self.upsert_user(&txn, &req).await?;
        if !user.can_sign_in() {
            return Err(AppError::Forbidden);
        }
        WalletService::ensure_wallet_with(&txn, user.id).await?;

        let seen_before = login_logs::Entity::find()
            .filter(login_logs::Column::UserId.eq(user.id))
            .filter(match &ctx.user_agent {
                Some(ua) => login_logs::Column::UserAgent.eq(ua.clone()),
                None => login_logs::Column::UserAgent.is_null(),
            })
            .count(&txn)
            .await?;
        login_logs::ActiveModel {
            user_id: Set(user.id),
            ip_address: Set(ctx.ip_address),
            user_agent: Set(ctx.user_agent),
            login_method: Set(req.login_method.clone()),
            is_new_device: Set(seen_before == 0),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        if seen_before == 0 {
            log::info!("User {} signed in from a new device", user.id);
        }
        self.issue_tokens(user)
    }

    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user = users::Entity::find_by_id(claims.user_id()?)
            .one(&*self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        if !user.can_sign_in() {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }
        self.issue_tokens(user)
    }

    /// Anonymous callers get `None` rather than an error.
    pub async fn me(&self, user_id: Option<i64>) -> AppResult<Option<UserResponse>> {
        let Some(id) = user_id else {
            return Ok(None);
        };
        Ok(users::Entity::find_by_id(id)
            .one(&*self.pool)
            .await?
            .map(UserResponse::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::IntoPool;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(secret: &str, owner: Option<&str>) -> AuthService {
        AuthService::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_pool(),
            JwtService::new("test-secret", 3600, 86400),
            IdentityConfig {
                owner_open_id: owner.map(str::to_string),
                shared_secret: secret.to_string(),
            },
        )
    }

    #[test]
    fn test_identity_secret_check() {
        let svc = service("s3cret", None);
        assert!(svc.verify_identity_secret(Some("s3cret")).is_ok());
        assert!(svc.verify_identity_secret(Some("wrong")).is_err());
        assert!(svc.verify_identity_secret(None).is_err());
    }

    #[test]
    fn test_empty_secret_refuses_everyone() {
        let svc = service("", None);
        assert!(svc.verify_identity_secret(Some("")).is_err());
    }

    #[test]
    fn test_owner_detection() {
        let svc = service("s", Some("oidc|owner"));
        assert!(svc.is_owner("oidc|owner"));
        assert!(!svc.is_owner("oidc|someone"));
        assert!(!service("s", None).is_owner("oidc|owner"));
    }

    #[tokio::test]
    async fn test_me_is_none_when_anonymous() {
        let svc = service("s", None);
        assert!(svc.me(None).await.unwrap().is_none());
    }
}
