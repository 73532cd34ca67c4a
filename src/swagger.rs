use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    CompletionStatus, FraudSeverity, NotificationType, SpinRewardType, TaskStatus,
    TransactionType, UserRole, WithdrawalStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::create_session,
        handlers::auth::refresh_token,
        handlers::auth::me,
        handlers::auth::logout,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::generate_referral_code,
        handlers::user::apply_referral_code,
        handlers::user::dashboard_stats,
        handlers::wallet::get_balance,
        handlers::wallet::list_transactions,
        handlers::wallet::request_withdrawal,
        handlers::wallet::list_withdrawals,
        handlers::task::list_available,
        handlers::task::get_task,
        handlers::task::complete_task,
        handlers::task::my_completions,
        handlers::vip::list_levels,
        handlers::vip::my_status,
        handlers::vip::check_upgrade,
        handlers::referral::my_referrals,
        handlers::referral::leaderboard,
        handlers::spin::list_rewards,
        handlers::spin::spin,
        handlers::spin::history,
        handlers::notification::list_notifications,
        handlers::notification::mark_read,
        handlers::business::get_profile,
        handlers::business::create_profile,
        handlers::business::list_tasks,
        handlers::business::create_task,
        handlers::business::update_task,
        handlers::admin::stats,
        handlers::admin::list_users,
        handlers::admin::update_user,
        handlers::admin::pending_tasks,
        handlers::admin::approve_task,
        handlers::admin::reject_task,
        handlers::admin::pending_completions,
        handlers::admin::approve_completion,
        handlers::admin::reject_completion,
        handlers::admin::pending_withdrawals,
        handlers::admin::approve_withdrawal,
        handlers::admin::reject_withdrawal,
        handlers::admin::list_settings,
        handlers::admin::upsert_setting,
        handlers::admin::adjust_wallet,
        handlers::admin::audit_wallet,
        handlers::admin::create_fraud_log,
        handlers::admin::list_fraud_logs,
        handlers::admin::resolve_fraud_log,
    ),
    components(
        schemas(
            UserRole,
            TransactionType,
            WithdrawalStatus,
            TaskStatus,
            CompletionStatus,
            FraudSeverity,
            SpinRewardType,
            NotificationType,
            SessionRequest,
            RefreshTokenRequest,
            AuthResponse,
            UserResponse,
            UpdateProfileRequest,
            ProfileResponse,
            DashboardStats,
            ApplyReferralCodeRequest,
            ReferralCodeResponse,
            WalletResponse,
            TransactionResponse,
            WithdrawRequest,
            WithdrawalResponse,
            AdjustmentDirection,
            AdjustWalletRequest,
            LedgerAuditResponse,
            TaskResponse,
            TaskCompletionResponse,
            CompleteTaskRequest,
            CompleteTaskResponse,
            CreateTaskRequest,
            UpdateTaskRequest,
            ReviewRequest,
            RejectRequest,
            VipLevelResponse,
            VipStatusResponse,
            VipUpgradeResponse,
            ReferredUser,
            ReferralResponse,
            MyReferralsResponse,
            LeaderboardEntry,
            SpinRewardResponse,
            SpinResultResponse,
            SpinHistoryResponse,
            NotificationResponse,
            BusinessResponse,
            CreateBusinessRequest,
            AdminStats,
            AdminUpdateUserRequest,
            SettingResponse,
            UpsertSettingRequest,
            FraudLogResponse,
            CreateFraudLogRequest,
            ResolveFraudLogRequest,
            PaginationParams,
            LimitQuery,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Identity-provider sessions and tokens"),
        (name = "user", description = "Profile, dashboard and referral codes"),
        (name = "wallet", description = "Balance, ledger and withdrawals"),
        (name = "tasks", description = "Task marketplace"),
        (name = "vip", description = "VIP tiers"),
        (name = "referrals", description = "Referral programme"),
        (name = "spin", description = "Spin & Win"),
        (name = "notifications", description = "In-app notifications"),
        (name = "business", description = "Business task publishing"),
        (name = "admin", description = "Platform administration"),
    ),
    info(
        title = "CashBucks API",
        version = "1.0.0",
        description = "CashBucks rewards and task marketplace REST API"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
