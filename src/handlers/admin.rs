use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{
    AdminService, FraudService, SettingService, TaskService, UserService, WalletService,
    WithdrawalService,
};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/admin/stats",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Platform counters", body = AdminStats),
        (status = 403, description = "Admin only")
    )
)]
pub async fn stats(
    user_service: web::Data<UserService>,
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(admin_service.stats().await?))
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "Page, from 1"),
        ("per_page" = Option<u32>, Query, description = "Page size, at most 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Users, newest first"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(user_service.list_users(&query.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = AdminUpdateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "VIP level out of range"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<AdminUpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(user_service
        .admin_update_user(admin.id, path.into_inner(), request.into_inner())
        .await?))
}

#[utoipa::path(
    get,
    path = "/admin/tasks/pending",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tasks awaiting approval", body = [TaskResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn pending_tasks(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(task_service.pending_tasks().await?))
}

#[utoipa::path(
    post,
    path = "/admin/tasks/{id}/approve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Task id")
    ),
    request_body = ReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task activated", body = TaskResponse),
        (status = 400, description = "Task is not pending approval"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn approve_task(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: Option<web::Json<ReviewRequest>>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    let notes = request.and_then(|r| r.into_inner().notes);
    Ok(ok(task_service
        .review_task(admin.id, path.into_inner(), true, notes)
        .await?))
}

#[utoipa::path(
    post,
    path = "/admin/tasks/{id}/reject",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Task id")
    ),
    request_body = ReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task rejected", body = TaskResponse),
        (status = 400, description = "Task is not pending approval"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn reject_task(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: Option<web::Json<ReviewRequest>>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    let notes = request.and_then(|r| r.into_inner().notes);
    Ok(ok(task_service
        .review_task(admin.id, path.into_inner(), false, notes)
        .await?))
}

#[utoipa::path(
    get,
    path = "/admin/completions/pending",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Completions awaiting review", body = [TaskCompletionResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn pending_completions(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(task_service.pending_completions().await?))
}

#[utoipa::path(
    post,
    path = "/admin/completions/{id}/approve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Completion id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Completion approved and reward credited", body = TaskCompletionResponse),
        (status = 400, description = "Not pending or no free slot"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn approve_completion(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(task_service
        .approve_completion(admin.id, path.into_inner())
        .await?))
}

#[utoipa::path(
    post,
    path = "/admin/completions/{id}/reject",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Completion id")
    ),
    request_body = RejectRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Completion rejected", body = TaskCompletionResponse),
        (status = 400, description = "Completion is not pending"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn reject_completion(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(task_service
        .reject_completion(admin.id, path.into_inner(), request.into_inner().reason)
        .await?))
}

#[utoipa::path(
    get,
    path = "/admin/withdrawals/pending",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Withdrawals awaiting review", body = [WithdrawalResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn pending_withdrawals(
    user_service: web::Data<UserService>,
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(withdrawal_service.list_pending().await?))
}

#[utoipa::path(
    post,
    path = "/admin/withdrawals/{id}/approve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Withdrawal id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paid out", body = WithdrawalResponse),
        (status = 400, description = "Not pending or insufficient balance"),
        (status = 502, description = "Payment rail refused the transfer")
    )
)]
pub async fn approve_withdrawal(
    user_service: web::Data<UserService>,
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(withdrawal_service
        .approve_withdrawal(admin.id, path.into_inner())
        .await?))
}

#[utoipa::path(
    post,
    path = "/admin/withdrawals/{id}/reject",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Withdrawal id")
    ),
    request_body = RejectRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Withdrawal rejected", body = WithdrawalResponse),
        (status = 400, description = "Withdrawal is not pending"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn reject_withdrawal(
    user_service: web::Data<UserService>,
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<RejectRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(withdrawal_service
        .reject_withdrawal(admin.id, path.into_inner(), request.into_inner().reason)
        .await?))
}

#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All settings", body = [SettingResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_settings(
    user_service: web::Data<UserService>,
    setting_service: web::Data<SettingService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(setting_service.get_all().await?))
}

#[utoipa::path(
    put,
    path = "/admin/settings",
    tag = "admin",
    request_body = UpsertSettingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Setting stored", body = SettingResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn upsert_setting(
    user_service: web::Data<UserService>,
    setting_service: web::Data<SettingService>,
    req: HttpRequest,
    request: web::Json<UpsertSettingRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(setting_service
        .upsert(admin.id, request.into_inner())
        .await?))
}

#[utoipa::path(
    post,
    path = "/admin/wallet/adjust",
    tag = "admin",
    request_body = AdjustWalletRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Adjustment booked", body = TransactionResponse),
        (status = 400, description = "Invalid amount or insufficient balance"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn adjust_wallet(
    user_service: web::Data<UserService>,
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    request: web::Json<AdjustWalletRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    let AdjustWalletRequest {
        user_id,
        direction,
        amount,
        description,
    } = request.into_inner();
    Ok(ok(wallet_service
        .admin_adjust(
            admin.id,
            user_id,
            direction == AdjustmentDirection::Credit,
            amount,
            description,
        )
        .await?))
}

#[utoipa::path(
    get,
    path = "/admin/wallet/{user_id}/audit",
    tag = "admin",
    params(
        ("user_id" = i64, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stored balance against the replayed ledger", body = LedgerAuditResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn audit_wallet(
    user_service: web::Data<UserService>,
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(wallet_service.audit(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/admin/fraud-logs",
    tag = "admin",
    request_body = CreateFraudLogRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Fraud flag recorded", body = FraudLogResponse),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_fraud_log(
    user_service: web::Data<UserService>,
    fraud_service: web::Data<FraudService>,
    req: HttpRequest,
    request: web::Json<CreateFraudLogRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(fraud_service.create(admin.id, request.into_inner()).await?))
}

#[utoipa::path(
    get,
    path = "/admin/fraud-logs",
    tag = "admin",
    params(
        ("unresolved_only" = Option<bool>, Query, description = "Only open flags")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Fraud flags, newest first", body = [FraudLogResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_fraud_logs(
    user_service: web::Data<UserService>,
    fraud_service: web::Data<FraudService>,
    req: HttpRequest,
    query: web::Query<FraudLogQuery>,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(fraud_service.list(query.unresolved_only).await?))
}

#[utoipa::path(
    post,
    path = "/admin/fraud-logs/{id}/resolve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Fraud log id")
    ),
    request_body = ResolveFraudLogRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Flag resolved", body = FraudLogResponse),
        (status = 400, description = "Already resolved"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn resolve_fraud_log(
    user_service: web::Data<UserService>,
    fraud_service: web::Data<FraudService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ResolveFraudLogRequest>,
) -> AppResult<HttpResponse> {
    let admin = authorize(&req, &user_service, Capability::Admin).await?;
    Ok(ok(fraud_service
        .resolve(admin.id, path.into_inner(), request.into_inner().action_taken)
        .await?))
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(stats))
            .route("/users", web::get().to(list_users))
            .route("/users/{id}", web::put().to(update_user))
            .route("/tasks/pending", web::get().to(pending_tasks))
            .route("/tasks/{id}/approve", web::post().to(approve_task))
            .route("/tasks/{id}/reject", web::post().to(reject_task))
            .route("/completions/pending", web::get().to(pending_completions))
            .route("/completions/{id}/approve", web::post().to(approve_completion))
            .route("/completions/{id}/reject", web::post().to(reject_completion))
            .route("/withdrawals/pending", web::get().to(pending_withdrawals))
            .route("/withdrawals/{id}/approve", web::post().to(approve_withdrawal))
            .route("/withdrawals/{id}/reject", web::post().to(reject_withdrawal))
            .route("/settings", web::get().to(list_settings))
            .route("/settings", web::put().to(upsert_setting))
            .route("/wallet/adjust", web::post().to(adjust_wallet))
            .route("/wallet/{user_id}/audit", web::get().to(audit_wallet))
            .route("/fraud-logs", web::post().to(create_fraud_log))
            .route("/fraud-logs", web::get().to(list_fraud_logs))
            .route("/fraud-logs/{id}/resolve", web::post().to(resolve_fraud_log)),
    );
}
