use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{UserService, WalletService, WithdrawalService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/wallet/balance",
    tag = "wallet",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Wallet balance and lifetime totals", body = WalletResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_balance(
    user_service: web::Data<UserService>,
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(wallet_service.get_balance(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/wallet/transactions",
    tag = "wallet",
    params(
        ("limit" = Option<u64>, Query, description = "Default 50, at most 200")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ledger entries, newest first", body = [TransactionResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_transactions(
    user_service: web::Data<UserService>,
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    query: web::Query<LimitQuery>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    let limit = query.resolve(50, 200);
    Ok(ok(wallet_service.list_transactions(user.id, limit).await?))
}

#[utoipa::path(
    post,
    path = "/wallet/withdraw",
    tag = "wallet",
    request_body = WithdrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Withdrawal queued for review", body = WithdrawalResponse),
        (status = 400, description = "Insufficient balance, below tier minimum or in cooldown"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn request_withdrawal(
    user_service: web::Data<UserService>,
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
    request: web::Json<WithdrawRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(withdrawal_service
        .request_withdrawal(user.id, request.into_inner())
        .await?))
}

#[utoipa::path(
    get,
    path = "/wallet/withdrawals",
    tag = "wallet",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own withdrawals, newest first", body = [WithdrawalResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_withdrawals(
    user_service: web::Data<UserService>,
    withdrawal_service: web::Data<WithdrawalService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(withdrawal_service.list_for_user(user.id).await?))
}

pub fn wallet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("/balance", web::get().to(get_balance))
            .route("/transactions", web::get().to(list_transactions))
            .route("/withdraw", web::post().to(request_withdrawal))
            .route("/withdrawals", web::get().to(list_withdrawals)),
    );
}
