use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{ReferralService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile with wallet, VIP tier and referral count", body = ProfileResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(user_service.get_profile(user.id).await?))
}

#[utoipa::path(
    put,
    path = "/user/profile",
    tag = "user",
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid name or phone"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(user_service
        .update_profile(user.id, request.into_inner())
        .await?))
}

#[utoipa::path(
    post,
    path = "/user/generate-referral-code",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Referral code, stable once issued", body = ReferralCodeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn generate_referral_code(
    user_service: web::Data<UserService>,
    referral_service: web::Data<ReferralService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(referral_service.generate_code(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/user/apply-referral-code",
    tag = "user",
    request_body = ApplyReferralCodeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Referral recorded and referrer paid"),
        (status = 400, description = "Self-referral or code already used"),
        (status = 404, description = "Invalid referral code")
    )
)]
pub async fn apply_referral_code(
    user_service: web::Data<UserService>,
    referral_service: web::Data<ReferralService>,
    req: HttpRequest,
    request: web::Json<ApplyReferralCodeRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(referral_service.redeem(user.id, &request.code).await?))
}

#[utoipa::path(
    get,
    path = "/user/dashboard-stats",
    tag = "user",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn dashboard_stats(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(user_service.dashboard_stats(user.id).await?))
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::put().to(update_profile))
            .route("/generate-referral-code", web::post().to(generate_referral_code))
            .route("/apply-referral-code", web::post().to(apply_referral_code))
            .route("/dashboard-stats", web::get().to(dashboard_stats)),
    );
}
