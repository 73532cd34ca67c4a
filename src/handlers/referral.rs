use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{ReferralService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/referrals/mine",
    tag = "referrals",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own code and referred users", body = MyReferralsResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_referrals(
    user_service: web::Data<UserService>,
    referral_service: web::Data<ReferralService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(referral_service.my_referrals(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/referrals/leaderboard",
    tag = "referrals",
    params(
        ("limit" = Option<u64>, Query, description = "Default 10, at most 100")
    ),
    responses(
        (status = 200, description = "Top referrers", body = [LeaderboardEntry])
    )
)]
pub async fn leaderboard(
    referral_service: web::Data<ReferralService>,
    query: web::Query<LimitQuery>,
) -> AppResult<HttpResponse> {
    Ok(ok(referral_service.leaderboard(query.resolve(10, 100)).await?))
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/referrals")
            .route("/mine", web::get().to(my_referrals))
            .route("/leaderboard", web::get().to(leaderboard)),
    );
}
