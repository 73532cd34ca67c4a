use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{SpinService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/spin/rewards",
    tag = "spin",
    responses(
        (status = 200, description = "Active wheel segments", body = [SpinRewardResponse])
    )
)]
pub async fn list_rewards(spin_service: web::Data<SpinService>) -> AppResult<HttpResponse> {
    Ok(ok(spin_service.list_rewards().await?))
}

#[utoipa::path(
    post,
    path = "/spin",
    tag = "spin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Drawn reward", body = SpinResultResponse),
        (status = 400, description = "No rewards available or daily limit reached"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn spin(
    user_service: web::Data<UserService>,
    spin_service: web::Data<SpinService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(spin_service.spin(user.id).await?))
}

#[utoipa::path(
    get,
    path = "/spin/history",
    tag = "spin",
    params(
        ("limit" = Option<u64>, Query, description = "Default 20, at most 100")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own spins, newest first", body = [SpinHistoryResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn history(
    user_service: web::Data<UserService>,
    spin_service: web::Data<SpinService>,
    req: HttpRequest,
    query: web::Query<LimitQuery>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(spin_service.history(user.id, query.resolve(20, 100)).await?))
}

pub fn spin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/spin")
            .route("", web::post().to(spin))
            .route("/rewards", web::get().to(list_rewards))
            .route("/history", web::get().to(history)),
    );
}
