use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{UserService, VipService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/vip/levels",
    tag = "vip",
    responses(
        (status = 200, description = "All tiers in ascending order", body = [VipLevelResponse])
    )
)]
pub async fn list_levels(vip_service: web::Data<VipService>) -> AppResult<HttpResponse> {
    Ok(ok(vip_service.list_levels().await?))
}

#[utoipa::path(
    get,
    path = "/vip/mine",
    tag = "vip",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current tier and progress to the next", body = VipStatusResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_status(
    user_service: web::Data<UserService>,
    vip_service: web::Data<VipService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(vip_service.status(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/vip/check-upgrade",
    tag = "vip",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Upgrade result", body = VipUpgradeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn check_upgrade(
    user_service: web::Data<UserService>,
    vip_service: web::Data<VipService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(vip_service.check_upgrade(user.id).await?))
}

pub fn vip_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vip")
            .route("/levels", web::get().to(list_levels))
            .route("/mine", web::get().to(my_status))
            .route("/check-upgrade", web::post().to(check_upgrade)),
    );
}
