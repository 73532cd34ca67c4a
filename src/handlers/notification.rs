use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{NotificationService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Latest 50 notifications", body = [NotificationResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_notifications(
    user_service: web::Data<UserService>,
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(notification_service.list(user.id).await?))
}

#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(
        ("id" = i64, Path, description = "Notification id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Marked read", body = NotificationResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Notification not found")
    )
)]
pub async fn mark_read(
    user_service: web::Data<UserService>,
    notification_service: web::Data<NotificationService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(notification_service
        .mark_read(user.id, path.into_inner())
        .await?))
}

pub fn notification_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(list_notifications))
            .route("/{id}/read", web::put().to(mark_read)),
    );
}
