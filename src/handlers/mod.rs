pub mod admin;
pub mod auth;
pub mod business;
pub mod notification;
pub mod referral;
pub mod spin;
pub mod task;
pub mod user;
pub mod vip;
pub mod wallet;

pub use admin::admin_config;
pub use auth::auth_config;
pub use business::business_config;
pub use notification::notification_config;
pub use referral::referral_config;
pub use spin::spin_config;
pub use task::task_config;
pub use user::user_config;
pub use vip::vip_config;
pub use wallet::wallet_config;

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::middlewares::{Capability, CurrentUserId};
use crate::services::UserService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::json;

pub(crate) fn current_user_id(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<CurrentUserId>().map(|id| id.0)
}

/// Loads the caller and checks it against `capability`.
pub(crate) async fn authorize(
    req: &HttpRequest,
    user_service: &UserService,
    capability: Capability,
) -> AppResult<users::Model> {
    let user_id = current_user_id(req)
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;
    let user = user_service
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
    if !user.can_sign_in() {
        return Err(AppError::Forbidden);
    }
    if !capability.permits(Some(&user)) {
        return Err(AppError::PermissionDenied);
    }
    Ok(user)
}

pub(crate) fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": data
    }))
}
