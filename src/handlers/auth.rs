use super::{current_user_id, ok};
use crate::error::AppResult;
use crate::models::*;
use crate::services::{AuthService, LoginContext};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

pub const IDENTITY_SECRET_HEADER: &str = "X-Identity-Secret";

fn login_context(req: &HttpRequest) -> LoginContext {
    LoginContext {
        ip_address: req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

#[utoipa::path(
    post,
    path = "/auth/session",
    tag = "auth",
    request_body = SessionRequest,
    params(
        ("X-Identity-Secret" = String, Header, description = "Shared secret of the identity provider")
    ),
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Unknown identity provider"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn create_session(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<SessionRequest>,
) -> AppResult<HttpResponse> {
    let secret = req
        .headers()
        .get(IDENTITY_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    auth_service.verify_identity_secret(secret)?;
    let response = auth_service
        .sign_in(request.into_inner(), login_context(&req))
        .await?;
    Ok(ok(response))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = AuthResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh_token(
    auth_service: web::Data<AuthService>,
    request: web::Json<RefreshTokenRequest>,
) -> AppResult<HttpResponse> {
    Ok(ok(auth_service.refresh(&request.refresh_token).await?))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user, null when anonymous", body = UserResponse)
    )
)]
pub async fn me(auth_service: web::Data<AuthService>, req: HttpRequest) -> AppResult<HttpResponse> {
    Ok(ok(auth_service.me(current_user_id(&req)).await?))
}

/// Tokens are stateless; the client drops them.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out")
    )
)]
pub async fn logout() -> AppResult<HttpResponse> {
    Ok(ok(json!({ "logged_out": true })))
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/session", web::post().to(create_session))
            .route("/refresh", web::post().to(refresh_token))
            .route("/me", web::get().to(me))
            .route("/logout", web::post().to(logout)),
    );
}
