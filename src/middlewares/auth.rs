use crate::entities::{UserRole, user_entity as users};
use crate::error::AppError;
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

/// Authenticated caller, placed in request extensions by [`AuthMiddleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUserId(pub i64);

/// What a procedure demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    Admin,
    /// Business owners; admins pass as well
    Business,
}

impl Capability {
    pub fn permits(self, user: Option<&users::Model>) -> bool {
        match self {
            Capability::Public => true,
            Capability::Authenticated => user.is_some_and(|u| u.can_sign_in()),
            Capability::Admin => user.is_some_and(|u| u.can_sign_in() && u.is_admin()),
            Capability::Business => user.is_some_and(|u| {
                u.can_sign_in() && matches!(u.role, UserRole::Business | UserRole::Admin)
            }),
        }
    }
}

// Paths reachable without a token. A valid token is still honoured there.
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/api/v1/auth/session",
                "/api/v1/auth/refresh",
                "/api/v1/auth/me",
                "/api/v1/auth/logout",
                "/api/v1/vip/levels",
                "/api/v1/referrals/leaderboard",
                "/api/v1/spin/rewards",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        self.exact_paths.contains(&path)
            || self
                .prefix_paths
                .iter()
                .any(|&prefix| path.starts_with(prefix))
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let public = self.public_paths.is_public_path(req.path());
        let verified = bearer_token(&req).map(|token| {
            self.jwt_service
                .verify_access_token(token)
                .and_then(|claims| claims.user_id())
        });

        match verified {
            Some(Ok(user_id)) => {
                req.extensions_mut().insert(CurrentUserId(user_id));
                Box::pin(self.service.call(req))
            }
            Some(Err(_)) | None if public => Box::pin(self.service.call(req)),
            Some(Err(_)) => {
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            None => {
                let error = AppError::AuthError("Missing access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpRequest, HttpResponse, web};
    use chrono::Utc;

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<CurrentUserId>() {
            Some(CurrentUserId(id)) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    fn jwt() -> JwtService {
        JwtService::new("middleware-test-secret", 3600, 86400)
    }

    fn user(role: UserRole, suspended: bool) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: 1,
            open_id: "oidc|1".into(),
            name: None,
            email: None,
            phone: None,
            phone_verified: false,
            login_method: None,
            role,
            vip_level: 0,
            profile_image: None,
            referral_code: None,
            referred_by: None,
            two_factor_enabled: false,
            daily_login_streak: 0,
            last_login_date: None,
            is_active: true,
            is_suspended: suspended,
            created_at: now,
            updated_at: now,
            last_signed_in: now,
        }
    }

    #[actix_web::test]
    async fn test_protected_path_requires_token() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/wallet/balance", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/wallet/balance")
            .to_request();
        let err = actix_test::try_call_service(&app, req).await.err().unwrap();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_valid_token_sets_current_user() {
        let jwt = jwt();
        let token = jwt.generate_access_token(42, "oidc|42").unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/wallet/balance", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/wallet/balance")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "42");
    }

    #[actix_web::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let jwt = jwt();
        let token = jwt.generate_refresh_token(42, "oidc|42").unwrap();
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .route("/api/v1/wallet/balance", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/wallet/balance")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        assert!(actix_test::try_call_service(&app, req).await.is_err());
    }

    #[actix_web::test]
    async fn test_public_path_allows_anonymous_and_bad_tokens() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt()))
                .route("/api/v1/auth/me", web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get().uri("/api/v1/auth/me").to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "anonymous");

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        assert_eq!(actix_test::call_and_read_body(&app, req).await, "anonymous");
    }

    #[test]
    fn test_capability_predicate() {
        let member = user(UserRole::User, false);
        let admin = user(UserRole::Admin, false);
        let business = user(UserRole::Business, false);
        let suspended_admin = user(UserRole::Admin, true);

        assert!(Capability::Public.permits(None));
        assert!(!Capability::Authenticated.permits(None));
        assert!(Capability::Authenticated.permits(Some(&member)));
        assert!(!Capability::Authenticated.permits(Some(&suspended_admin)));

        assert!(Capability::Admin.permits(Some(&admin)));
        assert!(!Capability::Admin.permits(Some(&member)));
        assert!(!Capability::Admin.permits(Some(&suspended_admin)));

        assert!(Capability::Business.permits(Some(&business)));
        assert!(Capability::Business.permits(Some(&admin)));
        assert!(!Capability::Business.permits(Some(&member)));
    }
}
