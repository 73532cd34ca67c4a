use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{BusinessService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/business/profile",
    operation_id = "get_business_profile",
    tag = "business",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own business profile, null if none", body = BusinessResponse),
        (status = 403, description = "Not a business account")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    business_service: web::Data<BusinessService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Business).await?;
    Ok(ok(business_service.get_profile(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/business/profile",
    tag = "business",
    request_body = CreateBusinessRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Business profile created", body = BusinessResponse),
        (status = 400, description = "Invalid name or profile exists"),
        (status = 403, description = "Not a business account")
    )
)]
pub async fn create_profile(
    user_service: web::Data<UserService>,
    business_service: web::Data<BusinessService>,
    req: HttpRequest,
    request: web::Json<CreateBusinessRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Business).await?;
    Ok(ok(business_service
        .create_profile(user.id, request.into_inner())
        .await?))
}

#[utoipa::path(
    get,
    path = "/business/tasks",
    tag = "business",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own tasks, newest first", body = [TaskResponse]),
        (status = 404, description = "Business profile not found")
    )
)]
pub async fn list_tasks(
    user_service: web::Data<UserService>,
    business_service: web::Data<BusinessService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Business).await?;
    Ok(ok(business_service.list_tasks(user.id).await?))
}

#[utoipa::path(
    post,
    path = "/business/tasks",
    tag = "business",
    request_body = CreateTaskRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task submitted for approval", body = TaskResponse),
        (status = 400, description = "Invalid task"),
        (status = 404, description = "Business profile not found")
    )
)]
pub async fn create_task(
    user_service: web::Data<UserService>,
    business_service: web::Data<BusinessService>,
    req: HttpRequest,
    request: web::Json<CreateTaskRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Business).await?;
    Ok(ok(business_service
        .create_task(user.id, request.into_inner())
        .await?))
}

#[utoipa::path(
    put,
    path = "/business/tasks/{id}",
    tag = "business",
    params(
        ("id" = i64, Path, description = "Task id")
    ),
    request_body = UpdateTaskRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Status change not allowed"),
        (status = 403, description = "Task belongs to another business")
    )
)]
pub async fn update_task(
    user_service: web::Data<UserService>,
    business_service: web::Data<BusinessService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateTaskRequest>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Business).await?;
    Ok(ok(business_service
        .update_task(user.id, path.into_inner(), request.into_inner())
        .await?))
}

pub fn business_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/business")
            .route("/profile", web::get().to(get_profile))
            .route("/profile", web::post().to(create_profile))
            .route("/tasks", web::get().to(list_tasks))
            .route("/tasks", web::post().to(create_task))
            .route("/tasks/{id}", web::put().to(update_task)),
    );
}
