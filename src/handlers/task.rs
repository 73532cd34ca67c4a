use super::{authorize, ok};
use crate::error::AppResult;
use crate::middlewares::Capability;
use crate::models::*;
use crate::services::{TaskService, UserService};
use actix_web::{HttpRequest, HttpResponse, web};

#[utoipa::path(
    get,
    path = "/tasks/available",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Active tasks with free slots", body = [TaskResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_available(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(task_service.list_available().await?))
}

#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Task", body = TaskResponse),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(task_service.get_task(path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/tasks/{id}/complete",
    tag = "tasks",
    params(
        ("id" = i64, Path, description = "Task id")
    ),
    request_body = CompleteTaskRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Completion recorded", body = CompleteTaskResponse),
        (status = 400, description = "Task unavailable or already completed"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn complete_task(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: Option<web::Json<CompleteTaskRequest>>,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    let proof = request.map(|r| r.into_inner()).unwrap_or_default();
    Ok(ok(task_service
        .complete_task(user.id, path.into_inner(), proof)
        .await?))
}

#[utoipa::path(
    get,
    path = "/tasks/my-completions",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own completions, newest first", body = [TaskCompletionResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn my_completions(
    user_service: web::Data<UserService>,
    task_service: web::Data<TaskService>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let user = authorize(&req, &user_service, Capability::Authenticated).await?;
    Ok(ok(task_service.my_completions(user.id).await?))
}

pub fn task_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("/available", web::get().to(list_available))
            .route("/my-completions", web::get().to(my_completions))
            .route("/{id}", web::get().to(get_task))
            .route("/{id}/complete", web::post().to(complete_task)),
    );
}
