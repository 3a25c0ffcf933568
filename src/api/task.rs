use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use tracing::{error, info};
use utoipa::OpenApi;
use validator::Validate;

use crate::domain::auth::{self, AuthError};
use crate::domain::task::driving_ports::{TaskError, TaskPort};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    AuthErrorResponse, BearerToken, DisallowedFieldsResponse, Json, TaskErrorResponse,
    ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};

/// Defines the OpenAPI documentation for the task API
#[derive(OpenApi)]
#[openapi(paths(create_task, list_tasks, get_task, update_task, delete_task))]
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Adds the routes for the five task operations to the application router
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/tasks",
            post(
                |State(app_state): AppState,
                 credential: BearerToken,
                 Json(new_task): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    create_task(
                        credential,
                        new_task,
                        &mut ext_cxn,
                        &persistence::db_auth_driven_ports::DbCredentialResolver {},
                        &domain::task::TaskService {},
                    )
                    .await
                },
            ),
        )
        .route(
            "/tasks",
            get(
                |State(app_state): AppState,
                 credential: BearerToken,
                 Query(params): Query<dto::ListTasksParams>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    list_tasks(
                        credential,
                        params,
                        &mut ext_cxn,
                        &persistence::db_auth_driven_ports::DbCredentialResolver {},
                        &domain::task::TaskService {},
                    )
                    .await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            get(
                |State(app_state): AppState,
                 credential: BearerToken,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    get_task(
                        credential,
                        task_id,
                        &mut ext_cxn,
                        &persistence::db_auth_driven_ports::DbCredentialResolver {},
                        &domain::task::TaskService {},
                    )
                    .await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            patch(
                |State(app_state): AppState,
                 credential: BearerToken,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    update_task(
                        credential,
                        task_id,
                        update,
                        &mut ext_cxn,
                        &persistence::db_auth_driven_ports::DbCredentialResolver {},
                        &domain::task::TaskService {},
                    )
                    .await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            delete(
                |State(app_state): AppState,
                 credential: BearerToken,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();

                    delete_task(
                        credential,
                        task_id,
                        &mut ext_cxn,
                        &persistence::db_auth_driven_ports::DbCredentialResolver {},
                        &domain::task::TaskService {},
                    )
                    .await
                },
            ),
        )
}

/// Resolves the caller's identity from the request credential. Rejecting the request
/// here guarantees no task operation touches the store on behalf of an unauthenticated
/// caller.
async fn require_identity(
    credential: &BearerToken,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
) -> Result<i32, AuthErrorResponse> {
    let auth_result = auth::authenticate(&credential.0, &mut *ext_cxn, cred_resolve).await;
    match auth_result {
        Ok(user_id) => Ok(user_id),
        Err(auth_err) => {
            if let AuthError::PortError(ref port_err) = auth_err {
                error!("Credential resolution failure: {port_err}");
            }
            Err(AuthErrorResponse::from(auth_err))
        }
    }
}

/// Maps a task domain error onto an HTTP response, logging the failures worth a log line
fn task_error_response(context: &str, domain_err: TaskError) -> TaskErrorResponse {
    // "not found" is an expected outcome, it doesn't merit an error log
    if let TaskError::PortError(ref port_err) = domain_err {
        error!("{context}: {port_err}");
    }
    TaskErrorResponse::from(domain_err)
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task successfully created", body = dto::TaskData),
        (status = 400, description = "The task's description was blank"),
        (status = 401, description = "The request credential was missing or invalid"),
        (status = 500, description = "The data store was unavailable"),
    ),
)]
/// Creates a task owned by the caller
async fn create_task(
    credential: BearerToken,
    new_task: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::TaskData>), ErrorResponse> {
    let owner_id = require_identity(&credential, &mut *ext_cxn, cred_resolve).await?;
    info!("User {owner_id} creating a task: {new_task}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let domain_new_task = domain::task::NewTask::from(new_task);
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let create_result = task_service
        .create_task(owner_id, &domain_new_task, &mut *ext_cxn, &task_writer)
        .await;
    match create_result {
        Ok(task) => Ok((StatusCode::CREATED, Json(dto::TaskData::from(task)))),
        Err(domain_err) => Err(task_error_response("Task create failure", domain_err).into()),
    }
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASK_API_GROUP,
    params(dto::ListTasksParams),
    responses(
        (status = 200, description = "The caller's tasks matching the query", body = Vec<dto::TaskData>),
        (status = 401, description = "The request credential was missing or invalid"),
        (status = 500, description = "The data store was unavailable"),
    ),
)]
/// Lists the caller's tasks, filtered/sorted/windowed by the query parameters
async fn list_tasks(
    credential: BearerToken,
    params: dto::ListTasksParams,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::TaskData>>, ErrorResponse> {
    let owner_id = require_identity(&credential, &mut *ext_cxn, cred_resolve).await?;
    info!("Listing tasks for user {owner_id}");

    let task_query = domain::task::TaskQuery::from(params);
    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};

    let list_result = task_service
        .tasks_for_owner(owner_id, &task_query, &mut *ext_cxn, &task_reader)
        .await;
    match list_result {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(dto::TaskData::from).collect())),
        Err(domain_err) => Err(task_error_response("Task list failure", domain_err).into()),
    }
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to fetch")),
    responses(
        (status = 200, description = "The requested task", body = dto::TaskData),
        (status = 401, description = "The request credential was missing or invalid"),
        (status = 404, description = "The caller has no task with the given ID"),
        (status = 500, description = "The data store was unavailable"),
    ),
)]
/// Fetches one of the caller's tasks by ID
async fn get_task(
    credential: BearerToken,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskData>, ErrorResponse> {
    let owner_id = require_identity(&credential, &mut *ext_cxn, cred_resolve).await?;
    info!("Fetching task {task_id} for user {owner_id}");

    let task_reader = persistence::db_task_driven_ports::DbTaskReader {};
    let fetch_result = task_service
        .task_by_id(owner_id, task_id, &mut *ext_cxn, &task_reader)
        .await;
    match fetch_result {
        Ok(task) => Ok(Json(dto::TaskData::from(task))),
        Err(domain_err) => Err(task_error_response("Task fetch failure", domain_err).into()),
    }
}

#[utoipa::path(
    patch,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to update")),
    request_body = dto::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = dto::TaskData),
        (status = 400, description = "The update touched disallowed fields or contained invalid data"),
        (status = 401, description = "The request credential was missing or invalid"),
        (status = 404, description = "The caller has no task with the given ID"),
        (status = 500, description = "The data store was unavailable"),
    ),
)]
/// Applies a partial update to one of the caller's tasks. Only the description and
/// completion state may be modified; an update naming any other field is rejected
/// before it reaches the data store.
async fn update_task(
    credential: BearerToken,
    task_id: i32,
    update: dto::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskData>, ErrorResponse> {
    let owner_id = require_identity(&credential, &mut *ext_cxn, cred_resolve).await?;
    info!("User {owner_id} updating task {task_id}");

    if !update.unrecognized.is_empty() {
        let mut rejected_fields: Vec<String> = update.unrecognized.keys().cloned().collect();
        rejected_fields.sort_unstable();
        return Err(DisallowedFieldsResponse(rejected_fields).into());
    }
    update.validate().map_err(ValidationErrorResponse::from)?;

    let domain_update = domain::task::UpdateTask::from(update);
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};

    let update_result = task_service
        .update_task(owner_id, task_id, &domain_update, &mut *ext_cxn, &task_writer)
        .await;
    match update_result {
        Ok(task) => Ok(Json(dto::TaskData::from(task))),
        Err(domain_err) => Err(task_error_response("Task update failure", domain_err).into()),
    }
}

#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to delete")),
    responses(
        (status = 200, description = "The deleted task", body = dto::TaskData),
        (status = 401, description = "The request credential was missing or invalid"),
        (status = 404, description = "The caller has no task with the given ID"),
        (status = 500, description = "The data store was unavailable"),
    ),
)]
/// Deletes one of the caller's tasks, returning the record as it existed before deletion
async fn delete_task(
    credential: BearerToken,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    cred_resolve: &impl auth::driven_ports::ResolveCredential,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskData>, ErrorResponse> {
    let owner_id = require_identity(&credential, &mut *ext_cxn, cred_resolve).await?;
    info!("User {owner_id} deleting task {task_id}");

    let task_writer = persistence::db_task_driven_ports::DbTaskWriter {};
    let delete_result = task_service
        .delete_task(owner_id, task_id, &mut *ext_cxn, &task_writer)
        .await;
    match delete_result {
        Ok(task) => Ok(Json(dto::TaskData::from(task))),
        Err(domain_err) => Err(task_error_response("Task delete failure", domain_err).into()),
    }
}
