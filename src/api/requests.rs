// src/api/requests.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::db::models::notification::{Notification, Recipient, Severity};
use crate::db::models::requests::{
    HrRequest, NewHrRequest, Outcome, RequestCategory, RequestStatus, SetStatusPayload,
};
use crate::db::models::user::{Principal, Role};
use crate::utils::api_response::ApiResponse;
use crate::workflow::orchestrator;

pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/all", get(get_all_requests))
        .route("/requests/subordinates", get(get_subordinate_requests))
        .route("/requests/user/{user_id}", get(get_user_requests))
        .route(
            "/requests/{request_id}",
            get(get_request_by_id).delete(delete_request),
        )
        .route("/requests/{request_id}/status", patch(update_request_status))
}

#[utoipa::path(
    post,
    path = "/requests",
    request_body = NewHrRequest,
    responses(
        (status = 201, description = "Request created in PENDING", body = HrRequest),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn create_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<NewHrRequest>,
) -> Result<ApiResponse<HrRequest>, ApiResponse<()>> {
    let request = orchestrator::create_request(&state, &principal, payload).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "Request created",
        request,
    ))
}

#[utoipa::path(
    get,
    path = "/requests/all",
    responses(
        (status = 200, description = "Every request, newest first", body = Vec<HrRequest>),
        (status = 403, description = "Caller is not an admin")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_all_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Vec<HrRequest>>, ApiResponse<()>> {
    if principal.role != Role::Admin {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Admin access required",
            None,
        ));
    }
    let requests = state.store.list_all().await.map_err(storage_error)?;
    Ok(ApiResponse::success(StatusCode::OK, "All requests", requests))
}

#[utoipa::path(
    get,
    path = "/requests/subordinates",
    responses(
        (status = 200, description = "Requests of the chef's declared subordinates", body = Vec<HrRequest>),
        (status = 403, description = "Caller is not a chef")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_subordinate_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<ApiResponse<Vec<HrRequest>>, ApiResponse<()>> {
    if principal.role != Role::Chef {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "Chef access required",
            None,
        ));
    }
    let subordinates = state
        .subordinates_of(principal.id)
        .await
        .map_err(storage_error)?;
    let requests = state
        .store
        .list_for_owners(&subordinates)
        .await
        .map_err(storage_error)?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Subordinate requests",
        requests,
    ))
}

#[utoipa::path(
    get,
    path = "/requests/user/{user_id}",
    params(("user_id" = i32, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Requests owned by the user", body = Vec<HrRequest>),
        (status = 403, description = "Caller is neither the owner nor an admin")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_user_requests(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i32>,
) -> Result<ApiResponse<Vec<HrRequest>>, ApiResponse<()>> {
    if principal.id != user_id && principal.role != Role::Admin {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "You may only list your own requests",
            None,
        ));
    }
    let requests = state
        .store
        .list_for_owner(user_id)
        .await
        .map_err(storage_error)?;
    Ok(ApiResponse::success(StatusCode::OK, "User requests", requests))
}

#[utoipa::path(
    get,
    path = "/requests/{request_id}",
    params(("request_id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request retrieved", body = HrRequest),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn get_request_by_id(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<i32>,
) -> Result<ApiResponse<HrRequest>, ApiResponse<()>> {
    let request = state
        .store
        .find_by_id(request_id)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| ApiResponse::error(StatusCode::NOT_FOUND, "Request not found", None))?;

    let visible = match principal.role {
        Role::Admin => true,
        Role::Employee => request.user_id == principal.id,
        Role::Chef => {
            request.user_id == principal.id
                || state
                    .subordinates_of(principal.id)
                    .await
                    .map_err(storage_error)?
                    .contains(&request.user_id)
        }
    };
    if !visible {
        return Err(ApiResponse::error(
            StatusCode::FORBIDDEN,
            "You do not have access to this request",
            None,
        ));
    }

    Ok(ApiResponse::success(StatusCode::OK, "Request retrieved", request))
}

#[utoipa::path(
    patch,
    path = "/requests/{request_id}/status",
    params(("request_id" = i32, Path, description = "Request id")),
    request_body = SetStatusPayload,
    responses(
        (status = 200, description = "Transition committed", body = HrRequest),
        (status = 400, description = "Missing observation text"),
        (status = 403, description = "Role, category or supervision mismatch"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already advanced past this decision")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn update_request_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<i32>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<ApiResponse<HrRequest>, ApiResponse<()>> {
    let updated = orchestrator::set_status(&state, &principal, request_id, payload).await?;
    Ok(ApiResponse::success(
        StatusCode::OK,
        "Request status updated",
        updated,
    ))
}

#[utoipa::path(
    delete,
    path = "/requests/{request_id}",
    params(("request_id" = i32, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Request not found")
    ),
    tag = "Requests",
    security(("bearerAuth" = []))
)]
pub async fn delete_request(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<i32>,
) -> Result<ApiResponse<()>, ApiResponse<()>> {
    orchestrator::delete_request(&state, &principal, request_id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "Request deleted", ()))
}

fn storage_error(e: crate::db::store::StoreError) -> ApiResponse<()> {
    ApiResponse::from(crate::workflow::WorkflowError::from(e))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_request,
        get_all_requests,
        get_subordinate_requests,
        get_user_requests,
        get_request_by_id,
        update_request_status,
        delete_request
    ),
    components(schemas(
        HrRequest,
        NewHrRequest,
        SetStatusPayload,
        RequestCategory,
        RequestStatus,
        Outcome,
        Notification,
        Recipient,
        Severity
    )),
    tags(
        (name = "Requests", description = "HR request workflow endpoints")
    )
)]
pub struct RequestDoc;
