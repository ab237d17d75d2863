use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_balance::{BalanceQuery, LeaveBalance};
use crate::model::leave_request::{
    ApproveLeave, CreateLeaveRequest, LeaveRequest, LeaveRequestFilter, RejectLeave,
    UpdateLeaveRequest,
};
use crate::service::LeaveWorkflow;
use crate::store::Pagination;

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
}

/* =========================
Create leave request
========================= */
/// Files a request for the caller, or for `employee_id` when HR/Admin.
#[utoipa::path(
    post,
    path = "/api/leaves/requests",
    request_body(
        content = CreateLeaveRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequest),
        (status = 400, description = "Invalid range, policy limit or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    payload: web::Json<CreateLeaveRequest>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let employee_id = match payload.employee_id {
        Some(id) if auth.employee_id != Some(id) => {
            auth.require_hr_or_admin()?;
            id
        }
        Some(id) => id,
        None => auth.employee_id()?,
    };

    let request = workflow.create(employee_id, payload).await?;
    Ok(HttpResponse::Created().json(request))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves/requests",
    params(LeaveRequestFilter),
    responses(
        (status = 200, description = "Leave requests, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    query: web::Query<LeaveRequestFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();

    // Employees only ever see their own requests
    if !auth.role.is_hr_or_admin() {
        let own = auth.employee_id()?;
        if filter.employee_id.is_some_and(|id| id != own) {
            return Err(AppError::Forbidden(
                "Not allowed to access another employee's leave requests".into(),
            )
            .into());
        }
        filter.employee_id = Some(own);
    }

    let page = Pagination::new(filter.page, filter.per_page);
    filter.page = Some(page.page);
    filter.per_page = Some(page.per_page);

    let data = workflow.list(&filter).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/api/leaves/requests/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = workflow.find(path.into_inner()).await?;
    auth.require_access_to(request.employee_id)?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    patch,
    path = "/api/leaves/requests/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body = UpdateLeaveRequest,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Not pending, invalid range or policy limit"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveRequest>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let current = workflow.find(leave_id).await?;
    auth.require_access_to(current.employee_id)?;

    let request = workflow.update(leave_id, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/requests/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = ApproveLeave, description = "Optional review notes"),
    responses(
        (status = 200, description = "Leave approved, balance consumed", body = LeaveRequest),
        (status = 400, description = "Not pending or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: Option<web::Json<ApproveLeave>>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let notes = payload.and_then(|p| p.into_inner().notes);
    let request = workflow
        .approve(path.into_inner(), auth.user_id, notes)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves/requests/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Not pending or missing reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let request = workflow
        .reject(path.into_inner(), auth.user_id, payload.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    post,
    path = "/api/leaves/requests/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 400, description = "Not pending"),
        (status = 403, description = "Not the requesting employee"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let request = workflow.cancel(path.into_inner(), employee_id).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    get,
    path = "/api/leaves/balances/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "One balance per active leave type", body = [LeaveBalance]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;
    let balances = workflow.balances(employee_id, query.year).await?;
    Ok(HttpResponse::Ok().json(balances))
}
