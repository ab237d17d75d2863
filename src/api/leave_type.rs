use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::model::leave_type::{CreateLeaveType, LeaveType, LeaveTypeQuery, UpdateLeaveType};
use crate::service::LeaveCatalog;

#[utoipa::path(
    post,
    path = "/api/leaves/types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = LeaveType),
        (status = 400, description = "Invalid or duplicate code"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    payload: web::Json<CreateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave_type = catalog.create_type(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(leave_type))
}

#[utoipa::path(
    get,
    path = "/api/leaves/types",
    params(LeaveTypeQuery),
    responses(
        (status = 200, description = "Leave types", body = [LeaveType])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    query: web::Query<LeaveTypeQuery>,
) -> actix_web::Result<impl Responder> {
    let types = catalog
        .list_types(query.include_inactive.unwrap_or(false))
        .await?;
    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    get,
    path = "/api/leaves/types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type id")
    ),
    responses(
        (status = 200, description = "Leave type", body = LeaveType),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn get_leave_type(
    _auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(catalog.find_type(path.into_inner()).await?))
}

#[utoipa::path(
    patch,
    path = "/api/leaves/types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type id")
    ),
    request_body = UpdateLeaveType,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn update_leave_type(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave_type = catalog
        .update_type(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(leave_type))
}

/// Soft delete: the type is deactivated, not removed.
#[utoipa::path(
    delete,
    path = "/api/leaves/types/{id}",
    params(
        ("id" = u64, Path, description = "Leave type id")
    ),
    responses(
        (status = 200, description = "Leave type deactivated", body = LeaveType),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave type"
)]
pub async fn delete_leave_type(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let leave_type = catalog.deactivate_type(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave_type))
}
