use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::model::leave_policy::{
    CreateLeavePolicy, LeavePolicy, LeavePolicyQuery, UpdateLeavePolicy,
};
use crate::service::LeaveCatalog;

#[utoipa::path(
    post,
    path = "/api/leaves/policies",
    request_body = CreateLeavePolicy,
    responses(
        (status = 201, description = "Leave policy created", body = LeavePolicy),
        (status = 400, description = "Invalid policy"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave type not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave policy"
)]
pub async fn create_policy(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    payload: web::Json<CreateLeavePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let policy = catalog.create_policy(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(policy))
}

#[utoipa::path(
    get,
    path = "/api/leaves/policies",
    params(LeavePolicyQuery),
    responses(
        (status = 200, description = "Leave policies", body = [LeavePolicy])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave policy"
)]
pub async fn list_policies(
    _auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    query: web::Query<LeavePolicyQuery>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(catalog.list_policies(query.leave_type_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/leaves/policies/{id}",
    params(
        ("id" = u64, Path, description = "Leave policy id")
    ),
    responses(
        (status = 200, description = "Leave policy", body = LeavePolicy),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave policy"
)]
pub async fn get_policy(
    _auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(catalog.find_policy(path.into_inner()).await?))
}

#[utoipa::path(
    patch,
    path = "/api/leaves/policies/{id}",
    params(
        ("id" = u64, Path, description = "Leave policy id")
    ),
    request_body = UpdateLeavePolicy,
    responses(
        (status = 200, description = "Leave policy updated", body = LeavePolicy),
        (status = 400, description = "Invalid policy"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave policy"
)]
pub async fn update_policy(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeavePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let policy = catalog
        .update_policy(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(policy))
}

#[utoipa::path(
    delete,
    path = "/api/leaves/policies/{id}",
    params(
        ("id" = u64, Path, description = "Leave policy id")
    ),
    responses(
        (status = 204, description = "Leave policy deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave policy"
)]
pub async fn delete_policy(
    auth: AuthUser,
    catalog: web::Data<LeaveCatalog>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    catalog.delete_policy(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
