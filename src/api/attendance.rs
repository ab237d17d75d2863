use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::{
    Attendance, AttendanceFilter, AttendanceSummary, CheckInOut, CreateAttendance, SummaryRange,
    UpdateAttendance,
};
use crate::service::AttendanceService;
use crate::store::Pagination;

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
}

/* =========================
Create attendance (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = CreateAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 400, description = "Attendance already exists for the day or invalid times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn create_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<CreateAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let record = service.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(record))
}

/* =========================
List attendance
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance records", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let mut filter = query.into_inner();

    // Employees only ever see their own records
    if !auth.role.is_hr_or_admin() {
        let own = auth.employee_id()?;
        if filter.employee_id.is_some_and(|id| id != own) {
            return Err(AppError::Forbidden(
                "Not allowed to access another employee's records".into(),
            )
            .into());
        }
        filter.employee_id = Some(own);
    }

    let page = Pagination::new(filter.page, filter.per_page);
    filter.page = Some(page.page);
    filter.per_page = Some(page.per_page);

    let data = service.list(&filter).await?;
    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance record", body = Attendance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record = service.find(path.into_inner()).await?;
    auth.require_access_to(record.employee_id)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    patch,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Attendance updated", body = Attendance),
        (status = 400, description = "Invalid times"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Modified concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let record = service
        .update(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 204, description = "Attendance deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    service.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/* =========================
Check-in / check-out
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body(content = CheckInOut, description = "Optional location and notes"),
    responses(
        (status = 200, description = "Checked in", body = Attendance),
        (status = 400, description = "Already checked in today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: Option<web::Json<CheckInOut>>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let input = payload.map(web::Json::into_inner).unwrap_or_default();
    let record = service.check_in(employee_id, input).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body(content = CheckInOut, description = "Optional location and notes"),
    responses(
        (status = 200, description = "Checked out", body = Attendance),
        (status = 400, description = "No check-in today or already checked out"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: Option<web::Json<CheckInOut>>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let input = payload.map(web::Json::into_inner).unwrap_or_default();
    let record = service.check_out(employee_id, input).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/attendance/summary/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        SummaryRange
    ),
    responses(
        (status = 200, description = "Attendance summary", body = AttendanceSummary),
        (status = 400, description = "end_date before start_date"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    range: web::Query<SummaryRange>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_access_to(employee_id)?;
    let summary = service
        .summary(employee_id, range.start_date, range.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
