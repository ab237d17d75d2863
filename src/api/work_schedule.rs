use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::model::work_schedule::{CreateWorkSchedule, UpdateWorkSchedule, WorkSchedule};
use crate::service::ScheduleService;

#[utoipa::path(
    post,
    path = "/api/attendance/work-schedules",
    request_body = CreateWorkSchedule,
    responses(
        (status = 201, description = "Work schedule created", body = WorkSchedule),
        (status = 400, description = "Invalid schedule"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work schedule"
)]
pub async fn create_schedule(
    auth: AuthUser,
    service: web::Data<ScheduleService>,
    payload: web::Json<CreateWorkSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let schedule = service.create(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(schedule))
}

#[utoipa::path(
    get,
    path = "/api/attendance/work-schedules",
    responses(
        (status = 200, description = "All work schedules", body = [WorkSchedule])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work schedule"
)]
pub async fn list_schedules(
    _auth: AuthUser,
    service: web::Data<ScheduleService>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.list().await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/work-schedules/{id}",
    params(
        ("id" = u64, Path, description = "Work schedule id")
    ),
    responses(
        (status = 200, description = "Work schedule", body = WorkSchedule),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work schedule"
)]
pub async fn get_schedule(
    _auth: AuthUser,
    service: web::Data<ScheduleService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.find(path.into_inner()).await?))
}

#[utoipa::path(
    patch,
    path = "/api/attendance/work-schedules/{id}",
    params(
        ("id" = u64, Path, description = "Work schedule id")
    ),
    request_body = UpdateWorkSchedule,
    responses(
        (status = 200, description = "Work schedule updated", body = WorkSchedule),
        (status = 400, description = "Invalid schedule"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work schedule"
)]
pub async fn update_schedule(
    auth: AuthUser,
    service: web::Data<ScheduleService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateWorkSchedule>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let schedule = service
        .update(path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(schedule))
}

#[utoipa::path(
    delete,
    path = "/api/attendance/work-schedules/{id}",
    params(
        ("id" = u64, Path, description = "Work schedule id")
    ),
    responses(
        (status = 204, description = "Work schedule deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Work schedule"
)]
pub async fn delete_schedule(
    auth: AuthUser,
    service: web::Data<ScheduleService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    service.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::model::role::Role;
    use crate::test_support::{bearer, peer, services, wire};

    #[actix_web::test]
    async fn schedules_are_managed_by_hr_and_use_hh_mm() {
        let s = services();
        let app = test::init_service(App::new().configure(wire(&s))).await;
        let body = json!({
            "name": "Office",
            "start_time": "09:00",
            "end_time": "18:00",
            "break_minutes": 60,
            "work_days": ["Mon", "Tue", "Wed", "Thu", "Fri"],
            "department_id": 10,
            "is_default": true
        });

        let req = test::TestRequest::post()
            .uri("/api/attendance/work-schedules")
            .peer_addr(peer())
            .insert_header(bearer(Role::Employee, Some(1)))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/attendance/work-schedules")
            .peer_addr(peer())
            .insert_header(bearer(Role::Hr, None))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["start_time"], "09:00");

        let req = test::TestRequest::get()
            .uri(&format!("/api/attendance/work-schedules/{}", created["id"]))
            .peer_addr(peer())
            .insert_header(bearer(Role::Employee, Some(1)))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["name"], "Office");
        assert_eq!(fetched["work_days"], json!(["Mon", "Tue", "Wed", "Thu", "Fri"]));
    }
}
