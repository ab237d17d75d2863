use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

use super::auth::AuthUser;
use super::jwt::verify_access_token;
use crate::config::Config;
use crate::model::role::Role;

fn unauthorized(req: ServiceRequest, body: serde_json::Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

/// Verifies the bearer token and stores the caller as `AuthUser`.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_owned(),
            Err(_) => {
                return Ok(unauthorized(
                    req,
                    json!({
                        "code": "UNAUTHORIZED",
                        "message": "Invalid Authorization header encoding"
                    }),
                ));
            }
        },
        None => {
            return Ok(unauthorized(
                req,
                json!({"code": "UNAUTHORIZED", "message": "Missing Authorization header"}),
            ));
        }
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        return Ok(unauthorized(
            req,
            json!({
                "code": "UNAUTHORIZED",
                "message": "Authorization header must start with Bearer"
            }),
        ));
    };

    let claims = match verify_access_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Rejected bearer token");
            return Ok(unauthorized(
                req,
                json!({"code": "UNAUTHORIZED", "message": "Invalid or expired token"}),
            ));
        }
    };

    let Some(role) = Role::from_id(claims.role) else {
        return Ok(unauthorized(
            req,
            json!({"code": "UNAUTHORIZED", "message": "Invalid role"}),
        ));
    };

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
    });

    next.call(req).await
}
