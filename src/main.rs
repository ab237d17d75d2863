use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod store;
#[cfg(test)]
mod test_support;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::db::init_db;
use crate::docs::ApiDoc;
use crate::service::{
    AttendanceService, LeaveBalanceLedger, LeaveCatalog, LeaveWorkflow, ScheduleService,
};
use crate::store::MySqlStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config).await?;
    let store = Arc::new(MySqlStore::new(pool));
    let clock = Arc::new(SystemClock);

    let schedules = ScheduleService::new(store.clone(), store.clone());
    let attendance = AttendanceService::new(store.clone(), schedules.clone(), clock.clone());
    let ledger = LeaveBalanceLedger::new(store.clone());
    let leave = LeaveWorkflow::new(store.clone(), ledger, store.clone(), clock);
    let catalog = LeaveCatalog::new(store);

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, prefix = %config.api_prefix, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(schedules.clone()))
            .app_data(Data::new(attendance.clone()))
            .app_data(Data::new(leave.clone()))
            .app_data(Data::new(catalog.clone()))
            // Protected routes with auth and rate limiting
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
