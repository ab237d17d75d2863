//! Service graph over `MemoryStore` and a fixed clock, plus request helpers
//! for handler tests.

use std::sync::Arc;

use actix_web::web::{self, Data};
use chrono::{NaiveDate, NaiveDateTime};
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::auth::jwt::{Claims, TokenType};
use crate::clock::FixedClock;
use crate::config::Config;
use crate::model::leave_type::CreateLeaveType;
use crate::model::role::Role;
use crate::model::work_schedule::{CreateWorkSchedule, WorkDays};
use crate::routes;
use crate::service::{
    AttendanceService, LeaveBalanceLedger, LeaveCatalog, LeaveWorkflow, ScheduleService,
};
use crate::store::MemoryStore;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestServices {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub schedules: ScheduleService,
    pub attendance: AttendanceService,
    pub ledger: LeaveBalanceLedger,
    pub leave: LeaveWorkflow,
    pub catalog: LeaveCatalog,
}

/// Fresh store; the clock starts Monday 2024-06-03 08:00.
pub fn services() -> TestServices {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(at(2024, 6, 3, 8, 0, 0)));

    let schedules = ScheduleService::new(store.clone(), store.clone());
    let attendance = AttendanceService::new(store.clone(), schedules.clone(), clock.clone());
    let ledger = LeaveBalanceLedger::new(store.clone());
    let leave = LeaveWorkflow::new(store.clone(), ledger.clone(), store.clone(), clock.clone());
    let catalog = LeaveCatalog::new(store.clone());

    TestServices {
        store,
        clock,
        schedules,
        attendance,
        ledger,
        leave,
        catalog,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, mi, s).unwrap()
}

/// 09:00-18:00 with a 60 minute break, Monday to Friday.
pub fn schedule_input(
    name: &str,
    employee_id: Option<u64>,
    department_id: Option<u64>,
    position_id: Option<u64>,
    is_default: bool,
) -> CreateWorkSchedule {
    CreateWorkSchedule {
        name: name.to_string(),
        start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: chrono::NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        break_minutes: 60,
        work_days: Some(WorkDays::MONDAY_TO_FRIDAY),
        employee_id,
        department_id,
        position_id,
        is_default,
    }
}

pub fn leave_type_input(
    code: &str,
    max_days: Option<i32>,
    requires_approval: bool,
) -> CreateLeaveType {
    CreateLeaveType {
        name: format!("{code} leave"),
        code: code.to_string(),
        description: None,
        max_days_per_request: max_days,
        carry_forward: false,
        requires_approval,
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        database_max_connections: 1,
        jwt_secret: TEST_SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        log_level: tracing::Level::DEBUG,
    }
}

/// Access token as the auth service would issue it.
pub fn token_for(role: Role, employee_id: Option<u64>) -> String {
    let claims = Claims {
        user_id: 900 + role as u64,
        sub: format!("{role:?}").to_lowercase(),
        role: role as u8,
        exp: 4_102_444_800, // 2100-01-01
        jti: "test".into(),
        token_type: TokenType::Access,
        employee_id,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(role: Role, employee_id: Option<u64>) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(role, employee_id)))
}

/// Registers app data and routes the way `main` does.
pub fn wire(s: &TestServices) -> impl FnOnce(&mut web::ServiceConfig) {
    let config = test_config();
    let schedules = s.schedules.clone();
    let attendance = s.attendance.clone();
    let leave = s.leave.clone();
    let catalog = s.catalog.clone();

    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(Data::new(config.clone()))
            .app_data(Data::new(schedules))
            .app_data(Data::new(attendance))
            .app_data(Data::new(leave))
            .app_data(Data::new(catalog));
        routes::configure(cfg, &config);
    }
}

pub fn peer() -> std::net::SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}
