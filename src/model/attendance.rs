use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

/// Unstructured key/value payload (device, geo, free-form fields).
pub type Payload = serde_json::Map<String, Value>;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    OnLeave,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One row per employee per calendar day.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "date": "2024-06-03",
    "check_in": "2024-06-03T09:20:00",
    "check_out": "2024-06-03T19:30:00",
    "status": "LATE",
    "work_hours": 10.17,
    "late_minutes": 20,
    "overtime_hours": 2.17,
    "location": {"site": "HQ"},
    "notes": null
}))]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub work_hours: Option<f64>,
    pub late_minutes: Option<i32>,
    pub overtime_hours: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub location: Option<Json<Payload>>,
    pub notes: Option<String>,
    #[serde(skip)]
    pub version: u32,
}

impl Attendance {
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            id: 0,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            status: AttendanceStatus::Present,
            work_hours: None,
            late_minutes: None,
            overtime_hours: None,
            location: None,
            notes: None,
            version: 0,
        }
    }

    /// Recomputes `work_hours` when both ends of the day are present.
    pub fn recompute_work_hours(&mut self) {
        self.work_hours = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => Some(hours_between(check_in, check_out)),
            _ => None,
        };
    }
}

/// Elapsed hours rounded to two decimals. Not clamped to business hours.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    round2((to - from).num_seconds() as f64 / 3600.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Inclusive lower bound on the attendance date
    #[schema(value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the attendance date
    #[schema(value_type = Option<String>, format = "date")]
    #[param(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &Attendance) -> bool {
        self.employee_id.is_none_or(|id| record.employee_id == id)
            && self.start_date.is_none_or(|d| record.date >= d)
            && self.end_date.is_none_or(|d| record.date <= d)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAttendance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2024-06-03", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2024-06-03T09:00:00", value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(example = "2024-06-03T18:00:00", value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    #[schema(value_type = Option<Object>)]
    pub location: Option<Payload>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    #[schema(value_type = Option<Object>)]
    pub location: Option<Payload>,
    pub notes: Option<String>,
}

/// Body of check-in / check-out. The employee comes from the bearer token.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckInOut {
    #[schema(value_type = Option<Object>, example = json!({"site": "HQ", "gate": 2}))]
    pub location: Option<Payload>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SummaryRange {
    #[schema(value_type = String, format = "date")]
    #[param(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    #[param(value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub late_days: u32,
    pub on_leave_days: u32,
    pub total_work_hours: f64,
    pub total_overtime_hours: f64,
    /// Mean over days with positive work hours only
    pub average_work_hours: f64,
}

impl AttendanceSummary {
    pub fn from_records(
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        records: &[Attendance],
    ) -> Self {
        let mut summary = AttendanceSummary {
            employee_id,
            start_date,
            end_date,
            ..Default::default()
        };
        let mut worked_days = 0u32;

        for record in records {
            summary.total_days += 1;
            match record.status {
                AttendanceStatus::Present => summary.present_days += 1,
                AttendanceStatus::Absent => summary.absent_days += 1,
                AttendanceStatus::Late => summary.late_days += 1,
                AttendanceStatus::OnLeave => summary.on_leave_days += 1,
            }
            if let Some(hours) = record.work_hours.filter(|h| *h > 0.0) {
                summary.total_work_hours += hours;
                worked_days += 1;
            }
            summary.total_overtime_hours += record.overtime_hours.unwrap_or(0.0);
        }

        if worked_days > 0 {
            summary.average_work_hours = round2(summary.total_work_hours / worked_days as f64);
        }
        summary.total_work_hours = round2(summary.total_work_hours);
        summary.total_overtime_hours = round2(summary.total_overtime_hours);
        summary
    }
}
