use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Every status but `Pending` is final.
    pub fn is_terminal(self) -> bool {
        self != LeaveStatus::Pending
    }
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "leave_type_id": 1,
    "start_date": "2024-06-01",
    "end_date": "2024-06-05",
    "days": 5,
    "reason": "Family trip",
    "status": "PENDING",
    "approver_id": null,
    "approved_at": null,
    "rejection_reason": null,
    "review_notes": null,
    "created_at": "2024-05-20T10:00:00",
    "version": 0
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub days: i32,
    pub reason: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    pub approver_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub review_notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    pub version: u32,
}

/// Inclusive calendar-day count of `[start, end]`; a single day is 1.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i32 {
    ((end - start).num_days().abs() + 1) as i32
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveRequest {
    /// Only HR/Admin may file on behalf of someone else
    pub employee_id: Option<u64>,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2024-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-06-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateLeaveRequest {
    pub leave_type_id: Option<u64>,
    #[schema(format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ApproveLeave {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Team is understaffed that week")]
    pub reason: String,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveRequestFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

impl LeaveRequestFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| request.employee_id == id)
            && self.status.is_none_or(|s| request.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(inclusive_days(d(2024, 6, 1), d(2024, 6, 1)), 1);
    }

    #[test]
    fn range_is_inclusive_of_both_ends() {
        assert_eq!(inclusive_days(d(2024, 6, 1), d(2024, 6, 5)), 5);
        // leap day
        assert_eq!(inclusive_days(d(2024, 2, 28), d(2024, 3, 1)), 3);
    }

    #[test]
    fn day_count_grows_with_the_distance_to_the_end() {
        let end = d(2024, 12, 31);
        for start in [d(2024, 1, 1), d(2024, 7, 15), d(2024, 12, 30)] {
            assert_eq!(
                inclusive_days(start, end),
                inclusive_days(end, end) + (end - start).num_days() as i32
            );
        }
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!LeaveStatus::Pending.is_terminal());
        for s in [LeaveStatus::Approved, LeaveStatus::Rejected, LeaveStatus::Cancelled] {
            assert!(s.is_terminal());
        }
    }
}
