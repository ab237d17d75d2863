//! Persistence seams for the attendance and leave services.
//!
//! - `mysql`: production implementation over `sqlx::MySqlPool`
//! - `memory`: in-memory implementation for unit tests
//!
//! Mutations of contended rows are conditional: attendance and leave-balance
//! updates compare-and-swap on a `version` column, leave-request updates do the
//! same and only apply while the row is still `PENDING`. A `false` return means the
//! condition did not hold and nothing was written.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppResult;
use crate::model::{
    attendance::{Attendance, AttendanceFilter},
    employee::EmployeeProfile,
    leave_balance::LeaveBalance,
    leave_policy::LeavePolicy,
    leave_request::{LeaveRequest, LeaveRequestFilter},
    leave_type::LeaveType,
    work_schedule::{ScheduleScope, WorkSchedule},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[cfg(test)]
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Read-only view of the external employee directory.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_employee(&self, id: u64) -> AppResult<Option<EmployeeProfile>>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert_schedule(&self, schedule: &WorkSchedule) -> AppResult<WorkSchedule>;
    async fn find_schedule(&self, id: u64) -> AppResult<Option<WorkSchedule>>;
    async fn list_schedules(&self) -> AppResult<Vec<WorkSchedule>>;
    async fn update_schedule(&self, schedule: &WorkSchedule) -> AppResult<()>;
    async fn delete_schedule(&self, id: u64) -> AppResult<bool>;

    /// Schedule for one scope bucket. Employee schedules match whether or
    /// not they are flagged default (flagged first); the other buckets only
    /// consider default-flagged schedules. Lowest id breaks ties.
    async fn find_schedule_in_scope(&self, scope: ScheduleScope)
    -> AppResult<Option<WorkSchedule>>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fails with `DuplicateRecord` when the employee already has a row for the date.
    async fn insert_attendance(&self, record: &Attendance) -> AppResult<Attendance>;
    async fn find_attendance(&self, id: u64) -> AppResult<Option<Attendance>>;
    async fn find_attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>>;
    /// Newest date first. Paged only when `per_page` is set.
    async fn list_attendance(&self, filter: &AttendanceFilter) -> AppResult<Vec<Attendance>>;
    /// Compare-and-swap on `record.version`.
    async fn update_attendance(&self, record: &Attendance) -> AppResult<bool>;
    async fn delete_attendance(&self, id: u64) -> AppResult<bool>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Fails with `DuplicateRecord` on a code clash.
    async fn insert_leave_type(&self, leave_type: &LeaveType) -> AppResult<LeaveType>;
    async fn find_leave_type(&self, id: u64) -> AppResult<Option<LeaveType>>;
    async fn list_leave_types(&self, include_inactive: bool) -> AppResult<Vec<LeaveType>>;
    async fn update_leave_type(&self, leave_type: &LeaveType) -> AppResult<()>;

    async fn insert_policy(&self, policy: &LeavePolicy) -> AppResult<LeavePolicy>;
    async fn find_policy(&self, id: u64) -> AppResult<Option<LeavePolicy>>;
    async fn list_policies(&self, leave_type_id: Option<u64>) -> AppResult<Vec<LeavePolicy>>;
    async fn update_policy(&self, policy: &LeavePolicy) -> AppResult<()>;
    async fn delete_policy(&self, id: u64) -> AppResult<bool>;

    async fn insert_request(&self, request: &LeaveRequest) -> AppResult<LeaveRequest>;
    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>>;
    /// Newest first. Paged only when `per_page` is set.
    async fn list_requests(&self, filter: &LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>>;
    /// Writes every mutable field, but only while the stored row is `PENDING`
    /// and still at `request.version`.
    async fn update_pending_request(&self, request: &LeaveRequest) -> AppResult<bool>;

    async fn find_balance(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<Option<LeaveBalance>>;
    /// Inserts a zeroed row unless one already exists for the key.
    async fn create_balance_if_absent(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<()>;
    /// Compare-and-swap on `balance.version`.
    async fn update_balance(&self, balance: &LeaveBalance) -> AppResult<bool>;
}

/// `LIMIT`/`OFFSET` window: 1-based page, 10 per page by default, at most 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Pagination {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    /// Window requested by a filter, if any.
    pub fn requested(page: Option<u64>, per_page: Option<u64>) -> Option<Self> {
        per_page.map(|_| Pagination::new(page, per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn pagination_clamps_like_the_list_endpoints() {
        let p = Pagination::new(None, None);
        assert_eq!((p.page, p.per_page, p.offset()), (1, 10, 0));

        let p = Pagination::new(Some(3), Some(500));
        assert_eq!((p.page, p.per_page, p.offset()), (3, 100, 200));

        let p = Pagination::new(Some(0), Some(0));
        assert_eq!((p.page, p.per_page), (1, 1));

        assert!(Pagination::requested(Some(2), None).is_none());
    }
}
