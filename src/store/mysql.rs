use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use super::{AttendanceStore, EmployeeDirectory, LeaveStore, Pagination, ScheduleStore};
use crate::error::{AppError, AppResult};
use crate::model::{
    attendance::{Attendance, AttendanceFilter},
    employee::EmployeeProfile,
    leave_balance::LeaveBalance,
    leave_policy::LeavePolicy,
    leave_request::{LeaveRequest, LeaveRequestFilter},
    leave_type::LeaveType,
    work_schedule::{ScheduleScope, WorkSchedule},
};

const SCHEDULE_COLUMNS: &str = "id, name, start_time, end_time, break_minutes, work_days, \
     employee_id, department_id, position_id, is_default";

const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, check_in, check_out, status, \
     work_hours, late_minutes, overtime_hours, location, notes, version";

const LEAVE_TYPE_COLUMNS: &str = "id, name, code, description, max_days_per_request, \
     carry_forward, requires_approval, is_active";

const POLICY_COLUMNS: &str = "id, leave_type_id, department_id, position_id, max_days, \
     min_days, accrual_rate, is_active";

const REQUEST_COLUMNS: &str = "id, employee_id, leave_type_id, start_date, end_date, days, \
     reason, status, approver_id, approved_at, rejection_reason, review_notes, created_at, \
     version";

const BALANCE_COLUMNS: &str =
    "id, employee_id, leave_type_id, year, accrued, used, balance, version";

/// Typed binding for dynamically built WHERE clauses.
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
    Str(&'static str),
}

/// MySQL reports unique-key violations as SQLSTATE 23000.
fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_employee(&self, id: u64) -> AppResult<Option<EmployeeProfile>> {
        let employee = sqlx::query_as::<_, EmployeeProfile>(
            "SELECT id, department_id, job_title_id AS position_id FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }
}

#[async_trait]
impl ScheduleStore for MySqlStore {
    async fn insert_schedule(&self, schedule: &WorkSchedule) -> AppResult<WorkSchedule> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_schedules
                (name, start_time, end_time, break_minutes, work_days,
                 employee_id, department_id, position_id, is_default)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule.name)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.break_minutes)
        .bind(schedule.work_days.bits())
        .bind(schedule.employee_id)
        .bind(schedule.department_id)
        .bind(schedule.position_id)
        .bind(schedule.is_default)
        .execute(&self.pool)
        .await?;

        Ok(WorkSchedule {
            id: result.last_insert_id(),
            ..schedule.clone()
        })
    }

    async fn find_schedule(&self, id: u64) -> AppResult<Option<WorkSchedule>> {
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE id = ?");
        Ok(sqlx::query_as::<_, WorkSchedule>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_schedules(&self) -> AppResult<Vec<WorkSchedule>> {
        let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM work_schedules ORDER BY id");
        Ok(sqlx::query_as::<_, WorkSchedule>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_schedule(&self, schedule: &WorkSchedule) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE work_schedules
            SET name = ?, start_time = ?, end_time = ?, break_minutes = ?,
                work_days = ?, is_default = ?
            WHERE id = ?
            "#,
        )
        .bind(&schedule.name)
        .bind(schedule.start_time)
        .bind(schedule.end_time)
        .bind(schedule.break_minutes)
        .bind(schedule.work_days.bits())
        .bind(schedule.is_default)
        .bind(schedule.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_schedule(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_schedule_in_scope(
        &self,
        scope: ScheduleScope,
    ) -> AppResult<Option<WorkSchedule>> {
        let (condition, id) = match scope {
            ScheduleScope::Employee(id) => ("employee_id = ?", Some(id)),
            ScheduleScope::Position(id) => ("position_id = ? AND is_default = TRUE", Some(id)),
            ScheduleScope::Department(id) => {
                ("department_id = ? AND is_default = TRUE", Some(id))
            }
            ScheduleScope::Global => (
                "employee_id IS NULL AND department_id IS NULL AND position_id IS NULL \
                 AND is_default = TRUE",
                None,
            ),
        };
        let sql = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE {condition} \
             ORDER BY is_default DESC, id ASC LIMIT 1"
        );

        let mut query = sqlx::query_as::<_, WorkSchedule>(&sql);
        if let Some(id) = id {
            query = query.bind(id);
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn insert_attendance(&self, record: &Attendance) -> AppResult<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in, check_out, status, work_hours,
                 late_minutes, overtime_hours, location, notes, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.as_ref())
        .bind(record.work_hours)
        .bind(record.late_minutes)
        .bind(record.overtime_hours)
        .bind(record.location.clone())
        .bind(&record.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                AppError::DuplicateRecord(format!(
                    "Attendance already recorded for employee {} on {}",
                    record.employee_id, record.date
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(Attendance {
            id: result.last_insert_id(),
            version: 0,
            ..record.clone()
        })
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<Attendance>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> AppResult<Vec<Attendance>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(start) = filter.start_date {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(start));
        }
        if let Some(end) = filter.end_date {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(end));
        }

        let page = Pagination::requested(filter.page, filter.per_page);
        let mut sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance{where_sql} ORDER BY date DESC, id DESC"
        );
        if page.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = sqlx::query_as::<_, Attendance>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Date(v) => query.bind(v),
                FilterValue::Str(v) => query.bind(v),
            };
        }
        if let Some(page) = page {
            query = query.bind(page.per_page).bind(page.offset());
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update_attendance(&self, record: &Attendance) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET date = ?, check_in = ?, check_out = ?, status = ?, work_hours = ?,
                late_minutes = ?, overtime_hours = ?, location = ?, notes = ?,
                version = version + 1
            WHERE id = ?
            AND version = ?
            "#,
        )
        .bind(record.date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status.as_ref())
        .bind(record.work_hours)
        .bind(record.late_minutes)
        .bind(record.overtime_hours)
        .bind(record.location.clone())
        .bind(&record.notes)
        .bind(record.id)
        .bind(record.version)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                AppError::DuplicateRecord(format!(
                    "Attendance already recorded for employee {} on {}",
                    record.employee_id, record.date
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_attendance(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_leave_type(&self, leave_type: &LeaveType) -> AppResult<LeaveType> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_types
                (name, code, description, max_days_per_request, carry_forward,
                 requires_approval, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&leave_type.name)
        .bind(&leave_type.code)
        .bind(&leave_type.description)
        .bind(leave_type.max_days_per_request)
        .bind(leave_type.carry_forward)
        .bind(leave_type.requires_approval)
        .bind(leave_type.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                AppError::DuplicateRecord(format!(
                    "Leave type code {} already exists",
                    leave_type.code
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(LeaveType {
            id: result.last_insert_id(),
            ..leave_type.clone()
        })
    }

    async fn find_leave_type(&self, id: u64) -> AppResult<Option<LeaveType>> {
        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE id = ?");
        Ok(sqlx::query_as::<_, LeaveType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_leave_types(&self, include_inactive: bool) -> AppResult<Vec<LeaveType>> {
        let condition = if include_inactive {
            ""
        } else {
            " WHERE is_active = TRUE"
        };
        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types{condition} ORDER BY id");
        Ok(sqlx::query_as::<_, LeaveType>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_leave_type(&self, leave_type: &LeaveType) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_types
            SET name = ?, description = ?, max_days_per_request = ?, carry_forward = ?,
                requires_approval = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&leave_type.name)
        .bind(&leave_type.description)
        .bind(leave_type.max_days_per_request)
        .bind(leave_type.carry_forward)
        .bind(leave_type.requires_approval)
        .bind(leave_type.is_active)
        .bind(leave_type.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_policy(&self, policy: &LeavePolicy) -> AppResult<LeavePolicy> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_policies
                (leave_type_id, department_id, position_id, max_days, min_days,
                 accrual_rate, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(policy.leave_type_id)
        .bind(policy.department_id)
        .bind(policy.position_id)
        .bind(policy.max_days)
        .bind(policy.min_days)
        .bind(policy.accrual_rate)
        .bind(policy.is_active)
        .execute(&self.pool)
        .await?;

        Ok(LeavePolicy {
            id: result.last_insert_id(),
            ..policy.clone()
        })
    }

    async fn find_policy(&self, id: u64) -> AppResult<Option<LeavePolicy>> {
        let sql = format!("SELECT {POLICY_COLUMNS} FROM leave_policies WHERE id = ?");
        Ok(sqlx::query_as::<_, LeavePolicy>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_policies(&self, leave_type_id: Option<u64>) -> AppResult<Vec<LeavePolicy>> {
        let sql = match leave_type_id {
            Some(_) => format!(
                "SELECT {POLICY_COLUMNS} FROM leave_policies WHERE leave_type_id = ? ORDER BY id"
            ),
            None => format!("SELECT {POLICY_COLUMNS} FROM leave_policies ORDER BY id"),
        };
        let mut query = sqlx::query_as::<_, LeavePolicy>(&sql);
        if let Some(id) = leave_type_id {
            query = query.bind(id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update_policy(&self, policy: &LeavePolicy) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE leave_policies
            SET max_days = ?, min_days = ?, accrual_rate = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(policy.max_days)
        .bind(policy.min_days)
        .bind(policy.accrual_rate)
        .bind(policy.is_active)
        .bind(policy.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_policy(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM leave_policies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(&self, request: &LeaveRequest) -> AppResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_id, start_date, end_date, days, reason, status,
                 approver_id, approved_at, rejection_reason, review_notes, created_at, version)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(&request.reason)
        .bind(request.status.as_ref())
        .bind(request.approver_id)
        .bind(request.approved_at)
        .bind(&request.rejection_reason)
        .bind(&request.review_notes)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            version: 0,
            ..request.clone()
        })
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_requests(&self, filter: &LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.into()));
        }

        let page = Pagination::requested(filter.page, filter.per_page);
        let mut sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC"
        );
        if page.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
        }

        let mut query = sqlx::query_as::<_, LeaveRequest>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Date(v) => query.bind(v),
                FilterValue::Str(v) => query.bind(v),
            };
        }
        if let Some(page) = page {
            query = query.bind(page.per_page).bind(page.offset());
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update_pending_request(&self, request: &LeaveRequest) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET leave_type_id = ?, start_date = ?, end_date = ?, days = ?, reason = ?,
                status = ?, approver_id = ?, approved_at = ?, rejection_reason = ?,
                review_notes = ?, version = version + 1
            WHERE id = ?
            AND status = 'PENDING'
            AND version = ?
            "#,
        )
        .bind(request.leave_type_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.days)
        .bind(&request.reason)
        .bind(request.status.as_ref())
        .bind(request.approver_id)
        .bind(request.approved_at)
        .bind(&request.rejection_reason)
        .bind(&request.review_notes)
        .bind(request.id)
        .bind(request.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_balance(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<Option<LeaveBalance>> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances \
             WHERE employee_id = ? AND leave_type_id = ? AND year = ?"
        );
        Ok(sqlx::query_as::<_, LeaveBalance>(&sql)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(year)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_balance_if_absent(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT IGNORE INTO leave_balances
                (employee_id, leave_type_id, year, accrued, used, balance, version)
            VALUES (?, ?, ?, 0, 0, 0, 0)
            "#,
        )
        .bind(employee_id)
        .bind(leave_type_id)
        .bind(year)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_balance(&self, balance: &LeaveBalance) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_balances
            SET accrued = ?, used = ?, balance = ?, version = version + 1
            WHERE id = ?
            AND version = ?
            "#,
        )
        .bind(balance.accrued)
        .bind(balance.used)
        .bind(balance.balance)
        .bind(balance.id)
        .bind(balance.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

