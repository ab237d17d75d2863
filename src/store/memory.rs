use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, EmployeeDirectory, LeaveStore, Pagination, ScheduleStore};
use crate::error::{AppError, AppResult};
use crate::model::{
    attendance::{Attendance, AttendanceFilter},
    employee::EmployeeProfile,
    leave_balance::LeaveBalance,
    leave_policy::LeavePolicy,
    leave_request::{LeaveRequest, LeaveRequestFilter, LeaveStatus},
    leave_type::LeaveType,
    work_schedule::{ScheduleScope, WorkSchedule},
};

#[derive(Default)]
struct Tables {
    next_id: u64,
    employees: BTreeMap<u64, EmployeeProfile>,
    schedules: BTreeMap<u64, WorkSchedule>,
    attendance: BTreeMap<u64, Attendance>,
    leave_types: BTreeMap<u64, LeaveType>,
    policies: BTreeMap<u64, LeavePolicy>,
    requests: BTreeMap<u64, LeaveRequest>,
    balances: BTreeMap<u64, LeaveBalance>,
}

impl Tables {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Same contracts as `MySqlStore`, kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_employee(&self, id: u64, department_id: Option<u64>, position_id: Option<u64>) {
        self.tables.lock().unwrap().employees.insert(
            id,
            EmployeeProfile {
                id,
                department_id,
                position_id,
            },
        );
    }

    /// Grants `accrued` days, standing in for the external accrual process.
    pub fn seed_balance(&self, employee_id: u64, leave_type_id: u64, year: i32, accrued: f64) {
        let mut t = self.tables.lock().unwrap();
        let id = t.id();
        t.balances.insert(
            id,
            LeaveBalance {
                id,
                accrued,
                balance: accrued,
                ..LeaveBalance::empty(employee_id, leave_type_id, year)
            },
        );
    }

    /// Bumps the stored version as a concurrent writer would.
    pub fn touch_balance(&self, id: u64) {
        if let Some(b) = self.tables.lock().unwrap().balances.get_mut(&id) {
            b.version += 1;
        }
    }
}

fn page<T>(rows: Vec<T>, page: Option<Pagination>) -> Vec<T> {
    match page {
        Some(p) => rows
            .into_iter()
            .skip(p.offset() as usize)
            .take(p.per_page as usize)
            .collect(),
        None => rows,
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn find_employee(&self, id: u64) -> AppResult<Option<EmployeeProfile>> {
        Ok(self.tables.lock().unwrap().employees.get(&id).cloned())
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn insert_schedule(&self, schedule: &WorkSchedule) -> AppResult<WorkSchedule> {
        let mut t = self.tables.lock().unwrap();
        let stored = WorkSchedule {
            id: t.id(),
            ..schedule.clone()
        };
        t.schedules.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_schedule(&self, id: u64) -> AppResult<Option<WorkSchedule>> {
        Ok(self.tables.lock().unwrap().schedules.get(&id).cloned())
    }

    async fn list_schedules(&self) -> AppResult<Vec<WorkSchedule>> {
        Ok(self.tables.lock().unwrap().schedules.values().cloned().collect())
    }

    async fn update_schedule(&self, schedule: &WorkSchedule) -> AppResult<()> {
        let mut t = self.tables.lock().unwrap();
        if let Some(row) = t.schedules.get_mut(&schedule.id) {
            *row = schedule.clone();
        }
        Ok(())
    }

    async fn delete_schedule(&self, id: u64) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().schedules.remove(&id).is_some())
    }

    async fn find_schedule_in_scope(
        &self,
        scope: ScheduleScope,
    ) -> AppResult<Option<WorkSchedule>> {
        let t = self.tables.lock().unwrap();
        let mut matching: Vec<&WorkSchedule> = t
            .schedules
            .values()
            .filter(|s| match scope {
                ScheduleScope::Employee(id) => s.employee_id == Some(id),
                ScheduleScope::Position(id) => s.position_id == Some(id) && s.is_default,
                ScheduleScope::Department(id) => s.department_id == Some(id) && s.is_default,
                ScheduleScope::Global => {
                    s.employee_id.is_none()
                        && s.department_id.is_none()
                        && s.position_id.is_none()
                        && s.is_default
                }
            })
            .collect();
        matching.sort_by_key(|s| (!s.is_default, s.id));
        Ok(matching.first().map(|s| (*s).clone()))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_attendance(&self, record: &Attendance) -> AppResult<Attendance> {
        let mut t = self.tables.lock().unwrap();
        if t.attendance
            .values()
            .any(|a| a.employee_id == record.employee_id && a.date == record.date)
        {
            return Err(AppError::DuplicateRecord(format!(
                "Attendance already recorded for employee {} on {}",
                record.employee_id, record.date
            )));
        }
        let stored = Attendance {
            id: t.id(),
            version: 0,
            ..record.clone()
        };
        t.attendance.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_attendance(&self, id: u64) -> AppResult<Option<Attendance>> {
        Ok(self.tables.lock().unwrap().attendance.get(&id).cloned())
    }

    async fn find_attendance_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .attendance
            .values()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn list_attendance(&self, filter: &AttendanceFilter) -> AppResult<Vec<Attendance>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Attendance> = t
            .attendance
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(page(rows, Pagination::requested(filter.page, filter.per_page)))
    }

    async fn update_attendance(&self, record: &Attendance) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.attendance.values().any(|a| {
            a.id != record.id && a.employee_id == record.employee_id && a.date == record.date
        }) {
            return Err(AppError::DuplicateRecord(format!(
                "Attendance already recorded for employee {} on {}",
                record.employee_id, record.date
            )));
        }
        match t.attendance.get_mut(&record.id) {
            Some(row) if row.version == record.version => {
                *row = Attendance {
                    version: record.version + 1,
                    ..record.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_attendance(&self, id: u64) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().attendance.remove(&id).is_some())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_leave_type(&self, leave_type: &LeaveType) -> AppResult<LeaveType> {
        let mut t = self.tables.lock().unwrap();
        if t.leave_types.values().any(|l| l.code == leave_type.code) {
            return Err(AppError::DuplicateRecord(format!(
                "Leave type code {} already exists",
                leave_type.code
            )));
        }
        let stored = LeaveType {
            id: t.id(),
            ..leave_type.clone()
        };
        t.leave_types.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_leave_type(&self, id: u64) -> AppResult<Option<LeaveType>> {
        Ok(self.tables.lock().unwrap().leave_types.get(&id).cloned())
    }

    async fn list_leave_types(&self, include_inactive: bool) -> AppResult<Vec<LeaveType>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .leave_types
            .values()
            .filter(|l| include_inactive || l.is_active)
            .cloned()
            .collect())
    }

    async fn update_leave_type(&self, leave_type: &LeaveType) -> AppResult<()> {
        if let Some(row) = self.tables.lock().unwrap().leave_types.get_mut(&leave_type.id) {
            *row = leave_type.clone();
        }
        Ok(())
    }

    async fn insert_policy(&self, policy: &LeavePolicy) -> AppResult<LeavePolicy> {
        let mut t = self.tables.lock().unwrap();
        let stored = LeavePolicy {
            id: t.id(),
            ..policy.clone()
        };
        t.policies.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_policy(&self, id: u64) -> AppResult<Option<LeavePolicy>> {
        Ok(self.tables.lock().unwrap().policies.get(&id).cloned())
    }

    async fn list_policies(&self, leave_type_id: Option<u64>) -> AppResult<Vec<LeavePolicy>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .policies
            .values()
            .filter(|p| leave_type_id.is_none_or(|id| p.leave_type_id == id))
            .cloned()
            .collect())
    }

    async fn update_policy(&self, policy: &LeavePolicy) -> AppResult<()> {
        if let Some(row) = self.tables.lock().unwrap().policies.get_mut(&policy.id) {
            *row = policy.clone();
        }
        Ok(())
    }

    async fn delete_policy(&self, id: u64) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().policies.remove(&id).is_some())
    }

    async fn insert_request(&self, request: &LeaveRequest) -> AppResult<LeaveRequest> {
        let mut t = self.tables.lock().unwrap();
        let stored = LeaveRequest {
            id: t.id(),
            version: 0,
            ..request.clone()
        };
        t.requests.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_request(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.tables.lock().unwrap().requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<LeaveRequest> = t
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, Pagination::requested(filter.page, filter.per_page)))
    }

    async fn update_pending_request(&self, request: &LeaveRequest) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        match t.requests.get_mut(&request.id) {
            Some(row) if row.status == LeaveStatus::Pending && row.version == request.version => {
                *row = LeaveRequest {
                    version: request.version + 1,
                    ..request.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_balance(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<Option<LeaveBalance>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .balances
            .values()
            .find(|b| {
                b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year
            })
            .cloned())
    }

    async fn create_balance_if_absent(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<()> {
        let mut t = self.tables.lock().unwrap();
        let exists = t.balances.values().any(|b| {
            b.employee_id == employee_id && b.leave_type_id == leave_type_id && b.year == year
        });
        if !exists {
            let id = t.id();
            t.balances.insert(
                id,
                LeaveBalance {
                    id,
                    ..LeaveBalance::empty(employee_id, leave_type_id, year)
                },
            );
        }
        Ok(())
    }

    async fn update_balance(&self, balance: &LeaveBalance) -> AppResult<bool> {
        let mut t = self.tables.lock().unwrap();
        match t.balances.get_mut(&balance.id) {
            Some(row) if row.version == balance.version => {
                *row = LeaveBalance {
                    version: balance.version + 1,
                    ..balance.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
