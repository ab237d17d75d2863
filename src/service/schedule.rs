use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::model::work_schedule::{
    CreateWorkSchedule, ScheduleScope, UpdateWorkSchedule, WorkSchedule,
};
use crate::store::{EmployeeDirectory, ScheduleStore};

/// Work-schedule CRUD plus resolution of the schedule that governs an employee.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    directory: Arc<dyn EmployeeDirectory>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>, directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { store, directory }
    }

    /// First match wins: employee-specific, then the default for the
    /// employee's position, department, and finally the global default.
    /// `None` is a normal outcome for employees without configured hours.
    pub async fn resolve(&self, employee_id: u64) -> AppResult<Option<WorkSchedule>> {
        let mut scopes = vec![ScheduleScope::Employee(employee_id)];
        if let Some(employee) = self.directory.find_employee(employee_id).await? {
            scopes.extend(employee.position_id.map(ScheduleScope::Position));
            scopes.extend(employee.department_id.map(ScheduleScope::Department));
        }
        scopes.push(ScheduleScope::Global);

        for scope in scopes {
            if let Some(schedule) = self.store.find_schedule_in_scope(scope).await? {
                debug!(employee_id, schedule_id = schedule.id, ?scope, "Resolved work schedule");
                return Ok(Some(schedule));
            }
        }

        debug!(employee_id, "No work schedule configured");
        Ok(None)
    }

    pub async fn create(&self, input: CreateWorkSchedule) -> AppResult<WorkSchedule> {
        let schedule = input.into_schedule();
        schedule.validate().map_err(AppError::Validation)?;

        let schedule = self.store.insert_schedule(&schedule).await?;
        info!(schedule_id = schedule.id, name = %schedule.name, "Work schedule created");
        Ok(schedule)
    }

    pub async fn find(&self, id: u64) -> AppResult<WorkSchedule> {
        self.store
            .find_schedule(id)
            .await?
            .ok_or_else(|| AppError::not_found("Work schedule", id))
    }

    pub async fn list(&self) -> AppResult<Vec<WorkSchedule>> {
        self.store.list_schedules().await
    }

    pub async fn update(&self, id: u64, patch: UpdateWorkSchedule) -> AppResult<WorkSchedule> {
        let mut schedule = self.find(id).await?;
        patch.apply(&mut schedule);
        schedule.validate().map_err(AppError::Validation)?;

        self.store.update_schedule(&schedule).await?;
        info!(schedule_id = id, "Work schedule updated");
        Ok(schedule)
    }

    pub async fn delete(&self, id: u64) -> AppResult<()> {
        if !self.store.delete_schedule(id).await? {
            return Err(AppError::not_found("Work schedule", id));
        }
        info!(schedule_id = id, "Work schedule deleted");
        Ok(())
    }
}
