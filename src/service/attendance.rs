use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::types::Json;
use tracing::{info, warn};

use super::ScheduleService;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{
    Attendance, AttendanceFilter, AttendanceStatus, AttendanceSummary, CheckInOut,
    CreateAttendance, UpdateAttendance, hours_between, round2,
};
use crate::model::work_schedule::WorkSchedule;
use crate::store::AttendanceStore;

/// Status and late minutes for a check-in at `at` against the day's schedule.
pub fn lateness(
    schedule: Option<&WorkSchedule>,
    at: NaiveDateTime,
) -> (AttendanceStatus, Option<i32>) {
    match schedule {
        Some(schedule) => {
            let scheduled_start = at.date().and_time(schedule.start_time);
            if at > scheduled_start {
                let minutes = (at - scheduled_start).num_minutes() as i32;
                (AttendanceStatus::Late, Some(minutes))
            } else {
                (AttendanceStatus::Present, None)
            }
        }
        None => (AttendanceStatus::Present, None),
    }
}

/// Hours worked beyond the schedule's expected day, if any.
pub fn overtime(schedule: Option<&WorkSchedule>, work_hours: f64) -> Option<f64> {
    let expected = schedule?.expected_hours();
    (work_hours > expected).then(|| round2(work_hours - expected))
}

fn check_order(record: &Attendance) -> AppResult<()> {
    if let (Some(check_in), Some(check_out)) = (record.check_in, record.check_out) {
        if check_out < check_in {
            return Err(AppError::Validation(
                "check_out cannot be before check_in".into(),
            ));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    schedules: ScheduleService,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        schedules: ScheduleService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            schedules,
            clock,
        }
    }

    /// The employee's schedule, if it covers `date`'s weekday.
    async fn schedule_on(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AppResult<Option<WorkSchedule>> {
        Ok(self
            .schedules
            .resolve(employee_id)
            .await?
            .filter(|s| s.applies_on(date)))
    }

    /// HR-entered record. One per employee and day.
    pub async fn create(&self, input: CreateAttendance) -> AppResult<Attendance> {
        let mut record = Attendance::new(input.employee_id, input.date);
        record.check_in = input.check_in;
        record.check_out = input.check_out;
        record.status = input.status.unwrap_or(AttendanceStatus::Present);
        record.location = input.location.map(Json);
        record.notes = input.notes;
        check_order(&record)?;
        record.recompute_work_hours();

        let record = self.store.insert_attendance(&record).await?;
        info!(
            attendance_id = record.id,
            employee_id = record.employee_id,
            date = %record.date,
            "Attendance created"
        );
        Ok(record)
    }

    pub async fn check_in(&self, employee_id: u64, input: CheckInOut) -> AppResult<Attendance> {
        let now = self.clock.now();
        let today = now.date();

        let existing = self.store.find_attendance_on(employee_id, today).await?;
        if existing.as_ref().is_some_and(|r| r.check_in.is_some()) {
            return Err(AppError::AlreadyCheckedIn);
        }

        let schedule = self.schedule_on(employee_id, today).await?;
        let (status, late_minutes) = lateness(schedule.as_ref(), now);

        let record = match existing {
            None => {
                let mut record = Attendance::new(employee_id, today);
                record.check_in = Some(now);
                record.status = status;
                record.late_minutes = late_minutes;
                record.location = input.location.map(Json);
                record.notes = input.notes;

                // A concurrent check-in created the row first.
                self.store
                    .insert_attendance(&record)
                    .await
                    .map_err(|e| match e {
                        AppError::DuplicateRecord(_) => AppError::AlreadyCheckedIn,
                        other => other,
                    })?
            }
            Some(mut record) => {
                record.check_in = Some(now);
                check_order(&record)?;
                record.status = status;
                record.late_minutes = late_minutes;
                if let Some(location) = input.location {
                    record.location = Some(Json(location));
                }
                if input.notes.is_some() {
                    record.notes = input.notes;
                }
                record.recompute_work_hours();

                if !self.store.update_attendance(&record).await? {
                    warn!(
                        employee_id,
                        attendance_id = record.id,
                        "Check-in lost a concurrent update"
                    );
                    return Err(AppError::AlreadyCheckedIn);
                }
                record.version += 1;
                record
            }
        };

        info!(
            employee_id,
            attendance_id = record.id,
            status = %record.status,
            late_minutes = ?record.late_minutes,
            "Checked in"
        );
        Ok(record)
    }

    pub async fn check_out(&self, employee_id: u64, input: CheckInOut) -> AppResult<Attendance> {
        let now = self.clock.now();
        let today = now.date();

        let mut record = self
            .store
            .find_attendance_on(employee_id, today)
            .await?
            .ok_or(AppError::NoCheckIn)?;
        let check_in = record.check_in.ok_or(AppError::NoCheckIn)?;
        if record.check_out.is_some() {
            return Err(AppError::AlreadyCheckedOut);
        }

        let work_hours = hours_between(check_in, now);
        let schedule = self.schedule_on(employee_id, today).await?;

        record.check_out = Some(now);
        record.work_hours = Some(work_hours);
        record.overtime_hours = overtime(schedule.as_ref(), work_hours);
        if let Some(location) = input.location {
            record.location = Some(Json(location));
        }
        if input.notes.is_some() {
            record.notes = input.notes;
        }

        if !self.store.update_attendance(&record).await? {
            let current = self.store.find_attendance(record.id).await?;
            return Err(match current {
                Some(r) if r.check_out.is_some() => AppError::AlreadyCheckedOut,
                _ => AppError::ConcurrentModification("Attendance".into()),
            });
        }
        record.version += 1;

        info!(
            employee_id,
            attendance_id = record.id,
            work_hours,
            overtime_hours = ?record.overtime_hours,
            "Checked out"
        );
        Ok(record)
    }

    pub async fn find(&self, id: u64) -> AppResult<Attendance> {
        self.store
            .find_attendance(id)
            .await?
            .ok_or_else(|| AppError::not_found("Attendance", id))
    }

    pub async fn list(&self, filter: &AttendanceFilter) -> AppResult<Vec<Attendance>> {
        self.store.list_attendance(filter).await
    }

    /// Applies the patch; work hours and overtime follow any change to either
    /// timestamp, taking the untouched one from the stored row. A new check-in
    /// also recomputes lateness unless the patch sets a status.
    pub async fn update(&self, id: u64, patch: UpdateAttendance) -> AppResult<Attendance> {
        let mut record = self.find(id).await?;
        let times_changed = patch.check_in.is_some() || patch.check_out.is_some();
        let recheck_lateness = patch.check_in.is_some() && patch.status.is_none();

        if let Some(date) = patch.date {
            record.date = date;
        }
        if let Some(check_in) = patch.check_in {
            record.check_in = Some(check_in);
        }
        if let Some(check_out) = patch.check_out {
            record.check_out = Some(check_out);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(location) = patch.location {
            record.location = Some(Json(location));
        }
        if patch.notes.is_some() {
            record.notes = patch.notes;
        }
        check_order(&record)?;
        if times_changed {
            record.recompute_work_hours();
            let schedule = self.schedule_on(record.employee_id, record.date).await?;
            record.overtime_hours = record
                .work_hours
                .and_then(|hours| overtime(schedule.as_ref(), hours));
            if let (true, Some(check_in)) = (recheck_lateness, record.check_in) {
                (record.status, record.late_minutes) = lateness(schedule.as_ref(), check_in);
            }
        }

        if !self.store.update_attendance(&record).await? {
            return Err(AppError::ConcurrentModification("Attendance".into()));
        }
        record.version += 1;
        info!(attendance_id = id, "Attendance updated");
        Ok(record)
    }

    pub async fn delete(&self, id: u64) -> AppResult<()> {
        if !self.store.delete_attendance(id).await? {
            return Err(AppError::not_found("Attendance", id));
        }
        info!(attendance_id = id, "Attendance deleted");
        Ok(())
    }

    pub async fn summary(
        &self,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<AttendanceSummary> {
        if end_date < start_date {
            return Err(AppError::InvalidRange);
        }
        let filter = AttendanceFilter {
            employee_id: Some(employee_id),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        };
        let records = self.store.list_attendance(&filter).await?;
        Ok(AttendanceSummary::from_records(
            employee_id,
            start_date,
            end_date,
            &records,
        ))
    }
}
