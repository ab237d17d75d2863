use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::LeaveBalanceLedger;
use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::model::employee::EmployeeProfile;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_policy;
use crate::model::leave_request::{
    CreateLeaveRequest, LeaveRequest, LeaveRequestFilter, LeaveStatus, UpdateLeaveRequest,
    inclusive_days,
};
use crate::model::leave_type::LeaveType;
use crate::store::{EmployeeDirectory, LeaveStore};

/// PENDING → {APPROVED, REJECTED, CANCELLED}. The only writer of the ledger.
#[derive(Clone)]
pub struct LeaveWorkflow {
    store: Arc<dyn LeaveStore>,
    ledger: LeaveBalanceLedger,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
}

impl LeaveWorkflow {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        ledger: LeaveBalanceLedger,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            ledger,
            directory,
            clock,
        }
    }

    async fn active_leave_type(&self, id: u64) -> AppResult<LeaveType> {
        let leave_type = self
            .store
            .find_leave_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave type", id))?;
        if !leave_type.is_active {
            return Err(AppError::Validation(format!(
                "Leave type {} is inactive",
                leave_type.code
            )));
        }
        Ok(leave_type)
    }

    /// Per-request cap and floor: the most specific policy first, then the leave type.
    async fn check_limits(
        &self,
        employee_id: u64,
        leave_type: &LeaveType,
        days: i32,
    ) -> AppResult<()> {
        let policies = self.store.list_policies(Some(leave_type.id)).await?;
        let profile = self
            .directory
            .find_employee(employee_id)
            .await?
            .unwrap_or(EmployeeProfile {
                id: employee_id,
                department_id: None,
                position_id: None,
            });
        let policy = leave_policy::applicable(&policies, &profile);

        let max = policy
            .and_then(|p| p.max_days)
            .or(leave_type.max_days_per_request);
        if let Some(max) = max {
            if days > max {
                return Err(AppError::PolicyLimitExceeded {
                    requested: days,
                    max,
                });
            }
        }
        if let Some(min) = policy.and_then(|p| p.min_days) {
            if days < min {
                return Err(AppError::PolicyMinimumNotMet {
                    requested: days,
                    min,
                });
            }
        }
        Ok(())
    }

    async fn checked_days(
        &self,
        employee_id: u64,
        leave_type: &LeaveType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<i32> {
        if end < start {
            return Err(AppError::InvalidRange);
        }
        let days = inclusive_days(start, end);
        self.check_limits(employee_id, leave_type, days).await?;
        Ok(days)
    }

    pub async fn create(
        &self,
        employee_id: u64,
        input: CreateLeaveRequest,
    ) -> AppResult<LeaveRequest> {
        let leave_type = self.active_leave_type(input.leave_type_id).await?;
        let days = self
            .checked_days(employee_id, &leave_type, input.start_date, input.end_date)
            .await?;

        let year = self.clock.current_year();
        let balance = self
            .ledger
            .get_or_create(employee_id, leave_type.id, year)
            .await?;
        if balance.balance < days as f64 {
            info!(
                employee_id,
                leave_type_id = leave_type.id,
                days,
                available = balance.balance,
                "Leave request refused for insufficient balance"
            );
            return Err(AppError::InsufficientBalance {
                requested: days as f64,
                available: balance.balance,
            });
        }

        let now = self.clock.now();
        let mut request = LeaveRequest {
            id: 0,
            employee_id,
            leave_type_id: leave_type.id,
            start_date: input.start_date,
            end_date: input.end_date,
            days,
            reason: input.reason,
            status: LeaveStatus::Pending,
            approver_id: None,
            approved_at: None,
            rejection_reason: None,
            review_notes: None,
            created_at: now,
            version: 0,
        };

        if leave_type.requires_approval {
            let request = self.store.insert_request(&request).await?;
            info!(
                leave_request_id = request.id,
                employee_id,
                days,
                "Leave request created"
            );
            return Ok(request);
        }

        self.ledger
            .consume(employee_id, leave_type.id, year, days)
            .await?;
        request.status = LeaveStatus::Approved;
        request.approved_at = Some(now);

        match self.store.insert_request(&request).await {
            Ok(request) => {
                info!(
                    leave_request_id = request.id,
                    employee_id,
                    days,
                    "Leave request auto-approved"
                );
                Ok(request)
            }
            Err(e) => {
                if let Err(release_err) = self
                    .ledger
                    .release(employee_id, leave_type.id, year, days)
                    .await
                {
                    error!(
                        employee_id,
                        leave_type_id = leave_type.id,
                        days,
                        error = %release_err,
                        "Failed to release leave balance after insert failure"
                    );
                }
                Err(e)
            }
        }
    }

    pub async fn find(&self, id: u64) -> AppResult<LeaveRequest> {
        self.store
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave request", id))
    }

    pub async fn list(&self, filter: &LeaveRequestFilter) -> AppResult<Vec<LeaveRequest>> {
        self.store.list_requests(filter).await
    }

    async fn find_pending(&self, id: u64) -> AppResult<LeaveRequest> {
        let request = self.find(id).await?;
        if request.status.is_terminal() {
            return Err(AppError::InvalidState {
                current: request.status,
            });
        }
        Ok(request)
    }

    /// Writes `request` if the stored row is still pending at the same version.
    async fn write_pending(&self, request: &mut LeaveRequest) -> AppResult<()> {
        if self.store.update_pending_request(request).await? {
            request.version += 1;
            return Ok(());
        }
        let current = self.find(request.id).await?.status;
        warn!(
            leave_request_id = request.id,
            %current,
            "Leave request modified concurrently"
        );
        if current.is_terminal() {
            Err(AppError::InvalidState { current })
        } else {
            Err(AppError::ConcurrentModification("Leave request".into()))
        }
    }

    /// Dates missing from the patch keep their stored values.
    pub async fn update(&self, id: u64, patch: UpdateLeaveRequest) -> AppResult<LeaveRequest> {
        let mut request = self.find_pending(id).await?;

        let leave_type = self
            .active_leave_type(patch.leave_type_id.unwrap_or(request.leave_type_id))
            .await?;
        let start = patch.start_date.unwrap_or(request.start_date);
        let end = patch.end_date.unwrap_or(request.end_date);
        request.days = self
            .checked_days(request.employee_id, &leave_type, start, end)
            .await?;
        request.leave_type_id = leave_type.id;
        request.start_date = start;
        request.end_date = end;
        if patch.reason.is_some() {
            request.reason = patch.reason;
        }

        self.write_pending(&mut request).await?;
        info!(leave_request_id = id, days = request.days, "Leave request updated");
        Ok(request)
    }

    pub async fn approve(
        &self,
        id: u64,
        approver_id: u64,
        notes: Option<String>,
    ) -> AppResult<LeaveRequest> {
        let mut request = self.find_pending(id).await?;
        let year = self.clock.current_year();

        self.ledger
            .consume(request.employee_id, request.leave_type_id, year, request.days)
            .await?;

        request.status = LeaveStatus::Approved;
        request.approver_id = Some(approver_id);
        request.approved_at = Some(self.clock.now());
        request.review_notes = notes;

        if let Err(e) = self.write_pending(&mut request).await {
            self.ledger
                .release(request.employee_id, request.leave_type_id, year, request.days)
                .await?;
            return Err(e);
        }

        info!(
            leave_request_id = id,
            employee_id = request.employee_id,
            approver_id,
            days = request.days,
            "Leave request approved"
        );
        Ok(request)
    }

    pub async fn reject(
        &self,
        id: u64,
        approver_id: u64,
        reason: String,
    ) -> AppResult<LeaveRequest> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(AppError::Validation("rejection reason is required".into()));
        }
        let mut request = self.find_pending(id).await?;

        request.status = LeaveStatus::Rejected;
        request.approver_id = Some(approver_id);
        request.rejection_reason = Some(reason);

        self.write_pending(&mut request).await?;
        info!(
            leave_request_id = id,
            employee_id = request.employee_id,
            approver_id,
            "Leave request rejected"
        );
        Ok(request)
    }

    /// Only the owner may cancel, and only while pending.
    pub async fn cancel(&self, id: u64, requester_id: u64) -> AppResult<LeaveRequest> {
        let mut request = self.find(id).await?;
        if request.employee_id != requester_id {
            return Err(AppError::Forbidden(
                "Only the requesting employee can cancel a leave request".into(),
            ));
        }
        if request.status.is_terminal() {
            return Err(AppError::InvalidState {
                current: request.status,
            });
        }

        request.status = LeaveStatus::Cancelled;
        self.write_pending(&mut request).await?;
        info!(leave_request_id = id, employee_id = requester_id, "Leave request cancelled");
        Ok(request)
    }

    /// One row per active leave type, created at zero when never touched.
    /// Deactivated types appear only if the year already has a row.
    pub async fn balances(
        &self,
        employee_id: u64,
        year: Option<i32>,
    ) -> AppResult<Vec<LeaveBalance>> {
        let year = year.unwrap_or_else(|| self.clock.current_year());
        let mut balances = Vec::new();
        for leave_type in self.store.list_leave_types(true).await? {
            let balance = if leave_type.is_active {
                Some(self.ledger.get_or_create(employee_id, leave_type.id, year).await?)
            } else {
                self.store.find_balance(employee_id, leave_type.id, year).await?
            };
            balances.extend(balance);
        }
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_policy::CreateLeavePolicy;
    use crate::test_support::{TestServices, date, leave_type_input, services};

    const EMPLOYEE: u64 = 1000;
    const MANAGER: u64 = 7;

    async fn vacation(s: &TestServices, accrued: f64) -> LeaveType {
        let vac = s
            .catalog
            .create_type(leave_type_input("VAC", Some(20), true))
            .await
            .unwrap();
        s.store.seed_balance(EMPLOYEE, vac.id, 2024, accrued);
        vac
    }

    fn request(leave_type_id: u64, start: NaiveDate, end: NaiveDate) -> CreateLeaveRequest {
        CreateLeaveRequest {
            employee_id: None,
            leave_type_id,
            start_date: start,
            end_date: end,
            reason: Some("Family trip".into()),
        }
    }

    async fn balance(s: &TestServices, leave_type_id: u64) -> LeaveBalance {
        s.ledger.get_or_create(EMPLOYEE, leave_type_id, 2024).await.unwrap()
    }

    #[actix_web::test]
    async fn request_is_pending_and_leaves_the_balance_alone() {
        let s = services();
        let vac = vacation(&s, 20.0).await;

        let created = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 5)))
            .await
            .unwrap();
        assert_eq!(created.status, LeaveStatus::Pending);
        assert_eq!(created.days, 5);
        assert_eq!(balance(&s, vac.id).await.balance, 20.0);
    }

    #[actix_web::test]
    async fn approval_consumes_and_approved_cannot_be_cancelled() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let created = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 5)))
            .await
            .unwrap();

        let approved = s
            .leave
            .approve(created.id, MANAGER, Some("Enjoy".into()))
            .await
            .unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approver_id, Some(MANAGER));
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.review_notes.as_deref(), Some("Enjoy"));

        let b = balance(&s, vac.id).await;
        assert_eq!((b.accrued, b.used, b.balance), (20.0, 5.0, 15.0));

        let err = s.leave.cancel(created.id, EMPLOYEE).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { current: LeaveStatus::Approved }));
        assert_eq!(balance(&s, vac.id).await.balance, 15.0);
    }

    #[actix_web::test]
    async fn terminal_requests_never_change_status() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let r = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 2)))
            .await
            .unwrap();
        s.leave.reject(r.id, MANAGER, "Busy week".into()).await.unwrap();

        assert!(matches!(
            s.leave.approve(r.id, MANAGER, None).await,
            Err(AppError::InvalidState { current: LeaveStatus::Rejected })
        ));
        assert!(matches!(
            s.leave.cancel(r.id, EMPLOYEE).await,
            Err(AppError::InvalidState { .. })
        ));
        assert!(matches!(
            s.leave.update(r.id, UpdateLeaveRequest::default()).await,
            Err(AppError::InvalidState { .. })
        ));
        assert_eq!(s.leave.find(r.id).await.unwrap().status, LeaveStatus::Rejected);
        assert_eq!(balance(&s, vac.id).await.used, 0.0);
    }

    #[actix_web::test]
    async fn over_the_cap_fails_before_anything_is_written() {
        let s = services();
        let vac = vacation(&s, 30.0).await;

        let err = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 25)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PolicyLimitExceeded { requested: 25, max: 20 }));
        assert!(s.leave.list(&LeaveRequestFilter::default()).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn insufficient_balance_and_bad_ranges_are_refused() {
        let s = services();
        let vac = vacation(&s, 3.0).await;

        assert!(matches!(
            s.leave
                .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 5)))
                .await,
            Err(AppError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            s.leave
                .create(EMPLOYEE, request(vac.id, date(2024, 6, 5), date(2024, 6, 1)))
                .await,
            Err(AppError::InvalidRange)
        ));
    }

    #[actix_web::test]
    async fn only_the_owner_may_cancel() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let r = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 1)))
            .await
            .unwrap();

        assert!(matches!(
            s.leave.cancel(r.id, EMPLOYEE + 1).await,
            Err(AppError::Forbidden(_))
        ));
        let cancelled = s.leave.cancel(r.id, EMPLOYEE).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
        assert_eq!(balance(&s, vac.id).await.used, 0.0);
    }

    #[actix_web::test]
    async fn types_without_approval_are_approved_on_creation() {
        let s = services();
        let sick = s
            .catalog
            .create_type(leave_type_input("SICK", None, false))
            .await
            .unwrap();
        s.store.seed_balance(EMPLOYEE, sick.id, 2024, 10.0);

        let r = s
            .leave
            .create(EMPLOYEE, request(sick.id, date(2024, 6, 3), date(2024, 6, 4)))
            .await
            .unwrap();
        assert_eq!(r.status, LeaveStatus::Approved);
        assert!(r.approved_at.is_some());
        assert_eq!(balance(&s, sick.id).await.balance, 8.0);
    }

    #[actix_web::test]
    async fn update_recounts_days_from_patched_and_stored_dates() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let r = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 5)))
            .await
            .unwrap();

        let updated = s
            .leave
            .update(
                r.id,
                UpdateLeaveRequest {
                    end_date: Some(date(2024, 6, 10)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.start_date, date(2024, 6, 1));
        assert_eq!(updated.days, 10);

        let err = s
            .leave
            .update(
                r.id,
                UpdateLeaveRequest {
                    start_date: Some(date(2024, 6, 11)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange));
        assert_eq!(s.leave.find(r.id).await.unwrap().days, 10);
    }

    #[actix_web::test]
    async fn most_specific_policy_sets_the_limits() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        s.store.add_employee(EMPLOYEE, Some(10), Some(3));
        let policy = |department_id, position_id, max_days, min_days| CreateLeavePolicy {
            leave_type_id: vac.id,
            department_id,
            position_id,
            max_days,
            min_days,
            accrual_rate: None,
        };
        s.catalog.create_policy(policy(Some(10), None, Some(3), None)).await.unwrap();
        s.catalog.create_policy(policy(None, Some(3), Some(5), Some(2))).await.unwrap();

        assert!(matches!(
            s.leave
                .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 1)))
                .await,
            Err(AppError::PolicyMinimumNotMet { requested: 1, min: 2 })
        ));
        assert!(matches!(
            s.leave
                .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 6)))
                .await,
            Err(AppError::PolicyLimitExceeded { requested: 6, max: 5 })
        ));
        // Position policy allows more than the department one would.
        let ok = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 4)))
            .await
            .unwrap();
        assert_eq!(ok.days, 4);
    }

    #[actix_web::test]
    async fn deactivated_type_keeps_its_used_balance_visible() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let r = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 3)))
            .await
            .unwrap();
        s.leave.approve(r.id, MANAGER, None).await.unwrap();
        s.catalog.deactivate_type(vac.id).await.unwrap();

        let balances = s.leave.balances(EMPLOYEE, None).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!((balances[0].used, balances[0].balance), (3.0, 17.0));

        assert!(s.leave.balances(EMPLOYEE, Some(2023)).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn stale_copy_cannot_overwrite_a_concurrent_edit() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let r = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 5)))
            .await
            .unwrap();
        let mut stale = s.leave.find(r.id).await.unwrap();

        let edited = s
            .leave
            .update(
                r.id,
                UpdateLeaveRequest {
                    end_date: Some(date(2024, 6, 3)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.version, 1);

        stale.status = LeaveStatus::Approved;
        let err = s.leave.write_pending(&mut stale).await.unwrap_err();
        assert!(matches!(err, AppError::ConcurrentModification(_)));

        let stored = s.leave.find(r.id).await.unwrap();
        assert_eq!((stored.status, stored.days), (LeaveStatus::Pending, 3));

        let approved = s.leave.approve(r.id, MANAGER, None).await.unwrap();
        assert_eq!((approved.days, approved.version), (3, 2));
        assert_eq!(balance(&s, vac.id).await.balance, 17.0);
    }

    #[actix_web::test]
    async fn inactive_types_are_refused_and_hidden_from_balances() {
        let s = services();
        let vac = vacation(&s, 20.0).await;
        let sick = s
            .catalog
            .create_type(leave_type_input("SICK", None, true))
            .await
            .unwrap();
        s.catalog.deactivate_type(sick.id).await.unwrap();

        assert!(matches!(
            s.leave
                .create(EMPLOYEE, request(sick.id, date(2024, 6, 1), date(2024, 6, 1)))
                .await,
            Err(AppError::Validation(_))
        ));

        let balances = s.leave.balances(EMPLOYEE, None).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].leave_type_id, vac.id);
        assert_eq!(balances[0].year, 2024);

        let other_year = s.leave.balances(EMPLOYEE, Some(2023)).await.unwrap();
        assert_eq!(other_year[0].balance, 0.0);
    }

    #[actix_web::test]
    async fn approval_beyond_the_balance_stays_pending() {
        let s = services();
        let vac = vacation(&s, 5.0).await;
        let first = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 6, 1), date(2024, 6, 4)))
            .await
            .unwrap();
        let second = s
            .leave
            .create(EMPLOYEE, request(vac.id, date(2024, 7, 1), date(2024, 7, 4)))
            .await
            .unwrap();

        s.leave.approve(first.id, MANAGER, None).await.unwrap();
        assert!(matches!(
            s.leave.approve(second.id, MANAGER, None).await,
            Err(AppError::InsufficientBalance { .. })
        ));
        assert_eq!(s.leave.find(second.id).await.unwrap().status, LeaveStatus::Pending);
        let b = balance(&s, vac.id).await;
        assert_eq!((b.used, b.balance), (4.0, 1.0));
    }
}
