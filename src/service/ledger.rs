use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::model::leave_balance::LeaveBalance;
use crate::store::LeaveStore;

/// Attempts before a contended balance row is reported as a conflict.
const MAX_ATTEMPTS: usize = 3;

/// Per employee / leave type / year balances. Only the leave workflow mutates them.
#[derive(Clone)]
pub struct LeaveBalanceLedger {
    store: Arc<dyn LeaveStore>,
}

impl LeaveBalanceLedger {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    /// Existing row, or a zeroed one created on first access. No accrual is granted here.
    pub async fn get_or_create(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> AppResult<LeaveBalance> {
        if let Some(balance) = self
            .store
            .find_balance(employee_id, leave_type_id, year)
            .await?
        {
            return Ok(balance);
        }

        self.store
            .create_balance_if_absent(employee_id, leave_type_id, year)
            .await?;
        self.store
            .find_balance(employee_id, leave_type_id, year)
            .await?
            .ok_or_else(|| AppError::ConcurrentModification("Leave balance".into()))
    }

    /// `used += days`. Fails with `InsufficientBalance` rather than go below zero.
    pub async fn consume(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
        days: i32,
    ) -> AppResult<LeaveBalance> {
        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.get_or_create(employee_id, leave_type_id, year).await?;
            let next = current.after_consuming(days as f64).ok_or(
                AppError::InsufficientBalance {
                    requested: days as f64,
                    available: current.balance,
                },
            )?;

            if self.store.update_balance(&next).await? {
                info!(
                    employee_id,
                    leave_type_id,
                    year,
                    days,
                    balance = next.balance,
                    "Leave balance consumed"
                );
                return Ok(LeaveBalance {
                    version: next.version + 1,
                    ..next
                });
            }
            warn!(employee_id, leave_type_id, year, attempt, "Leave balance version conflict");
        }

        Err(AppError::ConcurrentModification("Leave balance".into()))
    }

    /// Reverses a consumption whose approval did not go through.
    pub async fn release(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
        days: i32,
    ) -> AppResult<LeaveBalance> {
        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.get_or_create(employee_id, leave_type_id, year).await?;
            let next = current.after_releasing(days as f64);

            if self.store.update_balance(&next).await? {
                info!(
                    employee_id,
                    leave_type_id,
                    year,
                    days,
                    balance = next.balance,
                    "Leave balance released"
                );
                return Ok(LeaveBalance {
                    version: next.version + 1,
                    ..next
                });
            }
            warn!(employee_id, leave_type_id, year, attempt, "Leave balance version conflict");
        }

        Err(AppError::ConcurrentModification("Leave balance".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::services;

    #[actix_web::test]
    async fn first_access_creates_a_zero_row_once() {
        let s = services();
        let first = s.ledger.get_or_create(1, 2, 2024).await.unwrap();
        assert_eq!((first.accrued, first.used, first.balance), (0.0, 0.0, 0.0));

        let again = s.ledger.get_or_create(1, 2, 2024).await.unwrap();
        assert_eq!(first.id, again.id);

        let next_year = s.ledger.get_or_create(1, 2, 2025).await.unwrap();
        assert_ne!(first.id, next_year.id);
    }

    #[actix_web::test]
    async fn consume_keeps_balance_equal_to_accrued_minus_used() {
        let s = services();
        s.store.seed_balance(1, 2, 2024, 20.0);

        for days in [5, 3, 12] {
            let b = s.ledger.consume(1, 2, 2024, days).await.unwrap();
            assert_eq!(b.balance, b.accrued - b.used);
        }
        let b = s.ledger.get_or_create(1, 2, 2024).await.unwrap();
        assert_eq!((b.used, b.balance), (20.0, 0.0));
    }

    #[actix_web::test]
    async fn consume_refuses_to_go_negative() {
        let s = services();
        s.store.seed_balance(1, 2, 2024, 4.0);

        let err = s.ledger.consume(1, 2, 2024, 5).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance { requested, available }
                if requested == 5.0 && available == 4.0
        ));
        let b = s.ledger.get_or_create(1, 2, 2024).await.unwrap();
        assert_eq!(b.used, 0.0);
    }

    #[actix_web::test]
    async fn release_restores_what_was_consumed() {
        let s = services();
        s.store.seed_balance(1, 2, 2024, 10.0);
        s.ledger.consume(1, 2, 2024, 4).await.unwrap();

        let b = s.ledger.release(1, 2, 2024, 4).await.unwrap();
        assert_eq!((b.accrued, b.used, b.balance), (10.0, 0.0, 10.0));
    }

    #[actix_web::test]
    async fn stale_version_is_not_written() {
        let s = services();
        s.store.seed_balance(1, 2, 2024, 10.0);
        let stale = s.ledger.get_or_create(1, 2, 2024).await.unwrap();
        s.store.touch_balance(stale.id);

        let next = stale.after_consuming(1.0).unwrap();
        assert!(!s.store.update_balance(&next).await.unwrap());

        // The ledger re-reads and succeeds.
        let b = s.ledger.consume(1, 2, 2024, 1).await.unwrap();
        assert_eq!(b.balance, 9.0);
    }
}
