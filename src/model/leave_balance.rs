use serde::Serialize;
use utoipa::{IntoParams, ToSchema};

/// Per employee, leave type and calendar year. `balance == accrued - used` always.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "leave_type_id": 1,
    "year": 2024,
    "accrued": 20.0,
    "used": 5.0,
    "balance": 15.0
}))]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub year: i32,
    pub accrued: f64,
    pub used: f64,
    pub balance: f64,
    #[serde(skip)]
    pub version: u32,
}

impl LeaveBalance {
    pub fn empty(employee_id: u64, leave_type_id: u64, year: i32) -> Self {
        Self {
            id: 0,
            employee_id,
            leave_type_id,
            year,
            accrued: 0.0,
            used: 0.0,
            balance: 0.0,
            version: 0,
        }
    }

    /// Returns the balance after using `days`, or `None` if it would go negative.
    pub fn after_consuming(&self, days: f64) -> Option<Self> {
        let used = self.used + days;
        let balance = self.accrued - used;
        if balance < 0.0 {
            return None;
        }
        Some(Self {
            used,
            balance,
            ..self.clone()
        })
    }

    pub fn after_releasing(&self, days: f64) -> Self {
        let used = (self.used - days).max(0.0);
        Self {
            used,
            balance: self.accrued - used,
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, serde::Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BalanceQuery {
    /// Calendar year, defaults to the current one
    pub year: Option<i32>,
}
