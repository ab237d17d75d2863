use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::employee::EmployeeProfile;

/// Per-scope overrides for a leave type. Read by the workflow, never written by it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LeavePolicy {
    pub id: u64,
    pub leave_type_id: u64,
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
    pub max_days: Option<i32>,
    pub min_days: Option<i32>,
    /// Days accrued per month by the external accrual process
    pub accrual_rate: Option<f64>,
    pub is_active: bool,
}

impl LeavePolicy {
    /// Higher is more specific; `None` when the policy does not cover the employee.
    pub fn specificity_for(&self, employee: &EmployeeProfile) -> Option<u8> {
        if !self.is_active {
            return None;
        }
        match (self.position_id, self.department_id) {
            (Some(position), _) if employee.position_id == Some(position) => Some(2),
            (Some(_), _) => None,
            (None, Some(department)) if employee.department_id == Some(department) => Some(1),
            (None, Some(_)) => None,
            (None, None) => Some(0),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_days.is_some_and(|d| d < 1) || self.min_days.is_some_and(|d| d < 1) {
            return Err("max_days and min_days must be at least 1".into());
        }
        if let (Some(min), Some(max)) = (self.min_days, self.max_days) {
            if min > max {
                return Err("min_days cannot exceed max_days".into());
            }
        }
        if self.accrual_rate.is_some_and(|r| r < 0.0) {
            return Err("accrual_rate cannot be negative".into());
        }
        Ok(())
    }
}

/// Picks the most specific active policy covering the employee.
pub fn applicable<'a>(
    policies: &'a [LeavePolicy],
    employee: &EmployeeProfile,
) -> Option<&'a LeavePolicy> {
    policies
        .iter()
        .filter_map(|p| p.specificity_for(employee).map(|rank| (rank, p)))
        .max_by_key(|(rank, p)| (*rank, std::cmp::Reverse(p.id)))
        .map(|(_, p)| p)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeavePolicy {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
    #[schema(example = 10)]
    pub max_days: Option<i32>,
    pub min_days: Option<i32>,
    #[schema(example = 1.5)]
    pub accrual_rate: Option<f64>,
}

impl CreateLeavePolicy {
    pub fn into_policy(self) -> LeavePolicy {
        LeavePolicy {
            id: 0,
            leave_type_id: self.leave_type_id,
            department_id: self.department_id,
            position_id: self.position_id,
            max_days: self.max_days,
            min_days: self.min_days,
            accrual_rate: self.accrual_rate,
            is_active: true,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateLeavePolicy {
    pub max_days: Option<i32>,
    pub min_days: Option<i32>,
    pub accrual_rate: Option<f64>,
    pub is_active: Option<bool>,
}

impl UpdateLeavePolicy {
    pub fn apply(self, policy: &mut LeavePolicy) {
        if let Some(max) = self.max_days {
            policy.max_days = Some(max);
        }
        if let Some(min) = self.min_days {
            policy.min_days = Some(min);
        }
        if let Some(rate) = self.accrual_rate {
            policy.accrual_rate = Some(rate);
        }
        if let Some(active) = self.is_active {
            policy.is_active = active;
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeavePolicyQuery {
    /// Only policies for this leave type
    pub leave_type_id: Option<u64>,
}
