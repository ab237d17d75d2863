use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::model::leave_policy::{CreateLeavePolicy, LeavePolicy, UpdateLeavePolicy};
use crate::model::leave_type::{self, CreateLeaveType, LeaveType, UpdateLeaveType};
use crate::store::LeaveStore;

/// Leave types and the policies layered on top of them.
#[derive(Clone)]
pub struct LeaveCatalog {
    store: Arc<dyn LeaveStore>,
}

impl LeaveCatalog {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    pub async fn create_type(&self, input: CreateLeaveType) -> AppResult<LeaveType> {
        let leave_type = input.into_leave_type();
        leave_type::validate(&leave_type).map_err(AppError::Validation)?;

        let leave_type = self.store.insert_leave_type(&leave_type).await?;
        info!(leave_type_id = leave_type.id, code = %leave_type.code, "Leave type created");
        Ok(leave_type)
    }

    pub async fn find_type(&self, id: u64) -> AppResult<LeaveType> {
        self.store
            .find_leave_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave type", id))
    }

    pub async fn list_types(&self, include_inactive: bool) -> AppResult<Vec<LeaveType>> {
        self.store.list_leave_types(include_inactive).await
    }

    pub async fn update_type(&self, id: u64, patch: UpdateLeaveType) -> AppResult<LeaveType> {
        let mut leave_type = self.find_type(id).await?;
        patch.apply(&mut leave_type);
        leave_type::validate(&leave_type).map_err(AppError::Validation)?;

        self.store.update_leave_type(&leave_type).await?;
        info!(leave_type_id = id, "Leave type updated");
        Ok(leave_type)
    }

    /// Soft delete: the type stays referenced by existing requests and balances.
    pub async fn deactivate_type(&self, id: u64) -> AppResult<LeaveType> {
        let mut leave_type = self.find_type(id).await?;
        leave_type.is_active = false;

        self.store.update_leave_type(&leave_type).await?;
        info!(leave_type_id = id, "Leave type deactivated");
        Ok(leave_type)
    }

    pub async fn create_policy(&self, input: CreateLeavePolicy) -> AppResult<LeavePolicy> {
        let policy = input.into_policy();
        policy.validate().map_err(AppError::Validation)?;
        if policy.department_id.is_some() && policy.position_id.is_some() {
            return Err(AppError::Validation(
                "a policy is scoped to a department or a position, not both".into(),
            ));
        }
        self.find_type(policy.leave_type_id).await?;

        let policy = self.store.insert_policy(&policy).await?;
        info!(
            policy_id = policy.id,
            leave_type_id = policy.leave_type_id,
            "Leave policy created"
        );
        Ok(policy)
    }

    pub async fn find_policy(&self, id: u64) -> AppResult<LeavePolicy> {
        self.store
            .find_policy(id)
            .await?
            .ok_or_else(|| AppError::not_found("Leave policy", id))
    }

    pub async fn list_policies(&self, leave_type_id: Option<u64>) -> AppResult<Vec<LeavePolicy>> {
        self.store.list_policies(leave_type_id).await
    }

    pub async fn update_policy(&self, id: u64, patch: UpdateLeavePolicy) -> AppResult<LeavePolicy> {
        let mut policy = self.find_policy(id).await?;
        patch.apply(&mut policy);
        policy.validate().map_err(AppError::Validation)?;

        self.store.update_policy(&policy).await?;
        info!(policy_id = id, "Leave policy updated");
        Ok(policy)
    }

    pub async fn delete_policy(&self, id: u64) -> AppResult<()> {
        if !self.store.delete_policy(id).await? {
            return Err(AppError::not_found("Leave policy", id));
        }
        info!(policy_id = id, "Leave policy deleted");
        Ok(())
    }
}
