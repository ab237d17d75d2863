use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Vacation",
    "code": "VAC",
    "description": "Paid annual leave",
    "max_days_per_request": 20,
    "carry_forward": true,
    "requires_approval": true,
    "is_active": true
}))]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub max_days_per_request: Option<i32>,
    pub carry_forward: bool,
    pub requires_approval: bool,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Vacation")]
    pub name: String,
    #[schema(example = "VAC")]
    pub code: String,
    pub description: Option<String>,
    #[schema(example = 20)]
    pub max_days_per_request: Option<i32>,
    #[serde(default)]
    pub carry_forward: bool,
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
}

fn default_requires_approval() -> bool {
    true
}

impl CreateLeaveType {
    pub fn into_leave_type(self) -> LeaveType {
        LeaveType {
            id: 0,
            name: self.name.trim().to_string(),
            code: self.code.trim().to_uppercase(),
            description: self.description,
            max_days_per_request: self.max_days_per_request,
            carry_forward: self.carry_forward,
            requires_approval: self.requires_approval,
            is_active: true,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateLeaveType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_days_per_request: Option<i32>,
    pub carry_forward: Option<bool>,
    pub requires_approval: Option<bool>,
    pub is_active: Option<bool>,
}

impl UpdateLeaveType {
    pub fn apply(self, leave_type: &mut LeaveType) {
        if let Some(name) = self.name {
            leave_type.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            leave_type.description = Some(description);
        }
        if let Some(max) = self.max_days_per_request {
            leave_type.max_days_per_request = Some(max);
        }
        if let Some(carry_forward) = self.carry_forward {
            leave_type.carry_forward = carry_forward;
        }
        if let Some(requires_approval) = self.requires_approval {
            leave_type.requires_approval = requires_approval;
        }
        if let Some(active) = self.is_active {
            leave_type.is_active = active;
        }
    }
}

pub fn validate(leave_type: &LeaveType) -> Result<(), String> {
    if leave_type.name.is_empty() || leave_type.code.is_empty() {
        return Err("name and code are required".into());
    }
    if leave_type.max_days_per_request.is_some_and(|max| max < 1) {
        return Err("max_days_per_request must be at least 1".into());
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveTypeQuery {
    /// Include soft-deleted leave types
    pub include_inactive: Option<bool>,
}
