use serde::Serialize;

/// Slice of the employee directory the attendance and leave rules depend on.
/// `position_id` is the directory's job title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EmployeeProfile {
    pub id: u64,
    pub department_id: Option<u64>,
    pub position_id: Option<u64>,
}
