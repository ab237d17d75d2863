pub mod attendance;
pub mod leave_policy;
pub mod leave_request;
pub mod leave_type;
pub mod work_schedule;
