use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::attendance::AttendanceListResponse;
use crate::api::leave_request::LeaveListResponse;
use crate::model::attendance::{
    Attendance, AttendanceStatus, AttendanceSummary, CheckInOut, CreateAttendance,
    UpdateAttendance,
};
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_policy::{CreateLeavePolicy, LeavePolicy, UpdateLeavePolicy};
use crate::model::leave_request::{
    ApproveLeave, CreateLeaveRequest, LeaveRequest, LeaveStatus, RejectLeave, UpdateLeaveRequest,
};
use crate::model::leave_type::{CreateLeaveType, LeaveType, UpdateLeaveType};
use crate::model::work_schedule::{CreateWorkSchedule, UpdateWorkSchedule, WorkSchedule};

/// Registers the `bearer_auth` scheme referenced by every path.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance & Leave API",
        version = "1.0.0",
        description = r#"
## Attendance and Leave Management

Daily attendance tracking and the leave request workflow of the HRM system.

### Key Features
- **Attendance**
  - Check-in / check-out with lateness and overtime against the employee's work schedule
  - HR corrections and per-employee summaries
- **Work schedules**
  - Employee, position, department and global default schedules
- **Leave**
  - Leave types and policies, per-year balances
  - Requests move PENDING → APPROVED / REJECTED / CANCELLED; approval consumes the balance

### Security
All endpoints require a **JWT Bearer** access token.
Only **Admin** or **HR** can manage schedules, leave types and policies or approve requests.

### Response Format
- JSON bodies; errors are `{"code": "...", "message": "..."}`
- Pagination (`page`, `per_page`) on attendance and leave request lists
"#,
    ),
    paths(
        crate::api::attendance::create_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::attendance_summary,

        crate::api::work_schedule::create_schedule,
        crate::api::work_schedule::list_schedules,
        crate::api::work_schedule::get_schedule,
        crate::api::work_schedule::update_schedule,
        crate::api::work_schedule::delete_schedule,

        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::get_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_balances,

        crate::api::leave_policy::create_policy,
        crate::api::leave_policy::list_policies,
        crate::api::leave_policy::get_policy,
        crate::api::leave_policy::update_policy,
        crate::api::leave_policy::delete_policy
    ),
    components(
        schemas(
            Attendance,
            AttendanceStatus,
            AttendanceSummary,
            AttendanceListResponse,
            CreateAttendance,
            UpdateAttendance,
            CheckInOut,
            WorkSchedule,
            CreateWorkSchedule,
            UpdateWorkSchedule,
            LeaveType,
            CreateLeaveType,
            UpdateLeaveType,
            LeavePolicy,
            CreateLeavePolicy,
            UpdateLeavePolicy,
            LeaveRequest,
            LeaveStatus,
            LeaveListResponse,
            CreateLeaveRequest,
            UpdateLeaveRequest,
            ApproveLeave,
            RejectLeave,
            LeaveBalance
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance tracking APIs"),
        (name = "Work schedule", description = "Work schedule management APIs"),
        (name = "Leave", description = "Leave request workflow and balances"),
        (name = "Leave type", description = "Leave type catalog APIs"),
        (name = "Leave policy", description = "Leave policy APIs"),
    )
)]
pub struct ApiDoc;
