pub mod attendance;
pub mod leave;
pub mod leave_catalog;
pub mod ledger;
pub mod schedule;

pub use attendance::AttendanceService;
pub use leave::LeaveWorkflow;
pub use leave_catalog::LeaveCatalog;
pub use ledger::LeaveBalanceLedger;
pub use schedule::ScheduleService;
