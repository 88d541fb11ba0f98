//! Database models for the HR/payroll schema.
//!
//! Employee is the aggregation root: attendance, leave requests, payrolls and
//! employee-role accounts all hang off it and go away with it.

pub mod account;
pub mod attendance;
pub mod audit_log;
pub mod department;
pub mod employee;
pub mod job_role;
pub mod leave_request;
pub mod payroll;
pub mod session;

pub mod prelude {
    pub use crate::account::Entity as Account;
    pub use crate::attendance::Entity as Attendance;
    pub use crate::audit_log::Entity as AuditLog;
    pub use crate::department::Entity as Department;
    pub use crate::employee::Entity as Employee;
    pub use crate::job_role::Entity as JobRole;
    pub use crate::leave_request::Entity as LeaveRequest;
    pub use crate::payroll::Entity as Payroll;
    pub use crate::session::Entity as Session;
}
