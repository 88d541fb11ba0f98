//! Authorization for the HR service.
//!
//! Every operation asks [`PolicyEngine::check`] before touching data. The
//! answer comes from one table keyed by (role, action) instead of checks
//! scattered across handlers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Superadmin,
    Admin,
    Hr,
}

/// Who is acting. An account is either staff with a role, or an employee
/// login bound to exactly one employee record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Staff { role: StaffRole },
    Employee { employee_id: i32 },
}

impl Subject {
    pub fn staff(role: StaffRole) -> Self {
        Subject::Staff { role }
    }

    pub fn employee(employee_id: i32) -> Self {
        Subject::Employee { employee_id }
    }

    pub fn own_employee_id(&self) -> Option<i32> {
        match self {
            Subject::Employee { employee_id } => Some(*employee_id),
            Subject::Staff { .. } => None,
        }
    }

    fn key(&self) -> RoleKey {
        match self {
            Subject::Staff {
                role: StaffRole::Superadmin,
            } => RoleKey::Superadmin,
            Subject::Staff {
                role: StaffRole::Admin | StaffRole::Hr,
            } => RoleKey::Staff,
            Subject::Employee { .. } => RoleKey::Employee,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDashboard,
    SearchEmployees,
    UpsertEmployee,
    DeleteEmployee,
    RecordAttendance,
    RequestLeave,
    DecideLeave,
    CreatePayroll,
    ViewPayslip,
    ExportReports,
    CreateAccount,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewDashboard => "view_dashboard",
            Action::SearchEmployees => "search_employees",
            Action::UpsertEmployee => "upsert_employee",
            Action::DeleteEmployee => "delete_employee",
            Action::RecordAttendance => "record_attendance",
            Action::RequestLeave => "request_leave",
            Action::DecideLeave => "decide_leave",
            Action::CreatePayroll => "create_payroll",
            Action::ViewPayslip => "view_payslip",
            Action::ExportReports => "export_reports",
            Action::CreateAccount => "create_account",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Any,
    /// Allowed only against the subject's own employee record.
    OwnRecords,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoleKey {
    Superadmin,
    Staff,
    Employee,
}

use Access::{Any, Denied, OwnRecords};

/// Columns: superadmin, admin/hr, employee.
const POLICY: &[(Action, [Access; 3])] = &[
    (Action::ViewDashboard, [Any, Any, OwnRecords]),
    (Action::SearchEmployees, [Any, Any, Denied]),
    (Action::UpsertEmployee, [Any, Any, Denied]),
    (Action::DeleteEmployee, [Any, Any, Denied]),
    (Action::RecordAttendance, [Any, Any, Denied]),
    (Action::RequestLeave, [Any, Any, OwnRecords]),
    (Action::DecideLeave, [Any, Any, Denied]),
    (Action::CreatePayroll, [Any, Any, Denied]),
    (Action::ViewPayslip, [Any, Any, OwnRecords]),
    (Action::ExportReports, [Any, Any, Denied]),
    (Action::CreateAccount, [Any, Denied, Denied]),
];

pub fn access(subject: &Subject, action: Action) -> Access {
    let column = match subject.key() {
        RoleKey::Superadmin => 0,
        RoleKey::Staff => 1,
        RoleKey::Employee => 2,
    };
    POLICY
        .iter()
        .find(|(candidate, _)| *candidate == action)
        .map(|(_, row)| row[column])
        .unwrap_or(Denied)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("action {action} denied")]
    Denied { action: &'static str },
    #[error("action {action} limited to own records")]
    NotOwner { action: &'static str },
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct PolicyContext {
    pub subject: Subject,
    pub action: Action,
    /// Employee the operation targets, when there is one.
    pub owner: Option<i32>,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn check(&self, ctx: &PolicyContext) -> Result<(), AuthzError> {
        match access(&ctx.subject, ctx.action) {
            Any => Ok(()),
            OwnRecords => match (ctx.subject.own_employee_id(), ctx.owner) {
                (Some(own), Some(target)) if own == target => Ok(()),
                // Scoped listings (dashboard) pass without a target; the caller
                // narrows the query to the subject's own records.
                (Some(_), None) => Ok(()),
                _ => Err(AuthzError::NotOwner {
                    action: ctx.action.as_str(),
                }),
            },
            Denied => Err(AuthzError::Denied {
                action: ctx.action.as_str(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 11] = [
        Action::ViewDashboard,
        Action::SearchEmployees,
        Action::UpsertEmployee,
        Action::DeleteEmployee,
        Action::RecordAttendance,
        Action::RequestLeave,
        Action::DecideLeave,
        Action::CreatePayroll,
        Action::ViewPayslip,
        Action::ExportReports,
        Action::CreateAccount,
    ];

    fn check(subject: Subject, action: Action, owner: Option<i32>) -> Result<(), AuthzError> {
        PolicyEngine.check(&PolicyContext {
            subject,
            action,
            owner,
        })
    }

    #[test]
    fn every_action_has_a_policy_row() {
        for action in ALL_ACTIONS {
            assert!(POLICY.iter().any(|(a, _)| *a == action), "{action:?}");
        }
    }

    #[test]
    fn superadmin_may_do_everything() {
        let root = Subject::staff(StaffRole::Superadmin);
        for action in ALL_ACTIONS {
            assert_eq!(check(root, action, Some(7)), Ok(()));
        }
    }

    #[test]
    fn admin_and_hr_manage_records_but_not_accounts() {
        for role in [StaffRole::Admin, StaffRole::Hr] {
            let staff = Subject::staff(role);
            assert!(check(staff, Action::DeleteEmployee, Some(1)).is_ok());
            assert!(check(staff, Action::DecideLeave, None).is_ok());
            assert!(check(staff, Action::ExportReports, None).is_ok());
            assert_eq!(
                check(staff, Action::CreateAccount, None),
                Err(AuthzError::Denied {
                    action: "create_account"
                })
            );
        }
    }

    #[test]
    fn employees_act_only_on_their_own_leave_and_payroll() {
        let me = Subject::employee(3);
        assert!(check(me, Action::RequestLeave, Some(3)).is_ok());
        assert!(check(me, Action::ViewPayslip, Some(3)).is_ok());
        assert_eq!(
            check(me, Action::RequestLeave, Some(4)),
            Err(AuthzError::NotOwner {
                action: "request_leave"
            })
        );
        assert!(check(me, Action::ViewDashboard, None).is_ok());
    }

    #[test]
    fn employees_cannot_manage_directory_or_decide_leave() {
        let me = Subject::employee(3);
        for action in [
            Action::UpsertEmployee,
            Action::DeleteEmployee,
            Action::DecideLeave,
            Action::CreatePayroll,
            Action::ExportReports,
            Action::CreateAccount,
        ] {
            assert!(matches!(
                check(me, action, Some(3)),
                Err(AuthzError::Denied { .. })
            ));
        }
    }
}
