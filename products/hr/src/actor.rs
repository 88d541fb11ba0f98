use entity::account::{self, AccountRole};
use platform_authz::{StaffRole, Subject};
use serde::Serialize;

use crate::{HrError, HrResult};

/// The logged-in account a request acts as. Built per request from the
/// session, never stored globally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub account_id: i32,
    pub username: String,
    pub subject: Subject,
}

impl Actor {
    pub fn new(account_id: i32, username: impl Into<String>, subject: Subject) -> Self {
        Self {
            account_id,
            username: username.into(),
            subject,
        }
    }

    /// An employee-role account without a linked employee cannot act.
    pub fn from_account(account: &account::Model) -> HrResult<Self> {
        let subject = match (account.role, account.employee_id) {
            (AccountRole::Superadmin, _) => Subject::staff(StaffRole::Superadmin),
            (AccountRole::Admin, _) => Subject::staff(StaffRole::Admin),
            (AccountRole::Hr, _) => Subject::staff(StaffRole::Hr),
            (AccountRole::Employee, Some(employee_id)) => Subject::employee(employee_id),
            (AccountRole::Employee, None) => return Err(HrError::Unauthenticated),
        };
        Ok(Self::new(account.id, account.username.clone(), subject))
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.subject, Subject::Staff { .. })
    }
}
