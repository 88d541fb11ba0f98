//! HR vertical: employee directory, attendance, leave workflow, payroll ledger
//! and the CSV/PDF reports built from them.
//!
//! Every operation takes the acting [`Actor`], asks the policy table whether
//! it may proceed and then runs as a single database transaction that also
//! appends the audit entry.

mod actor;
mod attendance;
mod audit;
mod directory;
mod error;
mod identity;
mod leave;
mod payroll;
mod photos;
mod reports;
mod seed;

pub use actor::Actor;
pub use directory::{Dashboard, EmployeeInput, UpsertOutcome};
pub use error::{HrError, HrResult};
pub use identity::NewAccount;
pub use payroll::PayrollInput;
pub use photos::{PhotoStore, PhotoUpload, sanitize_file_name};
pub use reports::{Payslip, format_amount};
pub use seed::SeedReport;

use platform_authz::{Action, AuthzError, PolicyContext, PolicyEngine};
use sea_orm::DatabaseConnection;

/// Knobs for the leave workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeavePolicy {
    /// Let reviewers overwrite an approved/rejected decision.
    pub allow_redecide: bool,
    /// Reject requests whose end date precedes the start date.
    pub enforce_date_order: bool,
}

pub struct HrModule {
    db: DatabaseConnection,
    photos: PhotoStore,
    leave_policy: LeavePolicy,
    policy: PolicyEngine,
}

impl HrModule {
    pub fn new(db: DatabaseConnection, photos: PhotoStore) -> Self {
        Self {
            db,
            photos,
            leave_policy: LeavePolicy::default(),
            policy: PolicyEngine,
        }
    }

    pub fn with_leave_policy(mut self, leave_policy: LeavePolicy) -> Self {
        self.leave_policy = leave_policy;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        self.leave_policy
    }

    fn authorize(&self, actor: &Actor, action: Action, owner: Option<i32>) -> HrResult<()> {
        self.policy
            .check(&PolicyContext {
                subject: actor.subject,
                action,
                owner,
            })
            .map_err(|err| {
                tracing::warn!(actor = %actor.username, error = %err, "policy denied");
                HrError::Forbidden(err)
            })
    }

    /// Role-only check run before the target is looked up, so a denied
    /// subject cannot learn whether a code or id exists.
    fn authorize_role(&self, actor: &Actor, action: Action) -> HrResult<()> {
        self.authorize(actor, action, None)
    }

    /// Employee logins get 403 for a missing target, same as for someone
    /// else's record.
    fn conceal_missing<T>(&self, actor: &Actor, action: Action, found: HrResult<T>) -> HrResult<T> {
        match found {
            Err(HrError::NotFound(_)) if !actor.is_staff() => {
                tracing::warn!(actor = %actor.username, action = action.as_str(), "policy denied");
                Err(HrError::Forbidden(AuthzError::NotOwner {
                    action: action.as_str(),
                }))
            }
            other => other,
        }
    }
}
