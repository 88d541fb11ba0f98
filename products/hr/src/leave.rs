use chrono::{NaiveDate, Utc};
use entity::leave_request::{self, LeaveStatus};
use platform_authz::Action;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use tracing::instrument;

use crate::directory::employee_by_code;
use crate::{Actor, HrError, HrModule, HrResult, audit};

const MAX_REASON_LEN: usize = 500;

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)?.parse().ok()
}

impl HrModule {
    /// Files a pending request. Both dates are required ISO dates.
    #[instrument(skip_all, fields(actor = %actor.username, emp_code = %emp_code))]
    pub async fn request_leave(
        &self,
        actor: &Actor,
        emp_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        reason: Option<&str>,
    ) -> HrResult<leave_request::Model> {
        self.authorize_role(actor, Action::RequestLeave)?;
        let txn = self.db.begin().await?;
        let found = employee_by_code(&txn, emp_code).await;
        let employee = self.conceal_missing(actor, Action::RequestLeave, found)?;
        self.authorize(actor, Action::RequestLeave, Some(employee.id))?;

        let (Some(start), Some(end)) = (parse_day(start_date), parse_day(end_date)) else {
            return Err(HrError::validation("invalid dates"));
        };
        if end < start {
            if self.leave_policy.enforce_date_order {
                return Err(HrError::validation("end_date before start_date"));
            }
            tracing::warn!(%start, %end, "leave request ends before it starts");
        }
        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if reason.is_some_and(|r| r.chars().count() > MAX_REASON_LEN) {
            return Err(HrError::validation(format!(
                "reason must be <= {MAX_REASON_LEN} characters"
            )));
        }

        let created = leave_request::ActiveModel {
            employee_id: Set(employee.id),
            start_date: Set(start),
            end_date: Set(end),
            reason: Set(reason.map(str::to_string)),
            status: Set(LeaveStatus::Pending),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        audit::record(
            &txn,
            &actor.username,
            format!("leave request {}", employee.emp_code),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    /// `decision` must be exactly `approved` or `rejected`. A request that was
    /// already decided stays as is unless the leave policy allows re-deciding.
    #[instrument(skip_all, fields(actor = %actor.username, leave_id = id, decision = %decision))]
    pub async fn decide_leave(
        &self,
        actor: &Actor,
        id: i32,
        decision: &str,
    ) -> HrResult<leave_request::Model> {
        self.authorize(actor, Action::DecideLeave, None)?;
        let txn = self.db.begin().await?;
        let request = leave_request::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| HrError::not_found("leave request not found"))?;
        let status =
            LeaveStatus::decision(decision).ok_or_else(|| HrError::validation("invalid action"))?;
        if request.status != LeaveStatus::Pending && !self.leave_policy.allow_redecide {
            return Err(HrError::validation(format!(
                "leave request already {}",
                request.status.as_str()
            )));
        }

        let mut active: leave_request::ActiveModel = request.into();
        active.status = Set(status);
        let updated = active.update(&txn).await?;
        audit::record(
            &txn,
            &actor.username,
            format!("leave {} {}", status.as_str(), id),
        )
        .await?;
        txn.commit().await?;
        Ok(updated)
    }
}
