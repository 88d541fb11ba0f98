use chrono::{NaiveDate, NaiveDateTime};
use entity::attendance::{self, AttendanceStatus};
use platform_authz::Action;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::instrument;

use crate::directory::employee_by_code;
use crate::{Actor, HrError, HrModule, HrResult, audit};

/// Missing or unparseable dates fall back to `today`.
pub(crate) fn resolve_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<NaiveDate>().ok())
        .unwrap_or(today)
}

impl HrModule {
    /// First check-in of the day creates the record as present; later ones
    /// overwrite the check-in time. Returns the date recorded.
    #[instrument(skip_all, fields(actor = %actor.username, emp_code = %emp_code))]
    pub async fn check_in(
        &self,
        actor: &Actor,
        emp_code: &str,
        date: Option<&str>,
        now: NaiveDateTime,
    ) -> HrResult<NaiveDate> {
        let day = resolve_date(date, now.date());
        self.authorize_role(actor, Action::RecordAttendance)?;
        let txn = self.db.begin().await?;
        let employee = employee_by_code(&txn, emp_code).await?;
        self.authorize(actor, Action::RecordAttendance, Some(employee.id))?;

        attendance::Entity::insert(attendance::ActiveModel {
            employee_id: Set(employee.id),
            date: Set(day),
            check_in: Set(Some(now.time())),
            status: Set(AttendanceStatus::Present),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([attendance::Column::EmployeeId, attendance::Column::Date])
                .update_column(attendance::Column::CheckIn)
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        audit::record(
            &txn,
            &actor.username,
            format!("checkin {}", employee.emp_code),
        )
        .await?;
        txn.commit().await?;
        Ok(day)
    }

    /// Requires a check-in on the same date.
    #[instrument(skip_all, fields(actor = %actor.username, emp_code = %emp_code))]
    pub async fn check_out(
        &self,
        actor: &Actor,
        emp_code: &str,
        date: Option<&str>,
        now: NaiveDateTime,
    ) -> HrResult<NaiveDate> {
        let day = resolve_date(date, now.date());
        self.authorize_role(actor, Action::RecordAttendance)?;
        let txn = self.db.begin().await?;
        let employee = employee_by_code(&txn, emp_code).await?;
        self.authorize(actor, Action::RecordAttendance, Some(employee.id))?;

        let record = attendance::Entity::find()
            .filter(attendance::Column::EmployeeId.eq(employee.id))
            .filter(attendance::Column::Date.eq(day))
            .one(&txn)
            .await?
            .ok_or_else(|| HrError::not_found("no checkin record"))?;
        let mut active: attendance::ActiveModel = record.into();
        active.check_out = Set(Some(now.time()));
        active.update(&txn).await?;
        audit::record(
            &txn,
            &actor.username,
            format!("checkout {}", employee.emp_code),
        )
        .await?;
        txn.commit().await?;
        Ok(day)
    }
}
