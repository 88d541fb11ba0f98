use chrono::Utc;
use entity::payroll;
use platform_authz::Action;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::Deserialize;
use tracing::instrument;

use crate::directory::employee_by_code;
use crate::{Actor, HrError, HrModule, HrResult, audit};

const MAX_MONTH_LEN: usize = 20;

/// Payroll form as submitted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PayrollInput {
    #[serde(default)]
    pub emp_code: String,
    pub month: Option<String>,
    pub year: Option<String>,
    pub net_salary: Option<String>,
}

/// Parsed period and amount. Blank year means 0, blank net means 0.0.
#[derive(Debug, PartialEq)]
struct PayrollEntry {
    month: String,
    year: i32,
    net_salary: f64,
}

impl PayrollEntry {
    fn parse(input: &PayrollInput) -> HrResult<Self> {
        let invalid = || HrError::validation("invalid data");
        let month = input.month.as_deref().unwrap_or_default().trim().to_string();
        if month.chars().count() > MAX_MONTH_LEN {
            return Err(HrError::validation(format!(
                "month must be <= {MAX_MONTH_LEN} characters"
            )));
        }
        let year = match input.year.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw.parse::<i32>().map_err(|_| invalid())?,
        };
        let net_salary = match input.net_salary.as_deref().map(str::trim) {
            None | Some("") => 0.0,
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|net| net.is_finite())
                .ok_or_else(invalid)?,
        };
        Ok(Self {
            month,
            year,
            net_salary,
        })
    }
}

impl HrModule {
    /// Appends a payroll row. Periods are not checked for duplicates.
    #[instrument(skip_all, fields(actor = %actor.username, emp_code = %input.emp_code))]
    pub async fn create_payroll(
        &self,
        actor: &Actor,
        input: PayrollInput,
    ) -> HrResult<payroll::Model> {
        self.authorize_role(actor, Action::CreatePayroll)?;
        let txn = self.db.begin().await?;
        let employee = employee_by_code(&txn, &input.emp_code).await?;
        self.authorize(actor, Action::CreatePayroll, Some(employee.id))?;
        let entry = PayrollEntry::parse(&input)?;

        let created = payroll::ActiveModel {
            employee_id: Set(employee.id),
            month: Set(entry.month.clone()),
            year: Set(entry.year),
            net_salary: Set(entry.net_salary),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        audit::record(
            &txn,
            &actor.username,
            format!(
                "payroll create {} {}/{}",
                employee.emp_code, entry.month, entry.year
            ),
        )
        .await?;
        txn.commit().await?;
        Ok(created)
    }
}
