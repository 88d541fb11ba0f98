use entity::{
    account::{self, AccountRole},
    attendance, department, employee, job_role, leave_request, payroll, session,
};
use platform_authz::Action;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{Actor, HrError, HrModule, HrResult, PhotoUpload, audit};

const MAX_CODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 120;
const MAX_ADDRESS_LEN: usize = 300;
const DASHBOARD_PAYROLLS: u64 = 50;

/// Raw employee form. Every field is optional text exactly as submitted; a
/// field counts as provided when present and not blank.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EmployeeInput {
    #[serde(default)]
    pub emp_code: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department_id: Option<String>,
    pub role_id: Option<String>,
    pub basic_salary: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpsertOutcome {
    Created(employee::Model),
    Updated(employee::Model),
}

impl UpsertOutcome {
    pub fn employee(&self) -> &employee::Model {
        match self {
            UpsertOutcome::Created(model) | UpsertOutcome::Updated(model) => model,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, UpsertOutcome::Created(_))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Dashboard {
    pub employees: Vec<employee::Model>,
    pub payrolls: Vec<payroll::Model>,
    pub departments: Vec<department::Model>,
    pub roles: Vec<job_role::Model>,
}

/// Parsed and validated form fields; `None` means "leave as is".
#[derive(Debug, Default)]
struct EmployeeFields {
    first_name: Option<String>,
    last_name: Option<String>,
    department_id: Option<i32>,
    job_role_id: Option<i32>,
    basic_salary: Option<f64>,
    contact: Option<String>,
    email: Option<String>,
    address: Option<String>,
}

impl EmployeeFields {
    fn parse(input: &EmployeeInput) -> HrResult<Self> {
        Ok(Self {
            first_name: text_field("first_name", &input.first_name, MAX_NAME_LEN)?,
            last_name: text_field("last_name", &input.last_name, MAX_NAME_LEN)?,
            department_id: id_field("department_id", &input.department_id)?,
            job_role_id: id_field("role_id", &input.role_id)?,
            basic_salary: salary_field(&input.basic_salary)?,
            contact: text_field("contact", &input.contact, MAX_NAME_LEN)?,
            email: text_field("email", &input.email, MAX_NAME_LEN)?,
            address: text_field("address", &input.address, MAX_ADDRESS_LEN)?,
        })
    }

    async fn check_lookups<C: ConnectionTrait>(&self, conn: &C) -> HrResult<()> {
        if let Some(id) = self.department_id {
            if department::Entity::find_by_id(id).one(conn).await?.is_none() {
                return Err(HrError::validation("unknown department_id"));
            }
        }
        if let Some(id) = self.job_role_id {
            if job_role::Entity::find_by_id(id).one(conn).await?.is_none() {
                return Err(HrError::validation("unknown role_id"));
            }
        }
        Ok(())
    }

    fn apply(self, active: &mut employee::ActiveModel) {
        if let Some(value) = self.first_name {
            active.first_name = Set(Some(value));
        }
        if let Some(value) = self.last_name {
            active.last_name = Set(Some(value));
        }
        if let Some(value) = self.department_id {
            active.department_id = Set(Some(value));
        }
        if let Some(value) = self.job_role_id {
            active.job_role_id = Set(Some(value));
        }
        if let Some(value) = self.basic_salary {
            active.basic_salary = Set(value);
        }
        if let Some(value) = self.contact {
            active.contact = Set(Some(value));
        }
        if let Some(value) = self.email {
            active.email = Set(Some(value));
        }
        if let Some(value) = self.address {
            active.address = Set(Some(value));
        }
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn text_field(name: &str, value: &Option<String>, max: usize) -> HrResult<Option<String>> {
    match provided(value) {
        Some(v) if v.chars().count() > max => Err(HrError::validation(format!(
            "{name} must be <= {max} characters"
        ))),
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

fn id_field(name: &str, value: &Option<String>) -> HrResult<Option<i32>> {
    provided(value)
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| HrError::validation(format!("invalid {name}")))
        })
        .transpose()
}

fn salary_field(value: &Option<String>) -> HrResult<Option<f64>> {
    provided(value)
        .map(|v| match v.parse::<f64>() {
            Ok(salary) if salary.is_finite() && salary >= 0.0 => Ok(salary),
            _ => Err(HrError::validation("invalid basic_salary")),
        })
        .transpose()
}

pub(crate) async fn employee_by_code<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> HrResult<employee::Model> {
    employee::Entity::find()
        .filter(employee::Column::EmpCode.eq(code.trim()))
        .one(conn)
        .await?
        .ok_or_else(|| HrError::not_found("employee not found"))
}

impl HrModule {
    /// Creates the employee when the code is new, otherwise overwrites only
    /// the provided fields. A replaced photo file is removed after commit; a
    /// photo written for a failed write is removed again.
    #[instrument(skip_all, fields(actor = %actor.username, emp_code = %input.emp_code))]
    pub async fn upsert_employee(
        &self,
        actor: &Actor,
        input: EmployeeInput,
        photo: Option<PhotoUpload>,
    ) -> HrResult<UpsertOutcome> {
        self.authorize(actor, Action::UpsertEmployee, None)?;
        let code = input.emp_code.trim().to_string();
        if code.is_empty() {
            return Err(HrError::validation("emp_code required"));
        }
        if code.chars().count() > MAX_CODE_LEN {
            return Err(HrError::validation(format!(
                "emp_code must be <= {MAX_CODE_LEN} characters"
            )));
        }
        let fields = EmployeeFields::parse(&input)?;

        let stored_photo = match photo.filter(|p| !p.file_name.trim().is_empty()) {
            Some(upload) => Some(self.photos.save(&code, &upload).await?),
            None => None,
        };

        match self
            .write_employee(actor, &code, fields, stored_photo.clone())
            .await
        {
            Ok((outcome, replaced)) => {
                if let Some(old) = replaced {
                    self.photos.remove(&old).await;
                }
                Ok(outcome)
            }
            Err(err) => {
                if let Some(new) = stored_photo {
                    self.photos.remove(&new).await;
                }
                Err(err)
            }
        }
    }

    async fn write_employee(
        &self,
        actor: &Actor,
        code: &str,
        fields: EmployeeFields,
        photo: Option<String>,
    ) -> HrResult<(UpsertOutcome, Option<String>)> {
        let txn = self.db.begin().await?;
        fields.check_lookups(&txn).await?;
        let existing = employee::Entity::find()
            .filter(employee::Column::EmpCode.eq(code))
            .one(&txn)
            .await?;
        let result = match existing {
            Some(model) => {
                let previous_photo = model.photo.clone();
                let mut active: employee::ActiveModel = model.clone().into();
                fields.apply(&mut active);
                let replaced = match &photo {
                    Some(name) => {
                        active.photo = Set(Some(name.clone()));
                        previous_photo.filter(|old| old != name)
                    }
                    None => None,
                };
                let updated = if active.is_changed() {
                    active.update(&txn).await?
                } else {
                    model
                };
                audit::record(&txn, &actor.username, format!("update employee {code}")).await?;
                (UpsertOutcome::Updated(updated), replaced)
            }
            None => {
                let mut active = employee::ActiveModel {
                    emp_code: Set(code.to_string()),
                    first_name: Set(None),
                    last_name: Set(None),
                    department_id: Set(None),
                    job_role_id: Set(None),
                    basic_salary: Set(0.0),
                    contact: Set(None),
                    email: Set(None),
                    address: Set(None),
                    photo: Set(photo),
                    ..Default::default()
                };
                fields.apply(&mut active);
                let created = active.insert(&txn).await?;
                audit::record(&txn, &actor.username, format!("create employee {code}")).await?;
                (UpsertOutcome::Created(created), None)
            }
        };
        txn.commit().await?;
        Ok(result)
    }

    /// Looks up by employee code first, then by numeric id.
    #[instrument(skip_all, fields(actor = %actor.username, identifier = %identifier))]
    pub async fn find_employee(
        &self,
        actor: &Actor,
        identifier: &str,
    ) -> HrResult<Option<employee::Model>> {
        self.authorize(actor, Action::SearchEmployees, None)?;
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        let by_code = employee::Entity::find()
            .filter(employee::Column::EmpCode.eq(identifier))
            .one(&self.db)
            .await?;
        if by_code.is_some() {
            return Ok(by_code);
        }
        match identifier.parse::<i32>() {
            Ok(id) => Ok(employee::Entity::find_by_id(id).one(&self.db).await?),
            Err(_) => Ok(None),
        }
    }

    /// Removes the employee together with attendance, leave requests,
    /// payrolls and linked employee logins in one transaction. The photo
    /// file goes after commit and its removal never fails the call.
    #[instrument(skip_all, fields(actor = %actor.username, employee_id = id))]
    pub async fn delete_employee(&self, actor: &Actor, id: i32) -> HrResult<employee::Model> {
        self.authorize(actor, Action::DeleteEmployee, Some(id))?;
        let txn = self.db.begin().await?;
        let target = employee::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| HrError::not_found("employee not found"))?;

        attendance::Entity::delete_many()
            .filter(attendance::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await?;
        leave_request::Entity::delete_many()
            .filter(leave_request::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await?;
        payroll::Entity::delete_many()
            .filter(payroll::Column::EmployeeId.eq(id))
            .exec(&txn)
            .await?;
        let logins: Vec<i32> = account::Entity::find()
            .filter(account::Column::EmployeeId.eq(id))
            .filter(account::Column::Role.eq(AccountRole::Employee))
            .all(&txn)
            .await?
            .into_iter()
            .map(|login| login.id)
            .collect();
        if !logins.is_empty() {
            session::Entity::delete_many()
                .filter(session::Column::AccountId.is_in(logins.clone()))
                .exec(&txn)
                .await?;
            account::Entity::delete_many()
                .filter(account::Column::Id.is_in(logins))
                .exec(&txn)
                .await?;
        }
        employee::Entity::delete_by_id(id).exec(&txn).await?;
        audit::record(
            &txn,
            &actor.username,
            format!("delete employee {}", target.emp_code),
        )
        .await?;
        txn.commit().await?;

        if let Some(photo) = &target.photo {
            self.photos.remove(photo).await;
        }
        Ok(target)
    }

    /// Employees newest first, the latest payrolls and both lookup tables.
    /// Employee logins only see their own record.
    #[instrument(skip_all, fields(actor = %actor.username))]
    pub async fn dashboard(&self, actor: &Actor) -> HrResult<Dashboard> {
        self.authorize(actor, Action::ViewDashboard, None)?;
        let own = actor.subject.own_employee_id();

        let mut employees = employee::Entity::find().order_by_desc(employee::Column::Id);
        let mut payrolls = payroll::Entity::find()
            .order_by_desc(payroll::Column::Id)
            .limit(DASHBOARD_PAYROLLS);
        if let Some(id) = own {
            employees = employees.filter(employee::Column::Id.eq(id));
            payrolls = payrolls.filter(payroll::Column::EmployeeId.eq(id));
        }

        Ok(Dashboard {
            employees: employees.all(&self.db).await?,
            payrolls: payrolls.all(&self.db).await?,
            departments: department::Entity::find()
                .order_by_asc(department::Column::Id)
                .all(&self.db)
                .await?,
            roles: job_role::Entity::find()
                .order_by_asc(job_role::Column::Id)
                .all(&self.db)
                .await?,
        })
    }
}
