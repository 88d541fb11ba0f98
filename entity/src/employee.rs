use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "employee")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub emp_code: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[sea_orm(indexed)]
    pub department_id: Option<i32>,
    #[sea_orm(indexed)]
    #[serde(rename = "role_id")]
    pub job_role_id: Option<i32>,
    pub basic_salary: f64,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
}

impl Model {
    /// Code followed by whatever name parts are present.
    pub fn display_name(&self) -> String {
        [
            Some(self.emp_code.as_str()),
            self.first_name.as_deref(),
            self.last_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "SetNull"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::job_role::Entity",
        from = "Column::JobRoleId",
        to = "super::job_role::Column::Id",
        on_delete = "SetNull"
    )]
    JobRole,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
    #[sea_orm(has_many = "super::leave_request::Entity")]
    LeaveRequest,
    #[sea_orm(has_many = "super::payroll::Entity")]
    Payroll,
    #[sea_orm(has_many = "super::account::Entity")]
    Account,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::job_role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobRole.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl Related<super::leave_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeaveRequest.def()
    }
}

impl Related<super::payroll::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payroll.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
