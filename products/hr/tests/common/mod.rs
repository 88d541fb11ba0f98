#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use migration::{Migrator, MigratorTrait};
use platform_authz::{StaffRole, Subject};
use products_hr::{Actor, EmployeeInput, HrModule, LeavePolicy, PhotoStore};
use sea_orm::{ConnectOptions, Database};
use tempfile::TempDir;

pub struct TestHr {
    pub hr: HrModule,
    pub uploads: TempDir,
}

impl TestHr {
    pub async fn new() -> Self {
        Self::with_policy(LeavePolicy::default()).await
    }

    pub async fn with_policy(policy: LeavePolicy) -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let hr = HrModule::new(db, PhotoStore::new(uploads.path())).with_leave_policy(policy);
        hr.seed_defaults("admin", "admin").await.unwrap();
        Self { hr, uploads }
    }

    pub async fn add_employee(&self, code: &str, salary: &str) -> i32 {
        let outcome = self
            .hr
            .upsert_employee(&admin(), employee_form(code, salary), None)
            .await
            .unwrap();
        outcome.employee().id
    }
}

pub fn admin() -> Actor {
    Actor::new(1, "admin", Subject::staff(StaffRole::Superadmin))
}

pub fn hr_staff() -> Actor {
    Actor::new(2, "hr1", Subject::staff(StaffRole::Hr))
}

pub fn employee_login(employee_id: i32) -> Actor {
    Actor::new(3, "worker", Subject::employee(employee_id))
}

pub fn employee_form(code: &str, salary: &str) -> EmployeeInput {
    EmployeeInput {
        emp_code: code.to_string(),
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        basic_salary: Some(salary.to_string()),
        email: Some(format!("{}@example.com", code.to_lowercase())),
        ..Default::default()
    }
}

pub fn at(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn day(date: &str) -> NaiveDate {
    date.parse().unwrap()
}
