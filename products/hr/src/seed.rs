use chrono::Utc;
use entity::{
    account::{self, AccountRole},
    department, job_role,
};
use platform_authn::hash_password;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::instrument;

use crate::{HrModule, HrResult};

const DEFAULT_DEPARTMENTS: [&str; 3] = ["HR", "IT", "Finance"];
const DEFAULT_ROLES: [&str; 3] = ["Developer", "Manager", "Accountant"];

/// What a seeding pass actually inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub admin_created: bool,
    pub departments_created: usize,
    pub roles_created: usize,
}

impl HrModule {
    /// Creates the superadmin when the username is free and fills the lookup
    /// tables when they are empty. Safe to run repeatedly.
    #[instrument(skip(self, admin_password))]
    pub async fn seed_defaults(
        &self,
        admin_username: &str,
        admin_password: &str,
    ) -> HrResult<SeedReport> {
        let mut report = SeedReport::default();
        let txn = self.db.begin().await?;

        let admin_exists = account::Entity::find()
            .filter(account::Column::Username.eq(admin_username))
            .one(&txn)
            .await?
            .is_some();
        if !admin_exists {
            account::Entity::insert(account::ActiveModel {
                username: Set(admin_username.to_string()),
                password_hash: Set(hash_password(admin_password)?),
                role: Set(AccountRole::Superadmin),
                employee_id: Set(None),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .exec_without_returning(&txn)
            .await?;
            report.admin_created = true;
        }

        if department::Entity::find().count(&txn).await? == 0 {
            department::Entity::insert_many(DEFAULT_DEPARTMENTS.map(|name| department::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            }))
            .exec_without_returning(&txn)
            .await?;
            report.departments_created = DEFAULT_DEPARTMENTS.len();
        }
        if job_role::Entity::find().count(&txn).await? == 0 {
            job_role::Entity::insert_many(DEFAULT_ROLES.map(|name| job_role::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            }))
            .exec_without_returning(&txn)
            .await?;
            report.roles_created = DEFAULT_ROLES.len();
        }

        txn.commit().await?;
        tracing::info!(?report, "defaults seeded");
        Ok(report)
    }
}
