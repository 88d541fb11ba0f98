use chrono::{Duration, Utc};
use entity::{
    account::{self, AccountRole},
    session,
};
use platform_authn::{hash_password, validate_password, verify_password};
use platform_authz::Action;
use sea_orm::prelude::Uuid;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use tracing::instrument;

use crate::directory::employee_by_code;
use crate::{Actor, HrError, HrModule, HrResult, audit};

/// Form body for creating a staff or employee login.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewAccount {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub emp_code: Option<String>,
}

impl HrModule {
    /// Unknown user, wrong password and an unreadable stored hash all look
    /// the same to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> HrResult<Actor> {
        let found = account::Entity::find()
            .filter(account::Column::Username.eq(username.trim()))
            .one(&self.db)
            .await?;
        let Some(account) = found else {
            return Err(HrError::InvalidCredentials);
        };
        match verify_password(password, &account.password_hash) {
            Ok(true) => Actor::from_account(&account),
            Ok(false) => Err(HrError::InvalidCredentials),
            Err(err) => {
                tracing::warn!(username, error = %err, "stored password hash rejected");
                Err(HrError::InvalidCredentials)
            }
        }
    }

    /// Authenticates and opens a session that expires after `ttl`.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ttl: Duration,
    ) -> HrResult<(Actor, Uuid)> {
        let actor = self.authenticate(username, password).await?;
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        let txn = self.db.begin().await?;
        session::Entity::insert(session::ActiveModel {
            id: Set(session_id),
            account_id: Set(actor.account_id),
            created_at: Set(now.into()),
            expires_at: Set((now + ttl).into()),
        })
        .exec_without_returning(&txn)
        .await?;
        audit::record(&txn, &actor.username, "login").await?;
        txn.commit().await?;
        Ok((actor, session_id))
    }

    /// Resolves a session id to its actor. Expired sessions are deleted on
    /// first use.
    pub async fn resume_session(&self, session_id: Uuid) -> HrResult<Actor> {
        let Some(found) = session::Entity::find_by_id(session_id)
            .one(&self.db)
            .await?
        else {
            return Err(HrError::Unauthenticated);
        };
        if found.expires_at <= Utc::now() {
            session::Entity::delete_by_id(session_id)
                .exec(&self.db)
                .await?;
            tracing::debug!(%session_id, "expired session removed");
            return Err(HrError::Unauthenticated);
        }
        self.load_actor(found.account_id).await
    }

    pub async fn load_actor(&self, account_id: i32) -> HrResult<Actor> {
        let account = account::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(HrError::Unauthenticated)?;
        Actor::from_account(&account)
    }

    #[instrument(skip_all, fields(actor = %actor.username))]
    pub async fn logout(&self, actor: &Actor, session_id: Uuid) -> HrResult<()> {
        let txn = self.db.begin().await?;
        session::Entity::delete_by_id(session_id).exec(&txn).await?;
        audit::record(&txn, &actor.username, "logout").await?;
        txn.commit().await?;
        Ok(())
    }

    /// Superadmin only. Role defaults to `hr`; an `employee` login must name
    /// an existing employee code.
    #[instrument(skip_all, fields(actor = %actor.username, username = %input.username))]
    pub async fn create_account(&self, actor: &Actor, input: NewAccount) -> HrResult<account::Model> {
        self.authorize(actor, Action::CreateAccount, None)?;
        let username = input.username.trim().to_string();
        if username.is_empty() || input.password.is_empty() {
            return Err(HrError::validation("username and password required"));
        }
        if username.chars().count() > 80 {
            return Err(HrError::validation("username must be <= 80 characters"));
        }
        validate_password(&input.password)?;
        let role = match input.role.as_deref().map(str::trim) {
            None | Some("") => AccountRole::Hr,
            Some(raw) => AccountRole::parse(raw)
                .ok_or_else(|| HrError::validation(format!("unknown role {raw}")))?,
        };

        let txn = self.db.begin().await?;
        let taken = account::Entity::find()
            .filter(account::Column::Username.eq(username.as_str()))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(HrError::validation("exists"));
        }
        let employee_id = match role {
            AccountRole::Employee => {
                let code = input.emp_code.as_deref().map(str::trim).unwrap_or_default();
                if code.is_empty() {
                    return Err(HrError::validation("emp_code required for employee accounts"));
                }
                Some(employee_by_code(&txn, code).await?.id)
            }
            _ => None,
        };
        let created = account::ActiveModel {
            username: Set(username.clone()),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(role),
            employee_id: Set(employee_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        audit::record(&txn, &actor.username, format!("create admin {username}")).await?;
        txn.commit().await?;
        Ok(created)
    }
}
