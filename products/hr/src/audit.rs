use chrono::Utc;
use entity::audit_log;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};

/// Appends one audit entry. Callers pass their open transaction so the entry
/// commits or rolls back with the change it describes.
pub(crate) async fn record<C>(conn: &C, actor: &str, action: impl Into<String>) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let action = action.into();
    tracing::info!(actor, action = %action, "audit");
    audit_log::Entity::insert(audit_log::ActiveModel {
        actor: Set(actor.to_string()),
        action: Set(action),
        ts: Set(Utc::now().into()),
        ..Default::default()
    })
    .exec_without_returning(conn)
    .await?;
    Ok(())
}
