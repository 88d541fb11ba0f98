use axum::{Json, extract::State};
use migration::{Migrator, MigratorTrait};
use platform_api::{ApiError, ApiResult};
use products_hr::NewAccount;
use serde_json::{Value, json};

use super::{AppState, extract::ApiForm, session::CurrentActor};

const VERSION: &str = "hr-1.0";

pub async fn create_account(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiForm(form): ApiForm<NewAccount>,
) -> ApiResult<Json<Value>> {
    state.hr.create_account(&current.actor, form).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn status() -> Json<Value> {
    Json(json!({ "ok": true, "version": VERSION }))
}

/// Same as the `init-db` command: migrate, then seed defaults.
pub async fn init_db(State(state): State<AppState>) -> ApiResult<&'static str> {
    Migrator::up(state.hr.db(), None)
        .await
        .map_err(ApiError::internal)?;
    state
        .hr
        .seed_defaults(
            &state.config.default_admin_username,
            &state.config.default_admin_password,
        )
        .await?;
    Ok("initialized")
}
