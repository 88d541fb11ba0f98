use axum::{Json, extract::State};
use chrono::Local;
use platform_api::ApiResult;
use products_hr::PayrollInput;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    AppState,
    extract::{ApiForm, ApiPath},
    session::CurrentActor,
};

#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    #[serde(default)]
    emp_code: String,
    date: Option<String>,
}

pub async fn check_in(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiForm(form): ApiForm<AttendanceForm>,
) -> ApiResult<Json<Value>> {
    let now = Local::now().naive_local();
    let date = state
        .hr
        .check_in(&current.actor, &form.emp_code, form.date.as_deref(), now)
        .await?;
    Ok(Json(json!({ "ok": true, "msg": "checked in", "date": date.to_string() })))
}

pub async fn check_out(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiForm(form): ApiForm<AttendanceForm>,
) -> ApiResult<Json<Value>> {
    let now = Local::now().naive_local();
    let date = state
        .hr
        .check_out(&current.actor, &form.emp_code, form.date.as_deref(), now)
        .await?;
    Ok(Json(json!({ "ok": true, "msg": "checked out", "date": date.to_string() })))
}

#[derive(Debug, Deserialize)]
pub struct LeaveForm {
    #[serde(default)]
    emp_code: String,
    start_date: Option<String>,
    end_date: Option<String>,
    reason: Option<String>,
}

pub async fn request_leave(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiForm(form): ApiForm<LeaveForm>,
) -> ApiResult<Json<Value>> {
    let created = state
        .hr
        .request_leave(
            &current.actor,
            &form.emp_code,
            form.start_date.as_deref(),
            form.end_date.as_deref(),
            form.reason.as_deref(),
        )
        .await?;
    Ok(Json(json!({ "ok": true, "id": created.id })))
}

#[derive(Debug, Deserialize)]
pub struct DecisionForm {
    #[serde(default)]
    action: String,
}

pub async fn decide_leave(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiPath(id): ApiPath<i32>,
    ApiForm(form): ApiForm<DecisionForm>,
) -> ApiResult<Json<Value>> {
    state
        .hr
        .decide_leave(&current.actor, id, &form.action)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn create_payroll(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiForm(form): ApiForm<PayrollInput>,
) -> ApiResult<Json<Value>> {
    let created = state.hr.create_payroll(&current.actor, form).await?;
    Ok(Json(json!({ "ok": true, "id": created.id })))
}
