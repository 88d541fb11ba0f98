use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use platform_api::ApiResult;
use products_hr::sanitize_file_name;

use super::{AppState, extract::ApiPath, session::CurrentActor};

/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded in `filename*`.
fn content_disposition(filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitize_file_name(filename),
        urlencoding::encode(filename)
    )
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        body,
    )
        .into_response()
}

pub async fn employees_csv(
    State(state): State<AppState>,
    current: CurrentActor,
) -> ApiResult<impl IntoResponse> {
    let body = state.hr.export_employees_csv(&current.actor).await?;
    Ok(attachment("text/csv; charset=utf-8", "employees.csv", body))
}

pub async fn payrolls_csv(
    State(state): State<AppState>,
    current: CurrentActor,
) -> ApiResult<impl IntoResponse> {
    let body = state.hr.export_payrolls_csv(&current.actor).await?;
    Ok(attachment("text/csv; charset=utf-8", "payrolls.csv", body))
}

pub async fn payslip(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let slip = state.hr.render_payslip(&current.actor, id).await?;
    Ok(attachment("application/pdf", &slip.filename, slip.bytes))
}
