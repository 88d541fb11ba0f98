use axum::{
    Form, Json,
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
};
use platform_api::{ApiError, ApiResult};
use products_hr::{Dashboard, EmployeeInput, PhotoUpload};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{
    AppState,
    extract::{ApiPath, ApiQuery},
    session::CurrentActor,
};

pub async fn dashboard(
    State(state): State<AppState>,
    current: CurrentActor,
) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.hr.dashboard(&current.actor).await?))
}

/// Employee form sent either urlencoded or as multipart with a `photo` file.
pub struct EmployeeSubmission {
    input: EmployeeInput,
    photo: Option<PhotoUpload>,
}

impl<S> FromRequest<S> for EmployeeSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));
        if !is_multipart {
            let Form(input) = Form::<EmployeeInput>::from_request(req, state)
                .await
                .map_err(ApiError::from)?;
            return Ok(Self { input, photo: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(ApiError::from)?;
        let mut fields = Map::new();
        let mut photo = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(ApiError::from)?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photo" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(ApiError::from)?;
                if !file_name.is_empty() {
                    photo = Some(PhotoUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }
            let text = field
                .text()
                .await
                .map_err(ApiError::from)?;
            fields.insert(name, Value::String(text));
        }
        let input = serde_json::from_value(Value::Object(fields))
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        Ok(Self { input, photo })
    }
}

pub async fn upsert(
    State(state): State<AppState>,
    current: CurrentActor,
    submission: EmployeeSubmission,
) -> ApiResult<Json<Value>> {
    let outcome = state
        .hr
        .upsert_employee(&current.actor, submission.input, submission.photo)
        .await?;
    let key = if outcome.is_created() {
        "created"
    } else {
        "updated"
    };
    let mut body = json!({ "ok": true, "emp_code": outcome.employee().emp_code });
    body[key] = Value::Bool(true);
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    code: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let identifier = query.code.unwrap_or_default();
    let body = match state.hr.find_employee(&current.actor, &identifier).await? {
        Some(emp) => json!({ "found": true, "emp": emp }),
        None => json!({ "found": false }),
    };
    Ok(Json(body))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentActor,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Value>> {
    state.hr.delete_employee(&current.actor, id).await?;
    Ok(Json(json!({ "ok": true })))
}
