use axum::{
    Json,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Shared handler result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure leaves the service as `{"ok": false, "error": "..."}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub ok: bool,
    pub error: &'a str,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("not permitted".into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            ok: false,
            error: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

// Malformed requests leave as 400 envelopes instead of axum's plain-text
// rejections.
macro_rules! bad_request_from {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for ApiError {
                fn from(rejection: $rejection) -> Self {
                    Self::BadRequest(rejection.body_text())
                }
            }
        )+
    };
}

bad_request_from!(
    PathRejection,
    FormRejection,
    QueryRejection,
    MultipartRejection,
    MultipartError,
);

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_are_400_envelopes() {
        let response = ApiError::bad_request("emp_code required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "error": "emp_code required"})
        );
    }

    #[tokio::test]
    async fn internal_errors_keep_the_underlying_message() {
        let response = ApiError::internal("FOREIGN KEY constraint failed").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "FOREIGN KEY constraint failed"
        );
    }

    #[tokio::test]
    async fn path_rejections_become_400_envelopes() {
        use axum::{Router, body::Body, extract::Path, http::Request, routing::get};
        use tower::ServiceExt;

        async fn by_id(path: Result<Path<i32>, PathRejection>) -> ApiResult<String> {
            let Path(id) = path?;
            Ok(id.to_string())
        }

        let app = Router::new().route("/item/{id}", get(by_id));
        let response = app
            .oneshot(Request::builder().uri("/item/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("abc"));
    }

    #[test]
    fn forbidden_uses_fixed_message() {
        let err = ApiError::forbidden();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "not permitted");
    }
}
