use platform_api::ApiError;
use platform_authn::AuthnError;
use platform_authz::AuthzError;
use sea_orm::DbErr;
use thiserror::Error;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("login required")]
    Unauthenticated,
    #[error(transparent)]
    Forbidden(#[from] AuthzError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
    #[error("report: {0}")]
    Report(String),
    #[error("password: {0}")]
    Password(String),
}

impl HrError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<AuthnError> for HrError {
    fn from(err: AuthnError) -> Self {
        match err {
            AuthnError::EmptyPassword | AuthnError::PasswordTooShort => {
                HrError::Validation(err.to_string())
            }
            AuthnError::MalformedHash | AuthnError::Hash(_) => HrError::Password(err.to_string()),
        }
    }
}

impl From<HrError> for ApiError {
    fn from(err: HrError) -> Self {
        match err {
            HrError::Validation(msg) => ApiError::BadRequest(msg),
            HrError::NotFound(msg) => ApiError::NotFound(msg),
            HrError::InvalidCredentials | HrError::Unauthenticated => {
                ApiError::Unauthorized(err.to_string())
            }
            HrError::Forbidden(_) => ApiError::forbidden(),
            HrError::Database(_)
            | HrError::Storage(_)
            | HrError::Report(_)
            | HrError::Password(_) => ApiError::internal(err),
        }
    }
}
