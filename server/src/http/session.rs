use axum::{
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use platform_api::{ApiError, ApiResult};
use products_hr::{Actor, HrError};
use serde::Deserialize;
use time::Duration as TimeDuration;
use uuid::Uuid;

use super::{AppState, extract::ApiForm};

pub const SESSION_COOKIE: &str = "hr_session";

/// The logged-in actor for this request. Requests without a live session
/// are sent to the login page.
pub struct CurrentActor {
    pub actor: Actor,
}

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let Some(session_id) = session_id(&jar) else {
            return Err(Redirect::to("/login").into_response());
        };
        match state.hr.resume_session(session_id).await {
            Ok(actor) => Ok(Self { actor }),
            Err(HrError::Unauthenticated) => Err(Redirect::to("/login").into_response()),
            Err(err) => Err(ApiError::from(err).into_response()),
        }
    }
}

fn session_id(jar: &PrivateCookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn login_form() -> Html<String> {
    Html(login_page(None))
}

pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    ApiForm(form): ApiForm<LoginForm>,
) -> ApiResult<Response> {
    let ttl = state.config.session_ttl;
    match state.hr.login(&form.username, &form.password, ttl).await {
        Ok((_, session_id)) => {
            let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
                .path("/")
                .http_only(true)
                .secure(state.config.cookie_secure)
                .same_site(SameSite::Lax)
                .max_age(TimeDuration::seconds(ttl.num_seconds()))
                .build();
            Ok((jar.add(cookie), Redirect::to("/")).into_response())
        }
        Err(HrError::InvalidCredentials | HrError::Unauthenticated) => Ok((
            StatusCode::UNAUTHORIZED,
            Html(login_page(Some("Invalid credentials"))),
        )
            .into_response()),
        Err(err) => Err(err.into()),
    }
}

/// Ends the session when there is one; always lands on the login page.
pub async fn logout(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> ApiResult<(PrivateCookieJar, Redirect)> {
    if let Some(session_id) = session_id(&jar) {
        match state.hr.resume_session(session_id).await {
            Ok(actor) => state.hr.logout(&actor, session_id).await?,
            Err(HrError::Unauthenticated) => {}
            Err(err) => return Err(err.into()),
        }
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((jar, Redirect::to("/login")))
}

fn login_page(flash: Option<&str>) -> String {
    let flash = flash
        .map(|msg| format!("<p class=\"flash danger\">{msg}</p>"))
        .unwrap_or_default();
    format!(
        "<!doctype html>\n<html><head><title>HR Login</title></head><body>\n\
         <h1>HR Payroll</h1>\n{flash}\n\
         <form method=\"post\" action=\"/login\">\n\
         <input name=\"username\" placeholder=\"username\">\n\
         <input name=\"password\" type=\"password\" placeholder=\"password\">\n\
         <button type=\"submit\">Login</button>\n\
         </form>\n</body></html>\n"
    )
}
