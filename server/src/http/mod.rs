mod admin;
mod employees;
mod extract;
mod records;
mod reports;
mod session;
#[cfg(test)]
mod tests;

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use products_hr::HrModule;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub hr: Arc<HrModule>,
    pub config: Arc<AppConfig>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(hr: Arc<HrModule>, config: Arc<AppConfig>) -> Self {
        let cookie_key = config.cookie_key.clone();
        Self {
            hr,
            config,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    let uploads = ServeDir::new(&state.config.upload_dir);
    Router::new()
        .route("/login", get(session::login_form).post(session::login))
        .route("/logout", get(session::logout))
        .route("/", get(employees::dashboard))
        .route("/employee/add", post(employees::upsert))
        .route("/employee/search", get(employees::search))
        .route("/employee/{id}/delete", post(employees::delete))
        .route("/attendance/checkin", post(records::check_in))
        .route("/attendance/checkout", post(records::check_out))
        .route("/leave/request", post(records::request_leave))
        .route("/leave/{id}/decide", post(records::decide_leave))
        .route("/payroll/create", post(records::create_payroll))
        .route("/payroll/{id}/pdf", get(reports::payslip))
        .route("/export/employees", get(reports::employees_csv))
        .route("/export/payrolls", get(reports::payrolls_csv))
        .route("/admin/create", post(admin::create_account))
        .route("/status", get(admin::status))
        .route("/init-db", get(admin::init_db))
        .nest_service("/uploads", uploads)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.max_content_length)),
        )
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
