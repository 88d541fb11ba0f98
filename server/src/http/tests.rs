use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, connect};
use products_hr::{HrModule, PhotoStore};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use super::{AppState, build_router};
use crate::config::AppConfig;

struct TestApp {
    router: Router,
    _uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "sqlite::memory:".to_string()),
            ("SECRET_KEY", "test-secret".to_string()),
            ("UPLOAD_DIR", uploads.path().display().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let config = AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let pool = connect(&DatabaseSettings::new("sqlite::memory:"))
            .await
            .unwrap();
        Migrator::up(&pool, None).await.unwrap();
        let hr = HrModule::new(pool, PhotoStore::new(&config.upload_dir));
        hr.seed_defaults("admin", "admin").await.unwrap();
        let state = AppState::new(Arc::new(hr), Arc::new(config));
        Self {
            router: build_router(state),
            _uploads: uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    /// Logs in and returns the `Cookie` header value to send back.
    async fn login(&self, username: &str, password: &str) -> String {
        let (status, headers, _) = self
            .send(form_request(
                "/login",
                None,
                &format!("username={username}&password={password}"),
            ))
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(headers[header::LOCATION], "/");
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn post_json(&self, uri: &str, cookie: &str, body: &str) -> (StatusCode, Value) {
        let (status, _, bytes) = self.send(form_request(uri, Some(cookie), body)).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn status_is_public() {
    let app = TestApp::new().await;
    let (status, _, body) = app.get("/status", None).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "ok": true, "version": "hr-1.0" }));
}

#[tokio::test]
async fn protected_routes_redirect_to_login() {
    let app = TestApp::new().await;
    for uri in ["/", "/export/employees", "/employee/search?code=E1"] {
        let (status, headers, _) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(headers[header::LOCATION], "/login");
    }
    let (status, headers, _) = app.get("/", Some("hr_session=forged")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");
}

#[tokio::test]
async fn bad_credentials_rerender_the_form() {
    let app = TestApp::new().await;
    let (status, _, body) = app
        .send(form_request("/login", None, "username=admin&password=nope"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(String::from_utf8(body).unwrap().contains("Invalid credentials"));
}

#[tokio::test]
async fn employee_month_flow_over_http() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;

    let (status, body) = app
        .post_json(
            "/employee/add",
            &cookie,
            "emp_code=E100&first_name=Jo&last_name=Doe&basic_salary=50000",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({ "ok": true, "created": true, "emp_code": "E100" })
    );

    let (_, body) = app
        .post_json("/employee/add", &cookie, "emp_code=E100&contact=555")
        .await;
    assert_eq!(body["updated"], true);

    let (_, _, bytes) = app.get("/employee/search?code=E100", Some(&cookie)).await;
    let found: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(found["found"], true);
    assert_eq!(found["emp"]["contact"], "555");
    assert_eq!(found["emp"]["basic_salary"], 50000.0);
    assert!(found["emp"].get("role_id").is_some());

    let (_, body) = app
        .post_json("/attendance/checkin", &cookie, "emp_code=E100&date=2024-01-10")
        .await;
    assert_eq!(
        body,
        serde_json::json!({ "ok": true, "msg": "checked in", "date": "2024-01-10" })
    );
    let (_, body) = app
        .post_json("/attendance/checkout", &cookie, "emp_code=E100&date=2024-01-10")
        .await;
    assert_eq!(body["msg"], "checked out");

    let (status, body) = app
        .post_json(
            "/payroll/create",
            &cookie,
            "emp_code=E100&month=January&year=2024&net_salary=45000",
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let payroll_id = body["id"].as_i64().unwrap();

    let (status, headers, csv) = app.get("/export/payrolls", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("payrolls.csv")
    );
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.contains(",E100,January,2024,45000.0"));

    let (status, headers, pdf) = app
        .get(&format!("/payroll/{payroll_id}/pdf"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("pay_E100_January_2024.pdf")
    );
    assert!(pdf.starts_with(b"%PDF"));

    let (status, _, dashboard) = app.get("/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard: Value = serde_json::from_slice(&dashboard).unwrap();
    assert_eq!(dashboard["employees"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["payrolls"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn domain_errors_use_the_json_envelope() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;

    let (status, body) = app.post_json("/employee/add", &cookie, "emp_code=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        serde_json::json!({ "ok": false, "error": "emp_code required" })
    );

    app.post_json("/employee/add", &cookie, "emp_code=E1").await;
    let (status, body) = app
        .post_json("/attendance/checkout", &cookie, "emp_code=E1&date=2024-01-10")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no checkin record");

    let (status, body) = app
        .post_json("/leave/request", &cookie, "emp_code=E1&start_date=soon")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid dates");

    let (_, body) = app
        .post_json(
            "/leave/request",
            &cookie,
            "emp_code=E1&start_date=2024-02-01&end_date=2024-02-02&reason=trip",
        )
        .await;
    let leave_id = body["id"].as_i64().unwrap();
    let (status, body) = app
        .post_json(&format!("/leave/{leave_id}/decide"), &cookie, "action=maybe")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid action");
    let (status, body) = app
        .post_json(&format!("/leave/{leave_id}/decide"), &cookie, "action=approved")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn only_superadmin_creates_accounts() {
    let app = TestApp::new().await;
    let admin = app.login("admin", "admin").await;
    let (status, body) = app
        .post_json("/admin/create", &admin, "username=bob&password=hunter2")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let bob = app.login("bob", "hunter2").await;
    let (status, body) = app
        .post_json("/admin/create", &bob, "username=eve&password=hunter2")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "not permitted");

    let (status, body) = app
        .post_json("/admin/create", &admin, "username=bob&password=other")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "exists");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;
    let (status, headers, _) = app.get("/logout", Some(&cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");

    let (status, headers, _) = app.get("/", Some(&cookie)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");
}

#[tokio::test]
async fn multipart_upload_stores_and_serves_the_photo() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"emp_code\"\r\n\r\nE5\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"first_name\"\r\n\r\nPat\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"me.png\"\r\n\
         Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/employee/add")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::COOKIE, &cookie)
        .body(Body::from(body))
        .unwrap();
    let (status, _, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let created: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(created["created"], true);

    let (_, _, bytes) = app.get("/employee/search?code=E5", Some(&cookie)).await;
    let found: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(found["emp"]["first_name"], "Pat");
    let photo = found["emp"]["photo"].as_str().unwrap().to_string();
    assert!(photo.starts_with("E5_") && photo.ends_with("_me.png"));

    let (status, _, served) = app.get(&format!("/uploads/{photo}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, b"PNGDATA");

    let id = found["emp"]["id"].as_i64().unwrap();
    let (status, body) = app
        .post_json(&format!("/employee/{id}/delete"), &cookie, "")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let (status, _, _) = app.get(&format!("/uploads/{photo}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_get_the_json_envelope() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;

    let (status, headers, bytes) = app
        .send(form_request("/employee/abc/delete", Some(&cookie), ""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("abc"));

    let (status, _, bytes) = app.get("/payroll/xyz/pdf", Some(&cookie)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], false);

    let request = Request::builder()
        .method("POST")
        .uri("/attendance/checkin")
        .header(header::COOKIE, &cookie)
        .body(Body::from("emp_code=E1"))
        .unwrap();
    let (status, _, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn payslip_names_with_quotes_or_newlines_stay_one_header_parameter() {
    let app = TestApp::new().await;
    let cookie = app.login("admin", "admin").await;
    app.post_json("/employee/add", &cookie, "emp_code=E1").await;

    let (_, body) = app
        .post_json(
            "/payroll/create",
            &cookie,
            "emp_code=E1&month=Jan%22%3Bx%3D%22y&year=2024&net_salary=10",
        )
        .await;
    let quoted = body["id"].as_i64().unwrap();
    let (status, headers, _) = app
        .get(&format!("/payroll/{quoted}/pdf"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"pay_E1_Janxy_2024.pdf\"; filename*=UTF-8''pay_E1_Jan%22%3Bx%3D%22y_2024.pdf"
    );

    let (_, body) = app
        .post_json(
            "/payroll/create",
            &cookie,
            "emp_code=E1&month=Jan%0Ax&year=2024&net_salary=10",
        )
        .await;
    let multiline = body["id"].as_i64().unwrap();
    let (status, headers, pdf) = app
        .get(&format!("/payroll/{multiline}/pdf"), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"pay_E1_Jan_x_2024.pdf\"")
    );
    assert!(pdf.starts_with(b"%PDF"));
}
