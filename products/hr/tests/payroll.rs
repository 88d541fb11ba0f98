mod common;

use common::{TestHr, admin, at, employee_login};
use entity::{audit_log, payroll};
use products_hr::{EmployeeInput, HrError, PayrollInput};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};

fn payroll_form(code: &str, month: &str, year: &str, net: &str) -> PayrollInput {
    PayrollInput {
        emp_code: code.into(),
        month: Some(month.into()),
        year: Some(year.into()),
        net_salary: Some(net.into()),
    }
}

#[tokio::test]
async fn e100_month_end_lands_in_the_payroll_export() {
    let ctx = TestHr::new().await;
    ctx.add_employee("E100", "50000").await;
    ctx.hr
        .check_in(&admin(), "E100", Some("2024-01-10"), at("2024-01-10", "09:00:00"))
        .await
        .unwrap();
    ctx.hr
        .check_out(&admin(), "E100", Some("2024-01-10"), at("2024-01-10", "17:00:00"))
        .await
        .unwrap();
    let created = ctx
        .hr
        .create_payroll(&admin(), payroll_form("E100", "January", "2024", "45000"))
        .await
        .unwrap();

    let csv = String::from_utf8(ctx.hr.export_payrolls_csv(&admin()).await.unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,employee,month,year,net");
    assert_eq!(lines[1], format!("{},E100,January,2024,45000.0", created.id));

    let last = audit_log::Entity::find()
        .order_by_desc(audit_log::Column::Id)
        .one(ctx.hr.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.action, "payroll create E100 January/2024");
}

#[tokio::test]
async fn payroll_is_append_only_and_defaults_blank_numbers() {
    let ctx = TestHr::new().await;
    ctx.add_employee("E1", "100").await;
    ctx.hr
        .create_payroll(&admin(), payroll_form("E1", "March", "2024", "10"))
        .await
        .unwrap();
    let blank = ctx
        .hr
        .create_payroll(&admin(), payroll_form("E1", "March", "", ""))
        .await
        .unwrap();
    assert_eq!(blank.year, 0);
    assert_eq!(blank.net_salary, 0.0);
    assert_eq!(payroll::Entity::find().count(ctx.hr.db()).await.unwrap(), 2);

    let err = ctx
        .hr
        .create_payroll(&admin(), payroll_form("E1", "March", "2024", "ten"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid data");
    let err = ctx
        .hr
        .create_payroll(&admin(), payroll_form("E404", "March", "2024", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));
}

#[tokio::test]
async fn employee_csv_has_a_row_per_employee_in_column_order() {
    let ctx = TestHr::new().await;
    ctx.add_employee("E1", "1234.5").await;
    ctx.hr
        .upsert_employee(
            &admin(),
            EmployeeInput {
                emp_code: "E2".into(),
                department_id: Some("2".into()),
                role_id: Some("1".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    ctx.add_employee("E3", "0").await;

    let csv = String::from_utf8(ctx.hr.export_employees_csv(&admin()).await.unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "id,emp_code,first_name,last_name,department,role,basic_salary,contact,email"
    );
    assert_eq!(lines[1], "1,E1,Ada,Lovelace,,,1234.5,,e1@example.com");
    assert_eq!(lines[2], "2,E2,,,IT,Developer,0.0,,");
}

#[tokio::test]
async fn payslip_renders_summary_lines_and_download_name() {
    let ctx = TestHr::new().await;
    let id = ctx.add_employee("E1", "100").await;
    let entry = ctx
        .hr
        .create_payroll(&admin(), payroll_form("E1", "January", "2024", "45000"))
        .await
        .unwrap();

    let slip = ctx.hr.render_payslip(&admin(), entry.id).await.unwrap();
    assert_eq!(slip.filename, "pay_E1_January_2024.pdf");
    assert_eq!(
        slip.lines,
        vec![
            "Employee: E1 Ada Lovelace".to_string(),
            "Month: January/2024".to_string(),
            "Net: 45000.0".to_string(),
        ]
    );
    assert!(slip.bytes.starts_with(b"%PDF"));

    // the employee may fetch their own slip, not someone else's
    ctx.hr
        .render_payslip(&employee_login(id), entry.id)
        .await
        .unwrap();
    let err = ctx
        .hr
        .render_payslip(&employee_login(id + 1), entry.id)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));

    let err = ctx.hr.render_payslip(&admin(), 999).await.unwrap_err();
    assert!(matches!(err, HrError::NotFound(_)));
    let err = ctx
        .hr
        .render_payslip(&employee_login(id), 999)
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
}

#[tokio::test]
async fn exports_are_staff_only() {
    let ctx = TestHr::new().await;
    let id = ctx.add_employee("E1", "100").await;
    let err = ctx
        .hr
        .export_employees_csv(&employee_login(id))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
    let err = ctx
        .hr
        .create_payroll(&employee_login(id), payroll_form("E1", "May", "2024", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
    let err = ctx
        .hr
        .create_payroll(&employee_login(id), payroll_form("E404", "May", "2024", "1"))
        .await
        .unwrap_err();
    assert!(matches!(err, HrError::Forbidden(_)));
}
