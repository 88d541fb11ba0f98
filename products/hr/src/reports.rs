use std::collections::HashMap;

use csv::{Terminator, WriterBuilder};
use entity::{department, employee, job_role, payroll};
use platform_authz::Action;
use printpdf::{BuiltinFont, Mm, PdfDocument};
use sea_orm::{EntityTrait, QueryOrder};
use tracing::instrument;

use crate::{Actor, HrError, HrModule, HrResult};

const EMPLOYEE_HEADER: [&str; 9] = [
    "id",
    "emp_code",
    "first_name",
    "last_name",
    "department",
    "role",
    "basic_salary",
    "contact",
    "email",
];
const PAYROLL_HEADER: [&str; 5] = ["id", "employee", "month", "year", "net"];

/// Shortest round-trip form that keeps a decimal point (`45000.0`,
/// `1234.5`). Outside `1e-4..1e16` the exponent is signed and at least two
/// digits wide (`1e+16`, `1e-05`).
pub fn format_amount(value: f64) -> String {
    let repr = format!("{value:?}");
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return repr;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// A rendered salary slip.
#[derive(Clone, Debug)]
pub struct Payslip {
    pub filename: String,
    pub lines: Vec<String>,
    pub bytes: Vec<u8>,
}

fn report_error(err: impl std::fmt::Display) -> HrError {
    HrError::Report(err.to_string())
}

fn write_csv<I>(header: &[&str], rows: I) -> HrResult<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(header).map_err(report_error)?;
    for row in rows {
        writer.write_record(&row).map_err(report_error)?;
    }
    writer.into_inner().map_err(report_error)
}

impl HrModule {
    /// `employees.csv`: one row per employee ordered by id, lookups resolved
    /// to their names.
    #[instrument(skip_all, fields(actor = %actor.username))]
    pub async fn export_employees_csv(&self, actor: &Actor) -> HrResult<Vec<u8>> {
        self.authorize(actor, Action::ExportReports, None)?;
        let departments: HashMap<i32, String> = department::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();
        let roles: HashMap<i32, String> = job_role::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();
        let employees = employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(&self.db)
            .await?;

        let lookup = |names: &HashMap<i32, String>, id: Option<i32>| {
            id.and_then(|id| names.get(&id).cloned()).unwrap_or_default()
        };
        let rows = employees.into_iter().map(|e| {
            vec![
                e.id.to_string(),
                e.emp_code,
                e.first_name.unwrap_or_default(),
                e.last_name.unwrap_or_default(),
                lookup(&departments, e.department_id),
                lookup(&roles, e.job_role_id),
                format_amount(e.basic_salary),
                e.contact.unwrap_or_default(),
                e.email.unwrap_or_default(),
            ]
        });
        write_csv(&EMPLOYEE_HEADER, rows)
    }

    /// `payrolls.csv`: one row per payroll ordered by id with the employee
    /// code in place of the internal id.
    #[instrument(skip_all, fields(actor = %actor.username))]
    pub async fn export_payrolls_csv(&self, actor: &Actor) -> HrResult<Vec<u8>> {
        self.authorize(actor, Action::ExportReports, None)?;
        let payrolls = payroll::Entity::find()
            .find_also_related(employee::Entity)
            .order_by_asc(payroll::Column::Id)
            .all(&self.db)
            .await?;
        let rows = payrolls.into_iter().map(|(p, emp)| {
            vec![
                p.id.to_string(),
                emp.map(|e| e.emp_code).unwrap_or_default(),
                p.month,
                p.year.to_string(),
                format_amount(p.net_salary),
            ]
        });
        write_csv(&PAYROLL_HEADER, rows)
    }

    /// One A4 page titled "Salary Slip". Employee logins may only fetch
    /// their own.
    #[instrument(skip_all, fields(actor = %actor.username, payroll_id = payroll_id))]
    pub async fn render_payslip(&self, actor: &Actor, payroll_id: i32) -> HrResult<Payslip> {
        self.authorize_role(actor, Action::ViewPayslip)?;
        let found = payroll::Entity::find_by_id(payroll_id)
            .find_also_related(employee::Entity)
            .one(&self.db)
            .await?
            .ok_or_else(|| HrError::not_found("payroll not found"));
        let (record, employee) = self.conceal_missing(actor, Action::ViewPayslip, found)?;
        self.authorize(actor, Action::ViewPayslip, Some(record.employee_id))?;
        let employee = employee.ok_or_else(|| HrError::not_found("employee not found"))?;

        let lines = vec![
            format!("Employee: {}", employee.display_name()),
            format!("Month: {}/{}", record.month, record.year),
            format!("Net: {}", format_amount(record.net_salary)),
        ];
        let bytes = payslip_pdf(&lines)?;
        Ok(Payslip {
            filename: format!(
                "pay_{}_{}_{}.pdf",
                employee.emp_code, record.month, record.year
            ),
            lines,
            bytes,
        })
    }
}

fn payslip_pdf(lines: &[String]) -> HrResult<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new("Salary Slip", Mm(210.0), Mm(297.0), "slip");
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(report_error)?;
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(report_error)?;
    let canvas = doc.get_page(page).get_layer(layer);

    let left = Mm(14.0);
    let mut y = 276.0;
    canvas.use_text("Salary Slip", 14.0, left, Mm(y), &title_font);
    y -= 7.0;
    for line in lines {
        canvas.use_text(line.as_str(), 10.0, left, Mm(y), &body_font);
        y -= 5.0;
    }
    doc.save_to_bytes().map_err(report_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_keep_a_decimal_point() {
        assert_eq!(format_amount(45000.0), "45000.0");
        assert_eq!(format_amount(1234.5), "1234.5");
        assert_eq!(format_amount(0.0), "0.0");
        assert_eq!(format_amount(0.0001), "0.0001");
    }

    #[test]
    fn large_and_tiny_amounts_use_a_signed_exponent() {
        assert_eq!(format_amount(1e16), "1e+16");
        assert_eq!(format_amount(1.5e17), "1.5e+17");
        assert_eq!(format_amount(1e-5), "1e-05");
        assert_eq!(format_amount(1e300), "1e+300");
    }

    #[test]
    fn csv_rows_use_crlf_and_quote_commas() {
        let bytes = write_csv(
            &["id", "name"],
            vec![vec!["1".to_string(), "Doe, Jane".to_string()]],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "id,name\r\n1,\"Doe, Jane\"\r\n"
        );
    }

    #[test]
    fn payslip_pdf_is_a_pdf() {
        let bytes = payslip_pdf(&["Net: 45000.0".to_string()]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
