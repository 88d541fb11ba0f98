use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Attendance {
    Table,
    Id,
    EmployeeId,
    Date,
    CheckIn,
    CheckOut,
    Status,
}

#[derive(DeriveIden)]
enum LeaveRequest {
    Table,
    Id,
    EmployeeId,
    StartDate,
    EndDate,
    Reason,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Payroll {
    Table,
    Id,
    EmployeeId,
    Month,
    Year,
    NetSalary,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

fn employee_fk(
    name: &str,
    table: impl IntoIden + 'static,
    column: impl IntoIden + 'static,
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Employee::Table, Employee::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendance::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendance::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendance::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(Attendance::Date).date().not_null())
                    .col(ColumnDef::new(Attendance::CheckIn).time())
                    .col(ColumnDef::new(Attendance::CheckOut).time())
                    .col(
                        ColumnDef::new(Attendance::Status)
                            .string_len(16)
                            .not_null()
                            .default("present"),
                    )
                    .foreign_key(&mut employee_fk(
                        "fk_attendance_employee",
                        Attendance::Table,
                        Attendance::EmployeeId,
                    ))
                    .to_owned(),
            )
            .await?;

        // One row per employee and calendar day; check-in upserts on it.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_employee_date")
                    .table(Attendance::Table)
                    .col(Attendance::EmployeeId)
                    .col(Attendance::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LeaveRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeaveRequest::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeaveRequest::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(LeaveRequest::StartDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequest::EndDate).date().not_null())
                    .col(ColumnDef::new(LeaveRequest::Reason).text())
                    .col(
                        ColumnDef::new(LeaveRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(LeaveRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(&mut employee_fk(
                        "fk_leave_request_employee",
                        LeaveRequest::Table,
                        LeaveRequest::EmployeeId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_leave_request_employee")
                    .table(LeaveRequest::Table)
                    .col(LeaveRequest::EmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payroll::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payroll::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payroll::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(Payroll::Month).string_len(20).not_null())
                    .col(ColumnDef::new(Payroll::Year).integer().not_null())
                    .col(
                        ColumnDef::new(Payroll::NetSalary)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Payroll::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(&mut employee_fk(
                        "fk_payroll_employee",
                        Payroll::Table,
                        Payroll::EmployeeId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payroll_employee")
                    .table(Payroll::Table)
                    .col(Payroll::EmployeeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payroll::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LeaveRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attendance::Table).to_owned())
            .await?;
        Ok(())
    }
}
