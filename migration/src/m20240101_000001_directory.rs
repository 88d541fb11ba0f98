use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Department {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum JobRole {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    EmpCode,
    FirstName,
    LastName,
    DepartmentId,
    JobRoleId,
    BasicSalary,
    Contact,
    Email,
    Address,
    Photo,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Department::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Department::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Department::Name)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobRole::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobRole::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobRole::Name)
                            .string_len(120)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employee::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Employee::EmpCode)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Employee::FirstName).string_len(200))
                    .col(ColumnDef::new(Employee::LastName).string_len(200))
                    .col(ColumnDef::new(Employee::DepartmentId).integer())
                    .col(ColumnDef::new(Employee::JobRoleId).integer())
                    .col(
                        ColumnDef::new(Employee::BasicSalary)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Employee::Contact).string_len(80))
                    .col(ColumnDef::new(Employee::Email).string_len(120))
                    .col(ColumnDef::new(Employee::Address).text())
                    .col(ColumnDef::new(Employee::Photo).string_len(300))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_department")
                            .from(Employee::Table, Employee::DepartmentId)
                            .to(Department::Table, Department::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_job_role")
                            .from(Employee::Table, Employee::JobRoleId)
                            .to(JobRole::Table, JobRole::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employee_department")
                    .table(Employee::Table)
                    .col(Employee::DepartmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_employee_job_role")
                    .table(Employee::Table)
                    .col(Employee::JobRoleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobRole::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Department::Table).to_owned())
            .await?;
        Ok(())
    }
}
