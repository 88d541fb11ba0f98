pub use sea_orm_migration::prelude::*;

mod m20240101_000001_directory;
mod m20240101_000002_records;
mod m20240102_000003_identity;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_directory::Migration),
            Box::new(m20240101_000002_records::Migration),
            Box::new(m20240102_000003_identity::Migration),
        ]
    }
}
