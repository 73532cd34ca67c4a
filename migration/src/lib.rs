pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_enum_types;
mod m20250901_000002_create_users_and_ledger;
mod m20250901_000003_create_tasks;
mod m20250901_000004_create_rewards;
mod m20250901_000005_create_platform_tables;
mod m20250901_000006_seed_reference_data;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_enum_types::Migration),
            Box::new(m20250901_000002_create_users_and_ledger::Migration),
            Box::new(m20250901_000003_create_tasks::Migration),
            Box::new(m20250901_000004_create_rewards::Migration),
            Box::new(m20250901_000005_create_platform_tables::Migration),
            Box::new(m20250901_000006_seed_reference_data::Migration),
        ]
    }
}
