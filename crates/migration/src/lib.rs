pub use sea_orm_migration::prelude::*;

mod m20250415_120000_init;
mod m20250416_125000_fulltext;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250415_120000_init::Migration),
            Box::new(m20250416_125000_fulltext::Migration),
        ]
    }
}
