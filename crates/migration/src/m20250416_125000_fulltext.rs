//! Full-text indexes on pharmacy and mask names.
//!
//! Both are FTS5 external-content tables: the rows live in `pharmacies` and
//! `masks`, the index is kept in sync by triggers, and ranking is left to
//! `bm25()`.

use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (index table, content table)
const INDEXES: [(&str, &str); 2] = [("pharmacies_fts", "pharmacies"), ("masks_fts", "masks")];

fn create_statements(index: &str, content: &str) -> Vec<String> {
    vec![
        format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {index} USING fts5(name, content='{content}', content_rowid='id');"
        ),
        format!("INSERT INTO {index}({index}) VALUES ('rebuild');"),
        format!(
            "CREATE TRIGGER IF NOT EXISTS {index}_ai AFTER INSERT ON {content} BEGIN \
             INSERT INTO {index}(rowid, name) VALUES (new.id, new.name); END;"
        ),
        format!(
            "CREATE TRIGGER IF NOT EXISTS {index}_ad AFTER DELETE ON {content} BEGIN \
             INSERT INTO {index}({index}, rowid, name) VALUES ('delete', old.id, old.name); END;"
        ),
        format!(
            "CREATE TRIGGER IF NOT EXISTS {index}_au AFTER UPDATE OF name ON {content} BEGIN \
             INSERT INTO {index}({index}, rowid, name) VALUES ('delete', old.id, old.name); \
             INSERT INTO {index}(rowid, name) VALUES (new.id, new.name); END;"
        ),
    ]
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (index, content) in INDEXES {
            for sql in create_statements(index, content) {
                db.execute(Statement::from_string(backend, sql)).await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (index, _) in INDEXES {
            for suffix in ["ai", "ad", "au"] {
                db.execute(Statement::from_string(
                    backend,
                    format!("DROP TRIGGER IF EXISTS {index}_{suffix};"),
                ))
                .await?;
            }
            db.execute(Statement::from_string(
                backend,
                format!("DROP TABLE IF EXISTS {index};"),
            ))
            .await?;
        }

        Ok(())
    }
}
