#![allow(dead_code)]

use std::path::PathBuf;

use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, HistoryRecord, MaskRecord, MemberRecord, PharmacyRecord};
use migration::MigratorTrait;
use uuid::Uuid;

pub async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, PathBuf) {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

pub fn pharmacy(name: &str, hours: &str, cash: f64, masks: &[(&str, f64)]) -> PharmacyRecord {
    PharmacyRecord {
        name: name.to_string(),
        opening_hours: hours.to_string(),
        cash_balance: cash,
        masks: masks
            .iter()
            .map(|(name, price)| MaskRecord {
                name: (*name).to_string(),
                price: *price,
            })
            .collect(),
    }
}

pub fn member(name: &str, cash: f64, histories: &[(&str, &str, f64, &str)]) -> MemberRecord {
    MemberRecord {
        name: name.to_string(),
        cash_balance: cash,
        purchase_histories: histories
            .iter()
            .map(|(pharmacy, mask, amount, date)| HistoryRecord {
                pharmacy_name: (*pharmacy).to_string(),
                mask_name: (*mask).to_string(),
                transaction_amount: *amount,
                transaction_date: (*date).to_string(),
            })
            .collect(),
    }
}

/// Pharmacies 1..=3, masks 1..=5, members 1..=3 in declaration order.
///
/// Eric has two history rows that cannot be resolved.
pub fn catalog() -> (Vec<PharmacyRecord>, Vec<MemberRecord>) {
    let pharmacies = vec![
        pharmacy(
            "DFW Wellness",
            "Mon, Wed, Fri 08:00 - 12:00 / Tue, Thur 14:00 - 18:00",
            328.41,
            &[
                ("True Barrier (green) (3 per pack)", 13.70),
                ("MaskT (green) (10 per pack)", 41.86),
                ("Second Smile (black) (10 per pack)", 31.98),
            ],
        ),
        pharmacy(
            "Carepoint",
            "Mon - Wed 08:00 - 17:00 / Thur, Sat 20:00 - 02:00",
            593.35,
            &[
                ("Masquerade (green) (3 per pack)", 16.75),
                ("MaskT (green) (1 per pack)", 3.23),
            ],
        ),
        pharmacy("Welltrack", "Thursday 08:00 - 12:00", 100.0, &[]),
    ];
    let members = vec![
        member(
            "Yvonne Guerrero",
            191.83,
            &[
                (
                    "DFW Wellness",
                    "True Barrier (green) (3 per pack)",
                    13.70,
                    "2021-01-04 15:18:51",
                ),
                (
                    "Carepoint",
                    "Masquerade (green) (3 per pack)",
                    16.75,
                    "2021-01-10 08:00:00",
                ),
            ],
        ),
        member(
            "Eric Underwood",
            20.0,
            &[
                (
                    "Carepoint",
                    "MaskT (green) (1 per pack)",
                    3.23,
                    "2021-01-31 23:59:59",
                ),
                ("Nowhere", "MaskT (green) (1 per pack)", 3.23, "2021-01-12 10:00:00"),
                ("DFW Wellness", "Unknown mask", 9.99, "2021-01-12 10:00:00"),
            ],
        ),
        member("Ada Lovelace", 5.0, &[]),
    ];
    (pharmacies, members)
}

/// Seeded engine plus a handle on its connection, for statements the engine
/// does not expose.
pub async fn seeded_engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let (pharmacies, members) = catalog();
    engine.import(&pharmacies, &members).await.unwrap();
    (engine, db)
}

pub async fn seeded_engine() -> Engine {
    let engine = engine_with_db().await;
    let (pharmacies, members) = catalog();
    engine.import(&pharmacies, &members).await.unwrap();
    engine
}
