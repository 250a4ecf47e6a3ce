//! Initial schema migration.
//!
//! Creates the marketplace tables:
//!
//! - `pharmacies`: sellers, with their parsed opening hours and cash balance
//! - `masks`: products, each owned by exactly one pharmacy
//! - `members`: buyers with a cash balance
//! - `purchase_histories`: append-only ledger of completed purchases
//!
//! Money columns hold integer minor units (cents).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Pharmacies {
    Table,
    Id,
    Name,
    OpeningHours,
    CashBalanceMinor,
}

#[derive(Iden)]
enum Masks {
    Table,
    Id,
    PharmacyId,
    Name,
    PriceMinor,
    Quantity,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    Name,
    CashBalanceMinor,
}

#[derive(Iden)]
enum PurchaseHistories {
    Table,
    Id,
    MemberId,
    PharmacyId,
    MaskId,
    UnitPriceMinor,
    AmountMinor,
    TransactionDate,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Pharmacies
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Pharmacies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pharmacies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pharmacies::Name).string().not_null())
                    .col(ColumnDef::new(Pharmacies::OpeningHours).text().not_null())
                    .col(
                        ColumnDef::new(Pharmacies::CashBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pharmacies-name")
                    .table(Pharmacies::Table)
                    .col(Pharmacies::Name)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Masks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Masks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Masks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Masks::PharmacyId).big_integer().not_null())
                    .col(ColumnDef::new(Masks::Name).string().not_null())
                    .col(
                        ColumnDef::new(Masks::PriceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Masks::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-masks-pharmacy_id")
                            .from(Masks::Table, Masks::PharmacyId)
                            .to(Pharmacies::Table, Pharmacies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-masks-pharmacy_id-price")
                    .table(Masks::Table)
                    .col(Masks::PharmacyId)
                    .col(Masks::PriceMinor)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::Name).string().not_null())
                    .col(
                        ColumnDef::new(Members::CashBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Purchase histories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PurchaseHistories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseHistories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseHistories::MemberId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseHistories::PharmacyId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseHistories::MaskId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseHistories::UnitPriceMinor).big_integer())
                    .col(
                        ColumnDef::new(PurchaseHistories::AmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseHistories::TransactionDate)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_histories-member_id")
                            .from(PurchaseHistories::Table, PurchaseHistories::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_histories-pharmacy_id")
                            .from(PurchaseHistories::Table, PurchaseHistories::PharmacyId)
                            .to(Pharmacies::Table, Pharmacies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_histories-mask_id")
                            .from(PurchaseHistories::Table, PurchaseHistories::MaskId)
                            .to(Masks::Table, Masks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_histories-member_id-transaction_date")
                    .table(PurchaseHistories::Table)
                    .col(PurchaseHistories::MemberId)
                    .col(PurchaseHistories::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_histories-mask_id-pharmacy_id")
                    .table(PurchaseHistories::Table)
                    .col(PurchaseHistories::MaskId)
                    .col(PurchaseHistories::PharmacyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseHistories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Masks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pharmacies::Table).to_owned())
            .await?;
        Ok(())
    }
}
