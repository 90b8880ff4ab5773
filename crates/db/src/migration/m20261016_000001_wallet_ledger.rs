//! Wallet ledger schema.
//!
//! Creates the materialized balance table and the append-only entry table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WALLET_LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS wallet_entry CASCADE; DROP TABLE IF EXISTS wallet_balance CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const WALLET_LEDGER_SQL: &str = r"
-- One row per wallet, amount in minor units (x 1000)
CREATE TABLE wallet_balance (
    wallet_id BIGINT PRIMARY KEY,
    amount BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_wallet_balance_non_negative CHECK (wallet_id > 0 AND amount >= 0)
);

-- Append-only mutation log
CREATE TABLE wallet_entry (
    id BIGSERIAL PRIMARY KEY,
    wallet_id BIGINT NOT NULL,
    debit_amount BIGINT,
    credit_amount BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_wallet_entry_one_side CHECK (
        (debit_amount IS NOT NULL AND debit_amount > 0 AND credit_amount IS NULL)
        OR (credit_amount IS NOT NULL AND credit_amount > 0 AND debit_amount IS NULL)
    )
);

-- Entries of a wallet in insertion order
CREATE INDEX idx_wallet_entry_wallet ON wallet_entry(wallet_id, id);
";
