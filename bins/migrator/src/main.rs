//! Migration runner for the walletd ledger schema.
//!
//! Reads `DATABASE_URL` (a `.env` file is honored).
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Revert the last migration
//!   migrator status  - List applied and pending migrations
//!   migrator fresh   - Drop every table and re-apply all migrations
//!
//! The server applies pending migrations at start-up as well; this binary is
//! for operators and CI.

use sea_orm_migration::prelude::*;
use walletd_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
