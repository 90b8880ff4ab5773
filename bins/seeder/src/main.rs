//! Database seeder for walletd development and testing.
//!
//! Creates wallets `1..=N` with an initial balance. Existing wallets are left
//! untouched, so the seeder can be re-run safely.
//!
//! Usage: cargo run --bin seeder -- [N] [INITIAL_MINOR_UNITS]
//!
//! Defaults: 100 wallets, 1000.000 each.

use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use walletd_db::entities::wallet_balance;
use walletd_shared::config::DatabaseConfig;

/// Default number of wallets.
const DEFAULT_WALLETS: i64 = 100;
/// Default initial balance in minor units (1000.000).
const DEFAULT_INITIAL_MINOR: i64 = 1_000_000;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let wallets: i64 = args
        .next()
        .map_or(DEFAULT_WALLETS, |n| n.parse().expect("N must be an integer"));
    let initial: i64 = args.next().map_or(DEFAULT_INITIAL_MINOR, |n| {
        n.parse().expect("INITIAL_MINOR_UNITS must be an integer")
    });
    assert!(wallets > 0, "N must be positive");
    assert!(initial >= 0, "INITIAL_MINOR_UNITS must not be negative");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let config = DatabaseConfig {
        url: database_url,
        max_connections: 2,
        min_connections: 1,
        connect_timeout_secs: 5,
    };

    println!("Connecting to database...");
    let db = walletd_db::connect(&config)
        .await
        .expect("Failed to connect to database");

    println!("Seeding {wallets} wallets...");
    let inserted = seed_wallets(&db, wallets, initial).await;
    println!("  {inserted} created, {} already existed", wallets - inserted);

    println!("Seeding complete!");
}

/// Inserts missing balance rows for wallets `1..=count`.
async fn seed_wallets(db: &DatabaseConnection, count: i64, initial: i64) -> i64 {
    let now = chrono::Utc::now();
    let rows = (1..=count).map(|wallet_id| wallet_balance::ActiveModel {
        wallet_id: Set(wallet_id),
        amount: Set(initial),
        updated_at: Set(now.into()),
    });

    let inserted = wallet_balance::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::column(wallet_balance::Column::WalletId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .expect("Failed to seed wallets");

    i64::try_from(inserted).unwrap_or(i64::MAX)
}
