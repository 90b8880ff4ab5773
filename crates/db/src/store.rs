//! Postgres implementation of the wallet store capabilities.
//!
//! Every transaction runs under `SERIALIZABLE` isolation. Engine errors are
//! translated here, so nothing above this module sees a `DbErr`.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, IsolationLevel,
    RuntimeErr, Set, TransactionTrait,
};
use tracing::debug;
use walletd_core::ledger::{
    CreditEntry, DebitEntry, LedgerError, WalletBalance, WalletStore, WalletStoreTx,
    WalletStoreTxFactory,
};
use walletd_shared::{Money, WalletId};

use crate::entities::{wallet_balance, wallet_entry};

/// `serialization_failure`
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// Opens serializable transactions on a connection pool.
#[derive(Debug, Clone)]
pub struct PgWalletStoreTxFactory {
    db: DatabaseConnection,
}

impl PgWalletStoreTxFactory {
    /// Creates a factory over a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WalletStoreTxFactory for PgWalletStoreTxFactory {
    async fn new_tx(&self) -> Result<Box<dyn WalletStoreTx>, LedgerError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), Some(AccessMode::ReadWrite))
            .await
            .map_err(recognize_error)?;

        Ok(Box::new(PgWalletStoreTx { txn }))
    }
}

/// One serializable transaction.
pub struct PgWalletStoreTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl WalletStore for PgWalletStoreTx {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<WalletBalance, LedgerError> {
        let row = wallet_balance::Entity::find_by_id(wallet_id.get())
            .one(&self.txn)
            .await
            .map_err(recognize_error)?;

        row.map(|m| WalletBalance::new(wallet_id, Money::from_minor_units(m.amount)))
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), LedgerError> {
        let model = wallet_balance::ActiveModel {
            wallet_id: Set(balance.wallet_id.get()),
            amount: Set(minor_units(balance.amount)?),
            updated_at: Set(chrono::Utc::now().into()),
        };

        wallet_balance::Entity::insert(model)
            .on_conflict(
                OnConflict::column(wallet_balance::Column::WalletId)
                    .update_columns([
                        wallet_balance::Column::Amount,
                        wallet_balance::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await
            .map_err(recognize_error)?;
        Ok(())
    }

    async fn add_debit_entry(&self, entry: DebitEntry) -> Result<(), LedgerError> {
        insert_entry(
            &self.txn,
            entry.wallet_id,
            Some(minor_units(entry.amount)?),
            None,
        )
        .await
    }

    async fn add_credit_entry(&self, entry: CreditEntry) -> Result<(), LedgerError> {
        insert_entry(
            &self.txn,
            entry.wallet_id,
            None,
            Some(minor_units(entry.amount)?),
        )
        .await
    }
}

#[async_trait]
impl WalletStoreTx for PgWalletStoreTx {
    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.txn.commit().await.map_err(recognize_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.txn.rollback().await.map_err(recognize_error)
    }
}

async fn insert_entry(
    txn: &DatabaseTransaction,
    wallet_id: WalletId,
    debit_amount: Option<i64>,
    credit_amount: Option<i64>,
) -> Result<(), LedgerError> {
    let model = wallet_entry::ActiveModel {
        wallet_id: Set(wallet_id.get()),
        debit_amount: Set(debit_amount),
        credit_amount: Set(credit_amount),
        ..Default::default()
    };

    wallet_entry::Entity::insert(model)
        .exec_without_returning(txn)
        .await
        .map_err(recognize_error)?;
    Ok(())
}

fn minor_units(amount: Money) -> Result<i64, LedgerError> {
    amount
        .to_minor_units()
        .map_err(|e| LedgerError::Storage(e.to_string()))
}

/// Translates a `SeaORM` error into the ledger taxonomy.
pub fn recognize_error(err: DbErr) -> LedgerError {
    if sqlstate(&err).is_some_and(|code| is_conflict_code(&code)) {
        debug!(error = %err, "serialization conflict");
        return LedgerError::TxConflict;
    }
    LedgerError::Storage(err.to_string())
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(std::borrow::Cow::into_owned),
        _ => None,
    }
}

/// Returns true for SQLSTATE codes that mean "retry the transaction".
#[must_use]
pub fn is_conflict_code(code: &str) -> bool {
    matches!(
        code,
        SQLSTATE_SERIALIZATION_FAILURE | SQLSTATE_DEADLOCK_DETECTED
    )
}
