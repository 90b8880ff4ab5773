//! Wallet balance routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use walletd_core::ledger::{CreditEntry, DebitEntry, WalletBalance};
use walletd_shared::{Money, WalletId};

use crate::{AppState, error::ApiError, extract::ApiJson, middleware::AuthUser};

/// Creates the wallet routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets/{wallet}/balance", get(get_balance))
        .route("/wallets/{wallet}/debit", post(debit))
        .route("/wallets/{wallet}/credit", post(credit))
}

/// Mutation request body.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Amount in minor units (x 1000). Must be positive.
    pub amount: i64,
}

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// Payload.
    pub data: T,
}

/// Balance as seen by clients.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Wallet identifier.
    #[serde(rename = "walletId")]
    pub wallet_id: WalletId,
    /// Amount in minor units.
    pub amount: Money,
}

impl From<WalletBalance> for BalanceResponse {
    fn from(balance: WalletBalance) -> Self {
        Self {
            wallet_id: balance.wallet_id,
            amount: balance.amount,
        }
    }
}

fn balance_body(balance: WalletBalance) -> Json<DataResponse<BalanceResponse>> {
    Json(DataResponse {
        data: balance.into(),
    })
}

/// GET `/wallets/{wallet}/balance` - Current balance.
async fn get_balance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(wallet): Path<String>,
) -> Result<Json<DataResponse<BalanceResponse>>, ApiError> {
    let wallet_id: WalletId = wallet.parse()?;
    let balance = state.wallets.get_balance(wallet_id).await?;
    Ok(balance_body(balance))
}

/// POST `/wallets/{wallet}/debit` - Add money to the wallet.
async fn debit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wallet): Path<String>,
    ApiJson(body): ApiJson<AmountRequest>,
) -> Result<Json<DataResponse<BalanceResponse>>, ApiError> {
    let wallet_id: WalletId = wallet.parse()?;
    let entry = DebitEntry::new(wallet_id, Money::from_minor_units(body.amount));

    let balance = state.wallets.debit_money(entry).await?;
    info!(wallet_id = %wallet_id, amount = body.amount, subject = auth.subject(), "wallet debited");
    Ok(balance_body(balance))
}

/// POST `/wallets/{wallet}/credit` - Remove money from the wallet.
async fn credit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(wallet): Path<String>,
    ApiJson(body): ApiJson<AmountRequest>,
) -> Result<Json<DataResponse<BalanceResponse>>, ApiError> {
    let wallet_id: WalletId = wallet.parse()?;
    let entry = CreditEntry::new(wallet_id, Money::from_minor_units(body.amount));

    let balance = state.wallets.credit_money(entry).await?;
    info!(wallet_id = %wallet_id, amount = body.amount, subject = auth.subject(), "wallet credited");
    Ok(balance_body(balance))
}
