//! Property-based tests for the balance mutation rules.
//!
//! - Property 1: Balance never negative after any sequence of operations
//! - Property 2: Over-balance credits change nothing
//! - Property 3: Non-positive amounts are rejected before any I/O

use proptest::prelude::*;
use walletd_shared::{Money, WalletId};

use super::entity::{CreditEntry, DebitEntry};
use super::error::LedgerError;
use super::store::{MockWalletStore, WalletStoreTxFactory};
use super::usecase::WalletUseCases;
use crate::testing::InMemoryLedger;

#[derive(Debug, Clone, Copy)]
enum Op {
    Debit(i64),
    Credit(i64),
}

/// Strategy for minor-unit amounts, including zero and negatives.
fn any_amount() -> impl Strategy<Value = i64> {
    -1_000_000i64..10_000_000i64
}

/// Strategy for strictly positive minor-unit amounts.
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..10_000_000i64
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any_amount().prop_map(Op::Debit),
        any_amount().prop_map(Op::Credit),
    ]
}

fn wallet() -> WalletId {
    WalletId::new(1).unwrap()
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

/// Applies one operation in its own committed transaction.
async fn apply(ledger: &InMemoryLedger, op: Op) -> Result<Money, LedgerError> {
    let tx = ledger.new_tx().await?;
    let uc = WalletUseCases::new(tx.as_ref());
    let result = match op {
        Op::Debit(minor) => {
            uc.debit_money(DebitEntry::new(wallet(), Money::from_minor_units(minor)))
                .await
        }
        Op::Credit(minor) => {
            uc.credit_money(CreditEntry::new(wallet(), Money::from_minor_units(minor)))
                .await
        }
    };
    match result {
        Ok(balance) => {
            tx.commit().await?;
            Ok(balance.amount)
        }
        Err(err) => {
            tx.rollback().await?;
            Err(err)
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1: *For any* starting balance and sequence of debits and
    /// credits, the committed balance is never negative and equals the
    /// start plus accepted debits minus accepted credits.
    #[test]
    fn prop_balance_never_negative(
        start in 0i64..1_000_000i64,
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let ledger = InMemoryLedger::new().with_wallet(wallet(), Money::from_minor_units(start));

        let mut expected = start;
        for op in ops {
            let outcome = block_on(apply(&ledger, op));
            if outcome.is_ok() {
                match op {
                    Op::Debit(minor) => expected += minor,
                    Op::Credit(minor) => expected -= minor,
                }
            }
            let balance = ledger.balance(wallet()).unwrap();
            prop_assert!(!balance.is_negative());
            prop_assert_eq!(balance, Money::from_minor_units(expected));
        }
    }

    /// Property 2: *For any* credit larger than the balance, the call fails
    /// with `InsufficientFunds` and the balance and entries are unchanged.
    #[test]
    fn prop_over_balance_credit_changes_nothing(
        start in 0i64..1_000_000i64,
        excess in positive_amount(),
    ) {
        let ledger = InMemoryLedger::new().with_wallet(wallet(), Money::from_minor_units(start));

        let result = block_on(apply(&ledger, Op::Credit(start + excess)));

        prop_assert_eq!(result, Err(LedgerError::InsufficientFunds));
        prop_assert_eq!(ledger.balance(wallet()), Some(Money::from_minor_units(start)));
        prop_assert!(ledger.credit_entries(wallet()).is_empty());
    }

    /// Property 3: *For any* non-positive amount, both mutations fail with
    /// `InvalidAmount` without calling the store.
    #[test]
    fn prop_non_positive_amount_rejected(minor in -10_000_000i64..=0i64) {
        // No expectations: any store call panics.
        let store = MockWalletStore::new();
        let uc = WalletUseCases::new(&store);
        let amount = Money::from_minor_units(minor);

        let debit = block_on(uc.debit_money(DebitEntry::new(wallet(), amount)));
        let credit = block_on(uc.credit_money(CreditEntry::new(wallet(), amount)));

        prop_assert_eq!(debit, Err(LedgerError::InvalidAmount));
        prop_assert_eq!(credit, Err(LedgerError::InvalidAmount));
    }
}
