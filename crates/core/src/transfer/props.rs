//! Property tests: balances are conserved and never negative.

use pocketbank_shared::types::Amount;
use proptest::prelude::*;

use super::TransferRequest;
use crate::auth::SimplePassword;
use crate::ledger::TransactionStatus;
use crate::testing::TestBank;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_transfers_conserve_total_balance(
        balances in prop::collection::vec(0i64..50_000, 2..5),
        moves in prop::collection::vec((0usize..5, 0usize..5, 50i64..20_000), 1..25),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let bank = TestBank::new();
            let mut accounts = Vec::new();
            for (i, balance) in balances.iter().enumerate() {
                accounts.push(bank.open_account(&format!("user{i}"), *balance).await);
            }
            let initial: i64 = balances.iter().sum();

            for (from, to, amount) in &moves {
                let (user, _) = &accounts[from % accounts.len()];
                let (_, target) = &accounts[to % accounts.len()];
                let _ = bank
                    .services
                    .transfers
                    .transfer(
                        *user,
                        TransferRequest {
                            to_account_number: target.account_number.clone(),
                            amount: Amount::new(*amount),
                            simple_password: SimplePassword::new(TestBank::PIN),
                            description: None,
                        },
                        None,
                    )
                    .await;
            }

            prop_assert_eq!(bank.store.total_balance().await, Amount::new(initial));
            for (_, account) in &accounts {
                prop_assert!(bank.balance(account.id).await >= 0);
            }

            // Replaying the completed postings from the opening balances
            // reproduces the final balances.
            let mut replayed: Vec<i64> = balances.clone();
            for tx in bank.store.all_transactions().await {
                if tx.status != TransactionStatus::Completed || tx.tx_type.is_deposit() {
                    continue;
                }
                let from = accounts.iter().position(|(_, a)| a.id == tx.from_account_id).unwrap();
                let to = accounts
                    .iter()
                    .position(|(_, a)| Some(a.id) == tx.to_account_id)
                    .unwrap();
                replayed[from] -= tx.amount.value();
                replayed[to] += tx.amount.value();
            }
            for ((_, account), expected) in accounts.iter().zip(replayed) {
                prop_assert_eq!(bank.balance(account.id).await, expected);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
