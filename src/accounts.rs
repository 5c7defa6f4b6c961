//! Read-only accounts overview: balances and per-account history

use std::cmp::Reverse;
use std::sync::Arc;

use crate::backend::BankingBackend;
use crate::models::{Account, AccountId, Transaction};

pub struct AccountsOverview {
    backend: Arc<dyn BankingBackend>,
}

impl AccountsOverview {
    pub fn new(backend: Arc<dyn BankingBackend>) -> Self {
        Self { backend }
    }

    /// Accounts owned by `user_id`. Failures are logged and show as no accounts.
    pub async fn accounts(&self, user_id: &AccountId) -> Vec<Account> {
        match self.backend.fetch_accounts(user_id).await {
            Ok(raw) => raw.into_iter().map(Account::from).collect(),
            Err(e) => {
                log::error!("Failed to load accounts for user {}: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// History of `account_id`, newest first, with direction relative to it
    pub async fn transactions(&self, account_id: &AccountId) -> Vec<Transaction> {
        let raw = match self.backend.fetch_transactions(account_id).await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to load transactions for account {}: {}", account_id, e);
                return Vec::new();
            }
        };

        let mut transactions: Vec<Transaction> = raw
            .into_iter()
            .map(|t| Transaction::from_raw(t, account_id))
            .collect();
        transactions.sort_by_key(|t| Reverse(t.timestamp));
        transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::clock::ManualClock;
    use crate::models::{AccountRef, Currency, Direction, RawAccount, RawTransaction};
    use rust_decimal::Decimal;

    fn overview() -> (Arc<MockBackend>, AccountsOverview) {
        let backend = Arc::new(MockBackend::new(Arc::new(ManualClock::new(0))));
        (backend.clone(), AccountsOverview::new(backend))
    }

    fn raw_transaction(to: u64, number: &str, timestamp: Option<i64>) -> RawTransaction {
        RawTransaction {
            to_account: AccountRef {
                id: Some(AccountId::from(to)),
                account_number: number.to_string(),
                owner_id: None,
            },
            amount: Decimal::new(1000, 2),
            currency: Currency {
                code: "RSD".to_string(),
            },
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_accounts_are_masked() {
        let (backend, overview) = overview();
        backend.add_account(
            AccountId::from(7),
            RawAccount {
                id: AccountId::from(1),
                subtype: "CURRENT".to_string(),
                account_number: "265000000011114321".to_string(),
                balance: Decimal::new(150000, 2),
                currency_type: "RSD".to_string(),
            },
        );

        let accounts = overview.accounts(&AccountId::new("007")).await;
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].number, "**** 4321");
        assert_eq!(accounts[0].balance, "1500.00 RSD");
        assert!(overview.accounts(&AccountId::from(8)).await.is_empty());
    }

    #[tokio::test]
    async fn test_transactions_direction_and_order() {
        let (backend, overview) = overview();
        let selected = AccountId::from(1);
        backend.add_transaction(selected.clone(), raw_transaction(2, "222", Some(100)));
        backend.add_transaction(selected.clone(), raw_transaction(1, "111", Some(300)));
        backend.add_transaction(selected.clone(), raw_transaction(3, "333", None));

        let history = overview.transactions(&AccountId::new("1")).await;
        let numbers: Vec<_> = history.iter().map(|t| t.receiver_account.as_str()).collect();
        assert_eq!(numbers, vec!["111", "222", "333"]);
        assert_eq!(history[0].direction, Direction::Incoming);
        assert_eq!(history[1].direction, Direction::Outgoing);
    }
}
