//! In-memory banking backend for tests and offline runs
//!
//! Behaves like a tiny bank: creating a transfer issues a pending transfer
//! with a one-time code, verifying the right code completes it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::BankingBackend;
use crate::clock::Clock;
use crate::error::BankingError;
use crate::models::{
    AccountId, AccountRef, MoneyTransferRequest, RawAccount, RawTransaction, Transfer,
    TransferId, TransferStatus,
};
use crate::verification::countdown::OTP_TTL_MS;

struct MockState {
    transfers: Vec<Transfer>,
    accounts: HashMap<AccountId, Vec<RawAccount>>,
    transactions: HashMap<AccountId, Vec<RawTransaction>>,
    next_id: i64,
    next_code: String,
    fail_fetches: bool,
    create_rejection: Option<String>,
    create_calls: usize,
    fetch_calls: usize,
    verify_calls: usize,
}

pub struct MockBackend {
    clock: Arc<dyn Clock>,
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(MockState {
                transfers: Vec::new(),
                accounts: HashMap::new(),
                transactions: HashMap::new(),
                next_id: 1,
                next_code: "000000".to_string(),
                fail_fetches: false,
                create_rejection: None,
                create_calls: 0,
                fetch_calls: 0,
                verify_calls: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Id handed to the next created transfer
    pub fn set_next_id(&self, id: i64) {
        self.state().next_id = id;
    }

    /// Code attached to the next created transfer
    pub fn set_next_code(&self, code: &str) {
        self.state().next_code = code.to_string();
    }

    /// Make every transfer list fetch fail with a 503
    pub fn set_fetch_failure(&self, fail: bool) {
        self.state().fail_fetches = fail;
    }

    /// Reject transfer creation with the given reason (`None` accepts again)
    pub fn set_create_rejection(&self, reason: Option<&str>) {
        self.state().create_rejection = reason.map(str::to_string);
    }

    pub fn insert_transfer(&self, transfer: Transfer) {
        self.state().transfers.push(transfer);
    }

    /// Status change made by another channel (e.g. confirmed on the web)
    pub fn set_status(&self, id: TransferId, status: TransferStatus) {
        let mut state = self.state();
        if let Some(t) = state.transfers.iter_mut().find(|t| t.id == id) {
            if !status.is_pending() {
                t.otp = None;
            }
            t.status = status;
        }
    }

    pub fn add_account(&self, user_id: AccountId, account: RawAccount) {
        self.state().accounts.entry(user_id).or_default().push(account);
    }

    pub fn add_transaction(&self, account_id: AccountId, transaction: RawTransaction) {
        self.state()
            .transactions
            .entry(account_id)
            .or_default()
            .push(transaction);
    }

    pub fn transfer(&self, id: TransferId) -> Option<Transfer> {
        self.state().transfers.iter().find(|t| t.id == id).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.state().create_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    pub fn verify_calls(&self) -> usize {
        self.state().verify_calls
    }
}

#[async_trait]
impl BankingBackend for MockBackend {
    async fn create_transfer(
        &self,
        request: &MoneyTransferRequest,
    ) -> Result<TransferId, BankingError> {
        let now = self.clock.now_ms();
        let mut state = self.state();
        state.create_calls += 1;

        if let Some(reason) = &state.create_rejection {
            return Err(BankingError::Rejected(reason.clone()));
        }

        let id = TransferId::new(state.next_id);
        state.next_id += 1;

        let mut transfer = Transfer::new(id, TransferStatus::Pending);
        transfer.amount = request.amount;
        transfer.from_account = Some(AccountRef {
            account_number: request.from_account_number.clone(),
            ..AccountRef::default()
        });
        transfer.to_account = Some(AccountRef {
            account_number: request.recipient_account.clone(),
            ..AccountRef::default()
        });
        transfer.receiver = Some(request.receiver.clone());
        transfer.address = Some(request.address.clone());
        transfer.payment_code = Some(request.payment_code.clone());
        transfer.payment_reference = Some(request.payment_reference.clone());
        transfer.payment_description = Some(request.payment_description.clone());
        transfer.created_at = Some(now);
        transfer.otp = Some(state.next_code.clone());
        state.transfers.push(transfer);

        log::info!("MockBackend::create_transfer -> {}", id);
        Ok(id)
    }

    async fn fetch_transfers(&self) -> Result<Vec<Transfer>, BankingError> {
        let mut state = self.state();
        state.fetch_calls += 1;
        if state.fail_fetches {
            return Err(BankingError::Status {
                status: 503,
                body: "mock outage".to_string(),
            });
        }
        Ok(state.transfers.clone())
    }

    async fn verify_otp(&self, transfer_id: TransferId, code: &str) -> Result<(), BankingError> {
        let now = self.clock.now_ms();
        let mut state = self.state();
        state.verify_calls += 1;

        let transfer = state
            .transfers
            .iter_mut()
            .find(|t| t.id == transfer_id)
            .ok_or_else(|| BankingError::Rejected(format!("unknown transfer {}", transfer_id)))?;

        let expired = transfer
            .created_at
            .map(|created| now >= created + OTP_TTL_MS)
            .unwrap_or(true);
        if !transfer.is_pending() || expired || transfer.code() != Some(code) {
            return Err(BankingError::Rejected("invalid or expired code".to_string()));
        }

        transfer.status = TransferStatus::Completed;
        transfer.otp = None;
        transfer.completed_at = Some(now);
        Ok(())
    }

    async fn fetch_accounts(&self, user_id: &AccountId) -> Result<Vec<RawAccount>, BankingError> {
        Ok(self.state().accounts.get(user_id).cloned().unwrap_or_default())
    }

    async fn fetch_transactions(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<RawTransaction>, BankingError> {
        Ok(self
            .state()
            .transactions
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use rust_decimal::Decimal;

    fn request() -> MoneyTransferRequest {
        MoneyTransferRequest {
            from_account_number: "111".to_string(),
            receiver: "Ana".to_string(),
            recipient_account: "222".to_string(),
            payment_code: "289".to_string(),
            payment_reference: String::new(),
            payment_description: "Rent".to_string(),
            amount: Decimal::new(100, 0),
            address: "Main 1".to_string(),
            saved_receiver: None,
        }
    }

    #[tokio::test]
    async fn test_create_then_verify() {
        let clock = Arc::new(ManualClock::new(1_000));
        let backend = MockBackend::new(clock.clone());
        backend.set_next_id(42);
        backend.set_next_code("123456");

        let id = backend.create_transfer(&request()).await.unwrap();
        assert_eq!(id, TransferId::new(42));

        assert!(backend.verify_otp(id, "000000").await.is_err());
        backend.verify_otp(id, "123456").await.unwrap();

        let stored = backend.transfer(id).unwrap();
        assert_eq!(stored.status, TransferStatus::Completed);
        assert_eq!(stored.otp, None);
        assert_eq!(stored.completed_at, Some(1_000));
        assert_eq!(backend.verify_calls(), 2);
    }

    #[tokio::test]
    async fn test_verify_after_ttl_is_rejected() {
        let clock = Arc::new(ManualClock::new(0));
        let backend = MockBackend::new(clock.clone());
        backend.set_next_code("654321");
        let id = backend.create_transfer(&request()).await.unwrap();

        clock.advance(OTP_TTL_MS);
        assert!(backend.verify_otp(id, "654321").await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_switch() {
        let backend = MockBackend::new(Arc::new(ManualClock::new(0)));
        backend.set_fetch_failure(true);
        assert!(backend.fetch_transfers().await.is_err());
        backend.set_fetch_failure(false);
        assert!(backend.fetch_transfers().await.unwrap().is_empty());
        assert_eq!(backend.fetch_calls(), 2);
    }
}
