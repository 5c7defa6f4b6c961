//! Banking backend trait
//!
//! The seam between the verification workflow and whatever serves transfers.

use async_trait::async_trait;

use crate::error::BankingError;
use crate::models::{AccountId, MoneyTransferRequest, RawAccount, RawTransaction, Transfer, TransferId};

/// Operations the client needs from the banking service.
///
/// Implementations report failures as they are; deciding whether a failure
/// is absorbed (reads) or surfaced (writes) is the caller's job.
#[async_trait]
pub trait BankingBackend: Send + Sync {
    /// Create a pending transfer (`POST /money-transfer`).
    ///
    /// Not idempotent: each successful call creates one transfer.
    async fn create_transfer(
        &self,
        request: &MoneyTransferRequest,
    ) -> Result<TransferId, BankingError>;

    /// Snapshot of the user's transfers (`GET /mobile-transfers`).
    ///
    /// A `success=false` envelope is an empty snapshot, not an error.
    async fn fetch_transfers(&self) -> Result<Vec<Transfer>, BankingError>;

    /// Confirm a pending transfer with its one-time code (`POST /otp/verification`)
    async fn verify_otp(&self, transfer_id: TransferId, code: &str) -> Result<(), BankingError>;

    /// Accounts owned by a user (`GET /accounts/user/{id}`)
    async fn fetch_accounts(&self, user_id: &AccountId) -> Result<Vec<RawAccount>, BankingError>;

    /// Transaction history of one account (`GET /transactions/{id}`)
    async fn fetch_transactions(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<RawTransaction>, BankingError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
