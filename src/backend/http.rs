//! Reqwest-backed banking backend

use std::sync::Arc;

use async_trait::async_trait;

use super::traits::BankingBackend;
use crate::auth::TokenProvider;
use crate::client::{ApiClient, ClientConfig};
use crate::error::BankingError;
use crate::models::{
    AccountId, AccountsData, ApiResponse, CreateTransferResponse, MoneyTransferRequest,
    OtpVerificationRequest, RawAccount, RawTransaction, TransactionsData, Transfer, TransferId,
    TransfersData,
};

pub const MONEY_TRANSFER_PATH: &str = "/money-transfer";
pub const MOBILE_TRANSFERS_PATH: &str = "/mobile-transfers";
pub const OTP_VERIFICATION_PATH: &str = "/otp/verification";

/// Banking service reached over HTTP
pub struct HttpBankingBackend {
    api: ApiClient,
}

impl HttpBankingBackend {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, BankingError> {
        Ok(Self {
            api: ApiClient::new(config, tokens)?,
        })
    }
}

#[async_trait]
impl BankingBackend for HttpBankingBackend {
    async fn create_transfer(
        &self,
        request: &MoneyTransferRequest,
    ) -> Result<TransferId, BankingError> {
        let response: CreateTransferResponse =
            self.api.post_json(MONEY_TRANSFER_PATH, request).await?;
        let transfer_id = response
            .transfer_id()
            .ok_or_else(|| BankingError::Rejected("no transfer id in response".to_string()))?;
        log::info!(
            "Created transfer {} from {} amount={}",
            transfer_id,
            request.from_account_number,
            request.amount
        );
        Ok(transfer_id)
    }

    async fn fetch_transfers(&self) -> Result<Vec<Transfer>, BankingError> {
        let response: ApiResponse<TransfersData> = self.api.get_json(MOBILE_TRANSFERS_PATH).await?;
        if !response.success {
            log::warn!(
                "Transfer list not successful ({}), treating as empty",
                response.message.as_deref().unwrap_or("no message")
            );
            return Ok(Vec::new());
        }
        Ok(response.data.unwrap_or_default().transfers)
    }

    async fn verify_otp(&self, transfer_id: TransferId, code: &str) -> Result<(), BankingError> {
        let body = OtpVerificationRequest {
            transfer_id,
            otp_code: code.to_string(),
        };
        self.api.post_unit(OTP_VERIFICATION_PATH, &body).await?;
        log::info!("Verified transfer {}", transfer_id);
        Ok(())
    }

    async fn fetch_accounts(&self, user_id: &AccountId) -> Result<Vec<RawAccount>, BankingError> {
        let path = format!("/accounts/user/{}", user_id);
        let response: ApiResponse<AccountsData> = self.api.get_json(&path).await?;
        match response.data.and_then(|d| d.accounts) {
            Some(accounts) => Ok(accounts),
            None => {
                log::error!("No valid account list in response for user {}", user_id);
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_transactions(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<RawTransaction>, BankingError> {
        let path = format!("/transactions/{}", account_id);
        let response: ApiResponse<TransactionsData> = self.api.get_json(&path).await?;
        Ok(response.data.and_then(|d| d.data).unwrap_or_default())
    }

    fn name(&self) -> &str {
        "http"
    }
}
