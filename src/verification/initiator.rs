//! Payment submission
//!
//! Validates the payment form locally, then creates exactly one pending
//! transfer per call. There is no idempotency key: callers must not resubmit
//! the same payment without the user asking for it again.

use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::BankingBackend;
use crate::error::BankingError;
use crate::models::{MoneyTransferRequest, SavedRecipient, TransferId};

/// Raw form input, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentForm {
    pub from_account_number: String,
    pub receiver_name: String,
    pub recipient_account: String,
    pub payment_code: String,
    pub payment_description: String,
    pub amount: String,
    pub address: String,
    /// Optional; sent as an empty string when blank
    pub payment_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    MissingField(&'static str),
    InvalidAmount(String),
    NonPositiveAmount(Decimal),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "Missing required field: {}", field),
            Self::InvalidAmount(raw) => write!(f, "Amount is not a number: {:?}", raw),
            Self::NonPositiveAmount(amount) => write!(f, "Amount must be positive, got {}", amount),
        }
    }
}

impl std::error::Error for FormError {}

fn required(value: &str, field: &'static str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

impl PaymentForm {
    /// Check every field and build the wire request. Never touches the network.
    pub fn validate(&self) -> Result<MoneyTransferRequest, FormError> {
        let from_account_number = required(&self.from_account_number, "from_account_number")?;
        let receiver = required(&self.receiver_name, "receiver_name")?;
        let recipient_account = required(&self.recipient_account, "recipient_account")?;
        let payment_code = required(&self.payment_code, "payment_code")?;
        let payment_description = required(&self.payment_description, "payment_description")?;
        let raw_amount = required(&self.amount, "amount")?;
        let address = required(&self.address, "address")?;

        let amount = Decimal::from_str(&raw_amount)
            .map_err(|_| FormError::InvalidAmount(raw_amount.clone()))?;
        if amount <= Decimal::ZERO {
            return Err(FormError::NonPositiveAmount(amount));
        }

        Ok(MoneyTransferRequest {
            from_account_number,
            receiver,
            recipient_account,
            payment_code,
            payment_reference: self.payment_reference.trim().to_string(),
            payment_description,
            amount,
            address,
            saved_receiver: None,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Form prefilled from a saved recipient; source account, amount and
    /// description are left to the user.
    pub fn for_recipient(recipient: &SavedRecipient) -> Self {
        Self {
            receiver_name: recipient.full_name(),
            recipient_account: recipient.account_number.clone(),
            address: recipient.address.clone().unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Caught locally, nothing was sent
    Invalid(FormError),
    Unauthenticated,
    /// Anything the backend or the network did; deliberately not broken down
    Failed,
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "Please fill in all fields correctly.",
            Self::Unauthenticated => "Please log in again.",
            Self::Failed => "Failed payment. Try again.",
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "{}", e),
            other => write!(f, "{}", other.user_message()),
        }
    }
}

impl std::error::Error for SubmitError {}

impl From<FormError> for SubmitError {
    fn from(err: FormError) -> Self {
        SubmitError::Invalid(err)
    }
}

/// Transfer id plus the code the backend issued for it, when it could be read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    pub transfer_id: TransferId,
    pub otp: Option<String>,
}

pub struct TransferInitiator {
    backend: Arc<dyn BankingBackend>,
}

impl TransferInitiator {
    pub fn new(backend: Arc<dyn BankingBackend>) -> Self {
        Self { backend }
    }

    pub async fn submit(&self, form: &PaymentForm) -> Result<TransferId, SubmitError> {
        let request = form.validate()?;
        match self.backend.create_transfer(&request).await {
            Ok(id) => Ok(id),
            Err(BankingError::Unauthenticated) => Err(SubmitError::Unauthenticated),
            Err(e) => {
                log::error!(
                    "Transfer submission via {} failed [{}]: {}",
                    self.backend.name(),
                    e.error_code(),
                    e
                );
                Err(SubmitError::Failed)
            }
        }
    }

    /// Submit, then read the new transfer back once to pick up its code.
    ///
    /// The read-back is best effort: the transfer exists either way.
    pub async fn submit_and_fetch_code(
        &self,
        form: &PaymentForm,
    ) -> Result<PendingCode, SubmitError> {
        let transfer_id = self.submit(form).await?;
        let otp = match self.backend.fetch_transfers().await {
            Ok(transfers) => transfers
                .into_iter()
                .find(|t| t.id == transfer_id)
                .and_then(|t| t.code().map(str::to_string)),
            Err(e) => {
                log::warn!("Created transfer {} but could not read it back: {}", transfer_id, e);
                None
            }
        };
        Ok(PendingCode { transfer_id, otp })
    }
}
