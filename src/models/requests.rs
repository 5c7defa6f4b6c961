use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::transfer::TransferId;

/// Body of `POST /money-transfer`.
///
/// Field names follow the backend's wire spelling (`payement*`, `adress`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyTransferRequest {
    #[serde(rename = "fromAccountNumber")]
    pub from_account_number: String,
    pub receiver: String,
    #[serde(rename = "recipientAccount")]
    pub recipient_account: String,
    #[serde(rename = "payementCode")]
    pub payment_code: String,
    #[serde(rename = "payementReference")]
    pub payment_reference: String,
    #[serde(rename = "payementDescription")]
    pub payment_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "adress")]
    pub address: String,
    #[serde(rename = "savedReceiver")]
    pub saved_receiver: Option<String>,
}

/// Body of `POST /otp/verification`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerificationRequest {
    pub transfer_id: TransferId,
    pub otp_code: String,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}
