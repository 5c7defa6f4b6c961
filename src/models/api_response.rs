use serde::{Deserialize, Serialize};

use crate::models::account::{AccountId, RawAccount, RawTransaction};
use crate::models::serde_utils::{lenient_vec, null_as_default, skip_malformed};
use crate::models::transfer::{Transfer, TransferId};

/// Response envelope shared by the banking and user services:
/// `{ "success": bool, "data": T }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    // a path default keeps serde from demanding `T: Default`
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransfersData {
    #[serde(default, deserialize_with = "skip_malformed")]
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AccountsData {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub accounts: Option<Vec<RawAccount>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TransactionsData {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Option<Vec<RawTransaction>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTransfer {
    pub transfer_id: TransferId,
}

/// `POST /money-transfer` has answered both bare and enveloped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CreateTransferResponse {
    Bare(CreatedTransfer),
    Wrapped(ApiResponse<CreatedTransfer>),
}

impl CreateTransferResponse {
    pub fn transfer_id(self) -> Option<TransferId> {
        match self {
            Self::Bare(created) => Some(created.transfer_id),
            Self::Wrapped(resp) if resp.success => resp.data.map(|d| d.transfer_id),
            Self::Wrapped(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginData {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: AccountId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
