//! Transfer records as served by `GET /mobile-transfers`.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::models::account::{AccountRef, Currency};
use crate::models::serde_utils::{lenient_millis, null_as_default};

/// Backend transfer identifier
///
/// Serialized as a JSON number; accepted as a number or a numeric string since
/// the create endpoint has returned both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(i64);

impl TransferId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransferId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|e| format!("Invalid TransferId: {}", e))
    }
}

impl Serialize for TransferId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for TransferId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .map(Self)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid transfer id: {}", n))),
            Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!("invalid transfer id: {}", other))),
        }
    }
}

/// Transfer status. Only `PENDING` and `COMPLETED` are known to the client;
/// any other backend value is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    Pending,
    Completed,
    Other(String),
}

impl TransferStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Other(s) => s,
        }
    }

    pub fn from_wire(s: &str) -> Self {
        match s {
            "PENDING" => Self::Pending,
            "COMPLETED" => Self::Completed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TransferStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransferStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

/// A money transfer as reported by the backend.
///
/// The client never edits these; each refresh replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: TransferId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Decimal,
    #[serde(default, rename = "fromAccountId")]
    pub from_account: Option<AccountRef>,
    #[serde(default, rename = "toAccountId")]
    pub to_account: Option<AccountRef>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default, rename = "adress")]
    pub address: Option<String>,
    #[serde(default)]
    pub payment_code: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub payment_description: Option<String>,
    #[serde(default)]
    pub from_currency: Option<Currency>,
    #[serde(default)]
    pub to_currency: Option<Currency>,
    /// Epoch milliseconds; `None` when absent or malformed
    #[serde(default, with = "lenient_millis")]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub otp: Option<String>,
    #[serde(default, rename = "type")]
    pub transfer_type: Option<String>,
    pub status: TransferStatus,
    #[serde(default, with = "lenient_millis")]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl Transfer {
    /// Bare transfer with every optional field empty
    pub fn new(id: TransferId, status: TransferStatus) -> Self {
        Self {
            id,
            amount: Decimal::ZERO,
            from_account: None,
            to_account: None,
            receiver: None,
            address: None,
            payment_code: None,
            payment_reference: None,
            payment_description: None,
            from_currency: None,
            to_currency: None,
            created_at: None,
            otp: None,
            transfer_type: None,
            status,
            completed_at: None,
            note: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    /// The one-time code, if the backend attached a non-empty one
    pub fn code(&self) -> Option<&str> {
        self.otp.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn currency_code(&self) -> &str {
        self.from_currency.as_ref().map(|c| c.code.as_str()).unwrap_or("")
    }
}
