use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::models::serde_utils::{lenient_millis, null_as_default};

/// Account or user identifier, normalized once at the wire boundary.
///
/// The backend sends these as JSON numbers in some payloads and as strings in
/// others. Both forms collapse into the same trimmed decimal text so that
/// equality checks (transaction direction, receiver ownership) never depend on
/// which payload an id came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(normalize_numeric_text(id.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// "007" and "7" name the same account; non-numeric ids are kept verbatim.
fn normalize_numeric_text(s: &str) -> String {
    match s.parse::<u64>() {
        Ok(n) => n.to_string(),
        Err(_) => s.to_string(),
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => {
                if let Some(v) = n.as_u64() {
                    Ok(Self::from(v))
                } else if let Some(v) = n.as_i64() {
                    Ok(Self(v.to_string()))
                } else {
                    Err(serde::de::Error::custom(format!("non-integer account id: {}", n)))
                }
            }
            Value::String(s) if !s.trim().is_empty() => Ok(Self::new(&s)),
            other => Err(serde::de::Error::custom(format!("invalid account id: {}", other))),
        }
    }
}

/// Account reference embedded in transfers and transactions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRef {
    #[serde(default)]
    pub id: Option<AccountId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(default, rename = "ownerID")]
    pub owner_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
}

/// Account row as returned by `GET /accounts/user/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub id: AccountId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtype: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency_type: String,
}

/// Read-only account projection shown in the overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub subtype: String,
    /// Masked number, `**** 1234`
    pub number: String,
    /// Server balance followed by its currency code
    pub balance: String,
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Self {
            number: mask_account_number(&raw.account_number),
            balance: format!("{} {}", raw.balance, raw.currency_type),
            id: raw.id,
            subtype: raw.subtype,
        }
    }
}

pub fn mask_account_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("**** {}", tail)
}

/// Transaction row as returned by `GET /transactions/{accountId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default, rename = "toAccountId", deserialize_with = "null_as_default")]
    pub to_account: AccountRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: Currency,
    #[serde(default, with = "lenient_millis")]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn sign(&self) -> char {
        match self {
            Self::Incoming => '+',
            Self::Outgoing => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub receiver_account: String,
    pub amount: Decimal,
    pub currency: String,
    pub direction: Direction,
    pub timestamp: Option<i64>,
}

impl Transaction {
    /// Build a history row as seen from `selected`; money sent into the
    /// selected account is incoming, everything else outgoing.
    pub fn from_raw(raw: RawTransaction, selected: &AccountId) -> Self {
        let direction = match &raw.to_account.id {
            Some(id) if id == selected => Direction::Incoming,
            _ => Direction::Outgoing,
        };
        Self {
            receiver_account: raw.to_account.account_number,
            amount: raw.amount,
            currency: raw.currency.code,
            direction,
            timestamp: raw.timestamp,
        }
    }
}
