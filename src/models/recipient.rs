use serde::{Deserialize, Serialize};

use crate::models::account::AccountId;
use crate::models::serde_utils::null_as_default;

/// How many saved recipients the quick-pay strip shows
pub const FAST_RECIPIENT_COUNT: usize = 3;

/// A receiver the user has paid before
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipient {
    pub id: AccountId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub usage_count: Option<u64>,
}

impl SavedRecipient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Avatar letter, `?` when there is no first name
    pub fn initial(&self) -> char {
        self.first_name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

/// The `limit` most used recipients, most used first. A missing count is zero;
/// ties keep their original order.
pub fn most_used(mut recipients: Vec<SavedRecipient>, limit: usize) -> Vec<SavedRecipient> {
    recipients.sort_by(|a, b| b.usage_count.unwrap_or(0).cmp(&a.usage_count.unwrap_or(0)));
    recipients.truncate(limit);
    recipients
}
