//! What the verification screen shows: which transfers, in what order, and
//! how each one reads.

use chrono::{DateTime, Local};
use std::cmp::Reverse;
use std::fmt;

use crate::models::{AccountId, Transfer, TransferId};
use crate::verification::countdown::CodeTracker;

/// Payment description the backend puts on currency-exchange fee transfers
pub const CURRENCY_EXCHANGE_DESCRIPTION: &str = "Promena valute";

/// Drop transfers whose payment description equals `excluded`.
pub fn filter_verifiable(transfers: Vec<Transfer>, excluded: &str) -> Vec<Transfer> {
    transfers
        .into_iter()
        .filter(|t| t.payment_description.as_deref() != Some(excluded))
        .collect()
}

/// PENDING first, then newest first. Transfers without a creation time go
/// last within their group.
pub fn sort_for_display(transfers: &mut [Transfer]) {
    transfers.sort_by_key(|t| (!t.is_pending(), Reverse(t.created_at)));
}

/// Filter then sort; the full recompute applied to every fresh snapshot.
pub fn prepare(transfers: Vec<Transfer>, excluded: &str) -> Vec<Transfer> {
    let mut visible = filter_verifiable(transfers, excluded);
    sort_for_display(&mut visible);
    visible
}

/// The logged-in user, for naming transfers sent to their own accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: AccountId,
    pub full_name: String,
}

/// Receiver name if the backend has one; the viewer's own name when the money
/// went to one of their accounts; otherwise the destination account number.
pub fn display_receiver(transfer: &Transfer, viewer: Option<&Viewer>) -> String {
    if let Some(name) = transfer.receiver.as_deref().filter(|r| !r.trim().is_empty()) {
        return name.to_string();
    }
    let to_account = transfer.to_account.as_ref();
    if let (Some(viewer), Some(owner)) = (viewer, to_account.and_then(|a| a.owner_id.as_ref())) {
        if *owner == viewer.user_id {
            return viewer.full_name.clone();
        }
    }
    to_account
        .map(|a| a.account_number.clone())
        .unwrap_or_default()
}

/// One rendered transfer card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRow {
    pub id: TransferId,
    pub status: String,
    pub pending: bool,
    pub created_at: Option<i64>,
    pub receiver: String,
    pub account_number: String,
    pub address: Option<String>,
    pub amount: String,
    /// Shown only while the code can still be redeemed
    pub code: Option<String>,
    pub countdown: Option<String>,
}

impl TransferRow {
    pub fn render(
        transfer: &Transfer,
        tracker: &CodeTracker,
        now: i64,
        viewer: Option<&Viewer>,
    ) -> Self {
        let state = tracker.state(transfer, now);
        let code = if state.is_redeemable() {
            transfer.code().map(str::to_uppercase)
        } else {
            None
        };

        Self {
            id: transfer.id,
            status: transfer.status.as_str().to_uppercase(),
            pending: transfer.is_pending(),
            created_at: transfer.created_at,
            receiver: display_receiver(transfer, viewer),
            account_number: transfer
                .to_account
                .as_ref()
                .map(|a| a.account_number.clone())
                .unwrap_or_default(),
            address: transfer.address.clone().filter(|a| !a.is_empty()),
            amount: format!("{} {}", transfer.amount, transfer.currency_code())
                .trim_end()
                .to_string(),
            code,
            countdown: state.label(),
        }
    }
}

/// Local wall-clock rendering of an epoch-millisecond timestamp
pub fn format_timestamp(ms: Option<i64>) -> String {
    ms.and_then(DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for TransferRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:<6} {:<10} {}  {} -> {} ({})",
            self.id,
            self.status,
            format_timestamp(self.created_at),
            self.amount,
            self.receiver,
            self.account_number
        )?;
        if let Some(address) = &self.address {
            write!(f, ", {}", address)?;
        }
        match (&self.code, &self.countdown) {
            (Some(code), Some(countdown)) => write!(f, "  code {} ({})", code, countdown),
            (None, Some(countdown)) => write!(f, "  {}", countdown),
            _ => Ok(()),
        }
    }
}

/// Everything the verification screen needs for one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationSnapshot {
    pub rows: Vec<TransferRow>,
    pub refreshing: bool,
    pub taken_at: i64,
}

impl VerificationSnapshot {
    pub fn build(
        transfers: &[Transfer],
        tracker: &CodeTracker,
        now: i64,
        viewer: Option<&Viewer>,
        refreshing: bool,
    ) -> Self {
        Self {
            rows: transfers
                .iter()
                .map(|t| TransferRow::render(t, tracker, now, viewer))
                .collect(),
            refreshing,
            taken_at: now,
        }
    }

    pub fn pending_ids(&self) -> Vec<TransferId> {
        self.rows
            .iter()
            .filter(|r| r.pending)
            .map(|r| r.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountRef, Currency, TransferStatus};
    use rust_decimal::Decimal;

    fn transfer(id: i64, status: TransferStatus, created_at: Option<i64>) -> Transfer {
        let mut t = Transfer::new(TransferId::new(id), status);
        t.created_at = created_at;
        t
    }

    fn ids(transfers: &[Transfer]) -> Vec<i64> {
        transfers.iter().map(|t| t.id.as_i64()).collect()
    }

    #[test]
    fn test_sort_pending_first_then_newest() {
        // A(COMPLETED, 100), B(PENDING, 50), C(PENDING, 200) -> [C, B, A]
        let mut list = vec![
            transfer(1, TransferStatus::Completed, Some(100)),
            transfer(2, TransferStatus::Pending, Some(50)),
            transfer(3, TransferStatus::Pending, Some(200)),
        ];
        sort_for_display(&mut list);
        assert_eq!(ids(&list), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_other_statuses_and_missing_created_at() {
        let mut list = vec![
            transfer(1, TransferStatus::Other("FAILED".into()), Some(500)),
            transfer(2, TransferStatus::Completed, Some(600)),
            transfer(3, TransferStatus::Pending, None),
            transfer(4, TransferStatus::Pending, Some(10)),
        ];
        sort_for_display(&mut list);
        assert_eq!(ids(&list), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_filter_currency_exchange() {
        let mut fee = transfer(1, TransferStatus::Completed, Some(1));
        fee.payment_description = Some(CURRENCY_EXCHANGE_DESCRIPTION.to_string());
        let mut rent = transfer(2, TransferStatus::Pending, Some(2));
        rent.payment_description = Some("Rent".to_string());

        let visible = filter_verifiable(vec![fee, rent.clone()], CURRENCY_EXCHANGE_DESCRIPTION);
        assert_eq!(visible, vec![rent]);
    }

    #[test]
    fn test_display_receiver_rules() {
        let viewer = Viewer {
            user_id: AccountId::from(9),
            full_name: "Ana Jovic".to_string(),
        };
        let mut t = transfer(1, TransferStatus::Pending, Some(1));
        t.to_account = Some(AccountRef {
            id: Some(AccountId::from(2)),
            account_number: "265-22".to_string(),
            owner_id: Some(AccountId::new("9")),
        });

        assert_eq!(display_receiver(&t, Some(&viewer)), "Ana Jovic");
        assert_eq!(display_receiver(&t, None), "265-22");

        t.receiver = Some("Petar".to_string());
        assert_eq!(display_receiver(&t, Some(&viewer)), "Petar");

        t.receiver = Some(String::new());
        t.to_account.as_mut().unwrap().owner_id = Some(AccountId::from(10));
        assert_eq!(display_receiver(&t, Some(&viewer)), "265-22");
    }

    #[test]
    fn test_row_hides_code_unless_redeemable() {
        let tracker = CodeTracker::default();
        let mut t = transfer(5, TransferStatus::Pending, Some(0));
        t.otp = Some("ab12cd".to_string());
        t.amount = Decimal::new(2500, 2);
        t.from_currency = Some(Currency {
            code: "EUR".to_string(),
        });

        let active = TransferRow::render(&t, &tracker, 60_000, None);
        assert_eq!(active.code.as_deref(), Some("AB12CD"));
        assert_eq!(active.countdown.as_deref(), Some("4:00"));
        assert_eq!(active.amount, "25.00 EUR");
        assert_eq!(active.status, "PENDING");
        assert!(active.to_string().ends_with("code AB12CD (4:00)"));

        let expired = TransferRow::render(&t, &tracker, 300_000, None);
        assert_eq!(expired.code, None);
        assert_eq!(expired.countdown.as_deref(), Some("EXPIRED"));
        assert!(expired.to_string().ends_with("  EXPIRED"));
        assert!(!expired.to_string().contains("AB12CD"));

        t.status = TransferStatus::Completed;
        let done = TransferRow::render(&t, &tracker, 60_000, None);
        assert_eq!(done.code, None);
        assert_eq!(done.countdown, None);
    }

    #[test]
    fn test_snapshot_pending_ids() {
        let list = vec![
            transfer(1, TransferStatus::Pending, Some(2)),
            transfer(2, TransferStatus::Completed, Some(1)),
        ];
        let snapshot =
            VerificationSnapshot::build(&list, &CodeTracker::default(), 3, None, false);
        assert_eq!(snapshot.pending_ids(), vec![TransferId::new(1)]);
        assert_eq!(snapshot.taken_at, 3);
    }

    #[test]
    fn test_format_timestamp_missing() {
        assert_eq!(format_timestamp(None), "-");
        assert_ne!(format_timestamp(Some(0)), "-");
    }
}
