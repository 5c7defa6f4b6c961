//! One-time code lifecycle
//!
//! A code is redeemable from the transfer's `createdAt` until
//! `createdAt + TTL` (exclusive). Everything here is a pure function of the
//! transfer and a clock reading, so it is recomputed on every tick instead of
//! being stored.

use crate::models::Transfer;

/// Validity window of a one-time code (5 minutes)
pub const OTP_TTL_MS: i64 = 5 * 60 * 1000;

pub const EXPIRED_LABEL: &str = "EXPIRED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    /// Nothing to show: not pending, no code, or no usable creation time
    Hidden,
    Active { remaining_ms: i64 },
    Expired,
}

impl CodeState {
    pub fn is_redeemable(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Countdown text, `None` when hidden
    pub fn label(&self) -> Option<String> {
        match self {
            Self::Hidden => None,
            Self::Active { remaining_ms } => Some(format_remaining(*remaining_ms)),
            Self::Expired => Some(EXPIRED_LABEL.to_string()),
        }
    }
}

/// `max(0, created_at + ttl - now)`
pub fn remaining_ms(created_at: i64, now: i64, ttl_ms: i64) -> i64 {
    created_at
        .saturating_add(ttl_ms)
        .saturating_sub(now)
        .max(0)
}

/// `m:ss`, or `EXPIRED` once nothing is left
pub fn format_remaining(ms: i64) -> String {
    if ms <= 0 {
        return EXPIRED_LABEL.to_string();
    }
    format!("{}:{:02}", ms / 60_000, (ms % 60_000) / 1000)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeTracker {
    ttl_ms: i64,
}

impl Default for CodeTracker {
    fn default() -> Self {
        Self { ttl_ms: OTP_TTL_MS }
    }
}

impl CodeTracker {
    pub fn new(ttl_ms: i64) -> Self {
        Self { ttl_ms }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Absolute instant after which the transfer's code is dead
    pub fn expires_at(&self, transfer: &Transfer) -> Option<i64> {
        transfer
            .created_at
            .map(|created| created.saturating_add(self.ttl_ms))
    }

    pub fn state(&self, transfer: &Transfer, now: i64) -> CodeState {
        // a status from the backend always wins over the local countdown
        if !transfer.is_pending() || transfer.code().is_none() {
            return CodeState::Hidden;
        }
        let Some(created_at) = transfer.created_at else {
            return CodeState::Hidden;
        };
        match remaining_ms(created_at, now, self.ttl_ms) {
            0 => CodeState::Expired,
            remaining_ms => CodeState::Active { remaining_ms },
        }
    }
}
