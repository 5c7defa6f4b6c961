//! OTP verification call

use std::fmt;
use std::sync::Arc;

use crate::backend::BankingBackend;
use crate::clock::Clock;
use crate::error::BankingError;
use crate::models::{Transfer, TransferId};
use crate::verification::countdown::{CodeState, CodeTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    Unauthenticated,
    /// The local countdown says the code is gone (or was never shown)
    CodeUnavailable,
    /// Wrong code, expired server-side, or the backend/network failed
    Failed,
}

impl VerifyError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Please log in again.",
            Self::CodeUnavailable | Self::Failed => "Payment unsuccessful",
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for VerifyError {}

pub struct OtpVerifier {
    backend: Arc<dyn BankingBackend>,
    clock: Arc<dyn Clock>,
    tracker: CodeTracker,
}

impl OtpVerifier {
    pub fn new(backend: Arc<dyn BankingBackend>, clock: Arc<dyn Clock>, tracker: CodeTracker) -> Self {
        Self {
            backend,
            clock,
            tracker,
        }
    }

    /// Send `code` for `transfer_id`.
    ///
    /// Success changes nothing locally; the transfer leaves PENDING on the next
    /// refresh.
    pub async fn verify(&self, transfer_id: TransferId, code: &str) -> Result<(), VerifyError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(VerifyError::CodeUnavailable);
        }
        match self.backend.verify_otp(transfer_id, code).await {
            Ok(()) => Ok(()),
            Err(BankingError::Unauthenticated) => Err(VerifyError::Unauthenticated),
            Err(e) => {
                log::warn!("Verification of transfer {} failed: {}", transfer_id, e);
                Err(VerifyError::Failed)
            }
        }
    }

    /// Verify a transfer with its own code, refusing locally once the
    /// countdown has run out even if the backend still reports PENDING.
    pub async fn confirm(&self, transfer: &Transfer) -> Result<(), VerifyError> {
        let now = self.clock.now_ms();
        match self.tracker.state(transfer, now) {
            CodeState::Active { .. } => {}
            state => {
                log::info!("Transfer {} code not redeemable ({:?})", transfer.id, state);
                return Err(VerifyError::CodeUnavailable);
            }
        }
        let code = transfer.code().ok_or(VerifyError::CodeUnavailable)?;
        self.verify(transfer.id, code).await
    }
}
