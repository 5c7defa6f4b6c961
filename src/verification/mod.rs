//! Transfer verification flow
//!
//! Submit a payment, watch its one-time code count down, and confirm it
//! before the code expires.

pub mod countdown;
pub mod initiator;
pub mod poller;
pub mod verifier;
pub mod view;

pub use countdown::{format_remaining, remaining_ms, CodeState, CodeTracker, OTP_TTL_MS};
pub use initiator::{FormError, PaymentForm, PendingCode, SubmitError, TransferInitiator};
pub use poller::{ConfirmationPoller, PollerConfig, PollerHandle};
pub use verifier::{OtpVerifier, VerifyError};
pub use view::{
    format_timestamp, TransferRow, VerificationSnapshot, Viewer, CURRENCY_EXCHANGE_DESCRIPTION,
};
