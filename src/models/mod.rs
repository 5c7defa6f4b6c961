pub use account::*;
pub use api_response::*;
pub use recipient::*;
pub use requests::*;
pub use transfer::*;

pub mod account;
pub mod api_response;
pub mod recipient;
pub mod requests;
pub mod serde_utils;
pub mod transfer;
