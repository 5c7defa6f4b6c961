//! Backend adapters - the HTTP banking service and an in-memory stand-in

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpBankingBackend;
pub use mock::MockBackend;
pub use traits::BankingBackend;
