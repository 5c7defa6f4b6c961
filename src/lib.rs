pub mod accounts;
pub mod auth;
pub mod backend;
pub mod client;
pub mod clock;
pub mod configure;
pub mod error;
pub mod logger;
pub mod models;
pub mod user_service;
pub mod verification;
