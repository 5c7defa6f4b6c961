//! User service: login, logout and the logged-in customer's profile

use std::sync::Arc;

use crate::auth::{current_user_id, TokenProvider, TokenStore};
use crate::client::{ApiClient, ClientConfig};
use crate::error::BankingError;
use crate::models::{AccountId, ApiResponse, Customer, LoginData, LoginRequest};
use crate::verification::Viewer;

pub const LOGIN_PATH: &str = "/api/auth/login";

pub struct UserService {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
}

impl UserService {
    pub fn new<S: TokenStore + 'static>(
        config: &ClientConfig,
        store: Arc<S>,
    ) -> Result<Self, BankingError> {
        let tokens: Arc<dyn TokenProvider> = store.clone();
        Ok(Self {
            api: ApiClient::new(config, tokens)?,
            store,
        })
    }

    /// Exchange credentials for a token and persist it
    pub async fn login(&self, email: &str, password: &str) -> Result<AccountId, BankingError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(BankingError::Validation(
                "email and password are required".to_string(),
            ));
        }

        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: ApiResponse<LoginData> =
            self.api.post_json_anonymous(LOGIN_PATH, &body).await?;
        let token = match response.data {
            Some(data) if response.success && !data.token.trim().is_empty() => data.token,
            _ => {
                return Err(BankingError::Rejected(
                    response
                        .message
                        .unwrap_or_else(|| "login refused".to_string()),
                ))
            }
        };

        self.store
            .save(token.trim())
            .map_err(|e| BankingError::Transport(format!("failed to store token: {}", e)))?;

        let user_id = self.current_user_id().ok_or(BankingError::Unauthenticated)?;
        log::info!("Logged in as user {}", user_id);
        Ok(user_id)
    }

    pub fn logout(&self) -> Result<(), BankingError> {
        self.store
            .clear()
            .map_err(|e| BankingError::Transport(format!("failed to remove token: {}", e)))?;
        log::info!("Logged out");
        Ok(())
    }

    pub fn current_user_id(&self) -> Option<AccountId> {
        current_user_id(self.api.tokens().as_ref())
    }

    pub async fn fetch_customer(&self, user_id: &AccountId) -> Result<Customer, BankingError> {
        let path = format!("/api/customer/{}", user_id);
        let response: ApiResponse<Customer> = self.api.get_json(&path).await?;
        response
            .data
            .ok_or_else(|| BankingError::Decode(format!("no customer data for user {}", user_id)))
    }

    /// The logged-in user as the verification view names them.
    ///
    /// `None` when logged out or when the profile cannot be loaded; receivers
    /// then fall back to account numbers.
    pub async fn viewer(&self) -> Option<Viewer> {
        let user_id = self.current_user_id()?;
        match self.fetch_customer(&user_id).await {
            Ok(customer) => Some(Viewer {
                full_name: customer.full_name(),
                user_id,
            }),
            Err(e) => {
                log::warn!("Failed to load profile for user {}: {}", user_id, e);
                None
            }
        }
    }
}
