use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use raspadinha_types::{Amount, Envelope, Id};
use thiserror::Error;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

mod api;
pub use api::Api;

mod state;
pub use state::{Outcome, SimulatorConfig, State};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account disabled")]
    AccountDisabled,
    #[error("Email already registered")]
    EmailTaken,
    #[error("Authentication required")]
    Unauthorized,
    #[error("Admin access required")]
    Forbidden,
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Minimum deposit is {0}")]
    MinimumDeposit(Amount),
    #[error("Minimum withdrawal is {0}")]
    MinimumWithdrawal(Amount),
    #[error("Card not found")]
    CardNotFound,
    #[error("Card is not on sale")]
    CardInactive,
    #[error("User not found")]
    UserNotFound,
    #[error("Deposit not found")]
    DepositNotFound,
    #[error("Withdrawal not found")]
    WithdrawalNotFound,
    #[error("Withdrawal already reviewed")]
    AlreadyReviewed,
    #[error("Item not found")]
    ItemNotFound,
    #[error("Item already redeemed")]
    AlreadyRedeemed,
    #[error("{0}")]
    BadRequest(String),
    #[error("Platform under maintenance")]
    Maintenance,
}

impl SimError {
    pub fn status(&self) -> StatusCode {
        match self {
            SimError::InvalidCredentials | SimError::Unauthorized => StatusCode::UNAUTHORIZED,
            SimError::AccountDisabled | SimError::Forbidden => StatusCode::FORBIDDEN,
            SimError::EmailTaken | SimError::AlreadyReviewed | SimError::AlreadyRedeemed => {
                StatusCode::CONFLICT
            }
            SimError::CardNotFound
            | SimError::UserNotFound
            | SimError::DepositNotFound
            | SimError::WithdrawalNotFound
            | SimError::ItemNotFound => StatusCode::NOT_FOUND,
            SimError::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            SimError::InsufficientBalance
            | SimError::MinimumDeposit(_)
            | SimError::MinimumWithdrawal(_)
            | SimError::CardInactive
            | SimError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(Envelope::<()>::error(self.to_string()))).into_response()
    }
}

/// In-memory stand-in for the platform backend.
pub struct Simulator {
    config: SimulatorConfig,
    state: RwLock<State>,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let state = RwLock::new(State::new(&config));
        Self { config, state }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().await
    }

    /// Add funds to a wallet without going through a deposit.
    pub async fn credit(&self, user_id: &Id, amount: Amount) -> Result<Amount, SimError> {
        self.write().await.credit(user_id, amount)
    }

    /// Simulate the payment gateway confirming a PIX charge.
    pub async fn mark_paid(&self, deposit_id: &Id) -> Result<(), SimError> {
        self.write().await.mark_paid(deposit_id)
    }

    pub async fn deposit_count(&self) -> usize {
        self.read().await.deposit_count()
    }

    /// Force the result of the next play (FIFO).
    pub async fn queue_outcome(&self, outcome: Outcome) {
        self.write().await.queue_outcome(outcome);
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}
