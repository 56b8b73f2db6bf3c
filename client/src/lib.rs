pub mod admin;
pub mod auth;
pub mod client;
pub mod config;
pub mod deposit;
pub mod game;
pub mod notify;
pub mod poller;
pub mod profile;
pub mod scratch;
pub mod session;
#[cfg(test)]
mod testing;

pub use auth::RegistrationForm;
pub use client::{Client, Limits, RetryPolicy};
pub use config::Config;
pub use deposit::{Countdown, PaymentFlow, PaymentOutcome, PAYMENT_TTL};
pub use notify::{Level, Notice, Notifications};
pub use poller::BalancePoller;
pub use scratch::{Grid, RevealState, ScratchTicket, Symbol};
pub use session::{Session, SessionStore};

use raspadinha_types::Amount;
use thiserror::Error;

/// Message shown when a failure carries no server-provided text.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0} (expected http or https)")]
    InvalidScheme(String),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("failed: {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("request unsuccessful: {0}")]
    Api(String),
    #[error("request unsuccessful")]
    Unsuccessful,
    #[error("response carried no data")]
    MissingData,
    #[error("not logged in")]
    NotAuthenticated,
    #[error("amount {got} is below the minimum of {minimum}")]
    BelowMinimum { minimum: Amount, got: Amount },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl Error {
    /// Message to show the user for this failure.
    ///
    /// Server messages are passed through verbatim; transport and decoding
    /// failures collapse to [`FALLBACK_MESSAGE`].
    pub fn user_message(&self) -> String {
        match self {
            Error::Rejected { message, .. } | Error::Api(message) => message.clone(),
            Error::NotAuthenticated => "Please log in to continue.".to_string(),
            Error::BelowMinimum { minimum, .. } => format!("The minimum amount is {minimum}."),
            Error::PasswordMismatch => "Passwords do not match.".to_string(),
            Error::InvalidField { field, reason } => format!("Invalid {field}: {reason}."),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// True when the failure was decided locally, before any request left.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::NotAuthenticated
                | Error::BelowMinimum { .. }
                | Error::PasswordMismatch
                | Error::InvalidField { .. }
        )
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
