//! PIX deposits and the payment screen's expiry countdown.

use crate::{notify::Notifications, Client, Error, Result};
use raspadinha_types::{
    wallet::{CreateDepositRequest, PaymentIntent, PaymentMethod, UnprocessedDeposits},
    Amount,
};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long a PIX code stays payable on screen.
pub const PAYMENT_TTL: Duration = Duration::from_secs(15 * 60);

impl Client {
    /// Create a PIX payment intent for `amount`.
    ///
    /// Amounts below the configured minimum and missing sessions are rejected
    /// without touching the network.
    pub async fn create_deposit(&self, amount: Amount) -> Result<PaymentIntent> {
        self.check_deposit_amount(amount)?;
        let request = CreateDepositRequest {
            amount,
            payment_method: PaymentMethod::Pix,
        };
        let intent: PaymentIntent = self.post("deposits/create", &request).await?;
        info!(deposit = %intent.id, amount = %intent.amount, "created PIX deposit");
        Ok(intent)
    }

    /// Create a deposit and open its payment screen.
    ///
    /// The profile is re-fetched first so the flow measures the payment
    /// against the current balance rather than a cached one.
    pub async fn start_deposit(
        &self,
        amount: Amount,
        ttl: Duration,
        notifications: Notifications,
    ) -> Result<PaymentFlow> {
        self.check_deposit_amount(amount)?;
        let baseline = self.refresh_profile().await?.balance;
        let intent = self.create_deposit(amount).await?;
        Ok(PaymentFlow::open(intent, baseline, ttl, notifications))
    }

    fn check_deposit_amount(&self, amount: Amount) -> Result<()> {
        if self.session().token().is_none() {
            return Err(Error::NotAuthenticated);
        }
        let minimum = self.limits().min_deposit;
        if amount < minimum {
            return Err(Error::BelowMinimum {
                minimum,
                got: amount,
            });
        }
        Ok(())
    }

    /// Ask the backend to credit deposits the gateway has confirmed.
    ///
    /// Idempotent from the client's side.
    pub async fn check_unprocessed_deposits(&self) -> Result<UnprocessedDeposits> {
        let result: UnprocessedDeposits = self
            .post("deposits/check-unprocessed", &serde_json::json!({}))
            .await?;
        if result.processed > 0 {
            debug!(processed = result.processed, credited = %result.credited, "deposits credited");
        }
        Ok(result)
    }
}

/// Local countdown; not a request timeout.
#[derive(Clone, Copy, Debug)]
pub struct Countdown {
    deadline: Instant,
}

impl Countdown {
    pub fn start(ttl: Duration) -> Self {
        Self {
            deadline: Instant::now() + ttl,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Remaining time as `MM:SS`, rounded up to the next whole second.
    pub fn display(&self) -> String {
        format_clock(self.remaining())
    }

    pub async fn expired(&self) {
        tokio::time::sleep_until(self.deadline).await;
    }
}

fn format_clock(remaining: Duration) -> String {
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs += 1;
    }
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The polled balance rose by at least the deposit amount while the code
    /// was on screen.
    Paid { balance: Amount },
    Expired,
    Cancelled,
}

/// An open payment screen: the PIX code plus its countdown.
pub struct PaymentFlow {
    intent: PaymentIntent,
    baseline: Amount,
    countdown: Countdown,
    notifications: Notifications,
}

impl PaymentFlow {
    /// `baseline` must be a freshly fetched balance; the payment counts as
    /// seen once the balance reaches `baseline + intent.amount`.
    pub fn open(
        intent: PaymentIntent,
        baseline: Amount,
        ttl: Duration,
        notifications: Notifications,
    ) -> Self {
        Self {
            intent,
            baseline,
            countdown: Countdown::start(ttl),
            notifications,
        }
    }

    pub fn intent(&self) -> &PaymentIntent {
        &self.intent
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn baseline(&self) -> Amount {
        self.baseline
    }

    /// Balance at which the deposit is considered credited.
    pub fn target(&self) -> Amount {
        self.baseline + self.intent.amount
    }

    /// Wait until the payment shows up in the balance, the code expires, or
    /// `cancel` resolves. Consumes the flow, so each outcome is notified once.
    ///
    /// Only values published after the call are considered; whatever the
    /// receiver held before may predate the baseline.
    pub async fn monitor(
        self,
        mut balance: watch::Receiver<Option<Amount>>,
        cancel: impl Future<Output = ()>,
    ) -> PaymentOutcome {
        balance.borrow_and_update();
        let target = self.target();
        let mut balance_open = true;
        tokio::pin!(cancel);

        loop {
            tokio::select! {
                _ = self.countdown.expired() => {
                    info!(deposit = %self.intent.id, "PIX code expired");
                    self.notifications
                        .error("The PIX code expired. Please start a new deposit.");
                    return PaymentOutcome::Expired;
                }
                _ = &mut cancel => {
                    return PaymentOutcome::Cancelled;
                }
                changed = balance.changed(), if balance_open => {
                    if changed.is_err() {
                        // Poller gone; only the countdown can close the flow now
                        balance_open = false;
                        continue;
                    }
                    let current = *balance.borrow_and_update();
                    if let Some(current) = current {
                        if current >= target {
                            self.notifications
                                .success(format!("Deposit of {} confirmed!", self.intent.amount));
                            return PaymentOutcome::Paid { balance: current };
                        }
                        debug!(%current, %target, "balance moved without the deposit");
                    }
                }
            }
        }
    }
}
