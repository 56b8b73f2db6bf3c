//! Background balance refresh.
//!
//! One task owns the polling interval and fans balance changes out to any
//! number of subscribers, so screens never run their own timers.

use crate::{auth::BalanceChange, Client};
use raspadinha_types::Amount;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Handle to the polling task. Dropping it stops the task.
pub struct BalancePoller {
    balance: watch::Receiver<Option<Amount>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl BalancePoller {
    /// Start polling the profile every `interval`.
    ///
    /// When `check_deposits` is set, each tick first asks the backend to
    /// process pending deposits so PIX payments show up in the next fetch.
    /// Failures are logged and swallowed; the next tick tries again.
    pub fn spawn(client: Client, interval: Duration, check_deposits: bool) -> Self {
        let (tx, rx) = watch::channel(client.session().balance());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if client.session().token().is_none() {
                    trace!("not logged in; skipping balance poll");
                    continue;
                }
                if check_deposits {
                    if let Err(err) = client.check_unprocessed_deposits().await {
                        debug!(error = %err, "unprocessed deposit check failed");
                    }
                }
                let current = match client.refresh_balance().await {
                    Ok(BalanceChange::Unchanged(current)) => current,
                    Ok(BalanceChange::Changed { current, .. }) => current,
                    Err(err) => {
                        debug!(error = %err, "balance poll failed");
                        continue;
                    }
                };
                tx.send_if_modified(|published| {
                    if *published == Some(current) {
                        return false;
                    }
                    *published = Some(current);
                    true
                });
            }
        });
        Self {
            balance: rx,
            handle,
        }
    }

    /// Latest balance seen by the poller.
    pub fn balance(&self) -> Option<Amount> {
        *self.balance.borrow()
    }

    /// Subscribe to balance changes. Identical re-fetches do not notify.
    pub fn subscribe(&self) -> watch::Receiver<Option<Amount>> {
        self.balance.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_poller_publishes_only_changes() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("fabi@example.com").await;
        let user = client.session().user().unwrap();

        let poller = BalancePoller::spawn(client.clone(), Duration::from_millis(20), false);
        let mut balance = poller.subscribe();
        balance.borrow_and_update();
        assert_eq!(poller.balance(), Some(user.balance));

        // Several identical polls go by without a notification
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!balance.has_changed().unwrap());

        ctx.simulator
            .credit(&user.id, Amount::from_reais(12))
            .await
            .unwrap();
        timeout(Duration::from_secs(2), balance.changed())
            .await
            .expect("no balance update")
            .unwrap();
        let expected = user.balance + Amount::from_reais(12);
        assert_eq!(*balance.borrow_and_update(), Some(expected));
        assert_eq!(client.session().balance(), Some(expected));
    }

    #[tokio::test]
    async fn test_poller_swallows_errors() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("gabi@example.com").await;
        let poller = BalancePoller::spawn(client.clone(), Duration::from_millis(20), true);
        let before = poller.balance();

        // Kill the backend; polls now fail and must not disturb state
        drop(ctx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(poller.balance(), before);
        assert!(client.session().current().is_some());
    }

    #[tokio::test]
    async fn test_poller_credits_confirmed_deposit() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("hugo@example.com").await;
        let before = client.session().balance().unwrap();

        let intent = client.create_deposit(Amount::from_reais(25)).await.unwrap();
        ctx.simulator.mark_paid(&intent.id).await.unwrap();

        let poller = BalancePoller::spawn(client.clone(), Duration::from_millis(20), true);
        let mut balance = poller.subscribe();
        timeout(
            Duration::from_secs(2),
            balance.wait_for(|value| *value == Some(before + Amount::from_reais(25))),
        )
        .await
        .expect("deposit never credited")
        .unwrap();
    }
}
