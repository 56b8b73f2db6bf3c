use crate::{Client, Error, Result};
use raspadinha_types::{
    account::{AffiliateStats, InventoryItem, RedeemRequest},
    scratch::GameRecord,
    wallet::{PixKeyType, Transaction, Withdrawal, WithdrawalRequest},
    Amount, Id,
};
use tracing::info;

impl Client {
    /// Financial history, newest first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>> {
        self.get("user/transactions").await
    }

    pub async fn game_history(&self) -> Result<Vec<GameRecord>> {
        self.get("user/games").await
    }

    pub async fn withdrawals(&self) -> Result<Vec<Withdrawal>> {
        self.get("withdrawals").await
    }

    /// Request a PIX payout. Amount and key are checked locally first.
    pub async fn request_withdrawal(
        &self,
        amount: Amount,
        pix_key: &str,
        pix_key_type: PixKeyType,
    ) -> Result<Withdrawal> {
        let minimum = self.limits().min_withdrawal;
        if !amount.is_positive() || amount < minimum {
            return Err(Error::BelowMinimum {
                minimum,
                got: amount,
            });
        }
        let pix_key = pix_key.trim();
        if pix_key.is_empty() {
            return Err(Error::InvalidField {
                field: "PIX key",
                reason: "must not be empty".to_string(),
            });
        }
        let request = WithdrawalRequest {
            amount,
            pix_key: pix_key.to_string(),
            pix_key_type,
        };
        let withdrawal: Withdrawal = self.post("withdrawals", &request).await?;
        info!(withdrawal = %withdrawal.id, amount = %withdrawal.amount, "requested withdrawal");
        Ok(withdrawal)
    }

    pub async fn affiliate_stats(&self) -> Result<AffiliateStats> {
        self.get("affiliates/stats").await
    }

    /// Won product prizes waiting to be redeemed.
    pub async fn inventory(&self) -> Result<Vec<InventoryItem>> {
        self.get("inventory").await
    }

    pub async fn redeem(&self, item_id: &Id, address: Option<String>) -> Result<InventoryItem> {
        self.post(&format!("inventory/{item_id}/redeem"), &RedeemRequest { address })
            .await
    }
}
