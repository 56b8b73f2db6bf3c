//! Affiliate program and prize inventory.

use crate::{Amount, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub name: String,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub deposited: Amount,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateStats {
    pub invite_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<String>,
    #[serde(default)]
    pub total_referrals: u32,
    #[serde(default)]
    pub total_commission: Amount,
    #[serde(default)]
    pub available_commission: Amount,
    /// Commission rate in percent as configured by the backend.
    #[serde(default)]
    pub commission_rate: f64,
    #[serde(default)]
    pub referrals: Vec<Referral>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Requested,
    Shipped,
    Delivered,
}

/// A won product prize awaiting redemption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Id,
    pub prize_name: String,
    pub prize_value: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub status: RedemptionStatus,
    pub won_at: DateTime<Utc>,
}

/// Delivery details sent when redeeming an inventory item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
