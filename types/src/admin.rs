//! Admin console types.

use crate::{api::Role, Amount};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub active_users: u64,
    #[serde(default)]
    pub total_deposits: Amount,
    #[serde(default)]
    pub total_withdrawals: Amount,
    #[serde(default)]
    pub pending_withdrawals: u64,
    #[serde(default)]
    pub games_played: u64,
}

/// Partial user edit. Absent fields are left untouched by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.balance.is_none()
            && self.role.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusUpdate {
    pub is_active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalVerdict {
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDecision {
    pub status: WithdrawalVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Prize line of a card draft.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeDraft {
    pub name: String,
    pub value: Amount,
    #[serde(default)]
    pub kind: crate::scratch::PrizeKind,
}

/// Fields of a scratch card being created or edited.
///
/// On creation these travel as multipart text fields next to the image file;
/// `prizes` is sent as a JSON string field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScratchCardDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtp: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub prizes: Vec<PrizeDraft>,
}

fn default_active() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    pub min_deposit: Amount,
    pub min_withdrawal: Amount,
    /// Percent of referred deposits paid as commission.
    pub affiliate_commission_rate: f64,
    #[serde(default)]
    pub maintenance_mode: bool,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            min_deposit: Amount::from_reais(10),
            min_withdrawal: Amount::from_reais(20),
            affiliate_commission_rate: 10.0,
            maintenance_mode: false,
        }
    }
}
