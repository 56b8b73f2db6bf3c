//! Scratch card catalogue and play results.

use crate::{Amount, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrizeKind {
    /// Credited to the wallet immediately.
    #[default]
    Cash,
    /// Physical item that must be redeemed from the inventory.
    Product,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: Id,
    pub name: String,
    pub value: Amount,
    #[serde(default)]
    pub kind: PrizeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScratchCard {
    pub id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prizes: Vec<Prize>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Backend odds parameter; informational on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtp: Option<f64>,
}

fn default_active() -> bool {
    true
}

impl ScratchCard {
    /// Highest prize value on the card, if it has any prizes.
    pub fn max_prize(&self) -> Option<Amount> {
        self.prizes.iter().map(|prize| prize.value).max()
    }
}

/// Outcome of a single play, decided by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResult {
    pub game_id: Id,
    pub is_winner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize: Option<Prize>,
    pub new_balance: Amount,
}

impl PlayResult {
    /// The winning prize, only when the play won.
    pub fn winning_prize(&self) -> Option<&Prize> {
        if self.is_winner {
            self.prize.as_ref()
        } else {
            None
        }
    }
}

/// Entry of the user's game history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: Id,
    pub card_id: Id,
    pub card_name: String,
    pub price: Amount,
    pub is_winner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_value: Option<Amount>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_losing_result_has_no_winning_prize() {
        let raw = r#"{"gameId":"g1","isWinner":false,"prize":{"id":"p1","name":"R$ 5","value":5},"newBalance":"95.00"}"#;
        let result: PlayResult = serde_json::from_str(raw).unwrap();
        assert!(result.winning_prize().is_none());
        assert_eq!(result.new_balance, Amount::from_reais(95));
    }

    #[test]
    fn test_max_prize() {
        let raw = r#"{"id":1,"name":"Sorte","price":1,"prizes":[
            {"id":"a","name":"A","value":2},
            {"id":"b","name":"B","value":500,"kind":"product"}
        ]}"#;
        let card: ScratchCard = serde_json::from_str(raw).unwrap();
        assert_eq!(card.max_prize(), Some(Amount::from_reais(500)));
        assert_eq!(card.prizes[1].kind, PrizeKind::Product);
        assert!(card.is_active);
    }
}
