//! Deposits, withdrawals and the financial ledger as seen by the client.

use crate::{Amount, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment rail used for deposits. PIX is the only one offered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "PIX")]
    Pix,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepositRequest {
    pub amount: Amount,
    pub payment_method: PaymentMethod,
}

/// Payment descriptor returned when a deposit is created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: Id,
    pub amount: Amount,
    /// PIX "copia e cola" payload.
    #[serde(alias = "qrCode", alias = "copyPaste")]
    pub pix_code: String,
    /// Base64 image supplied by the gateway, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnprocessedDeposits {
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub credited: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositStatus {
    Pending,
    Paid,
    Expired,
    Failed,
}

/// Deposit record as listed in the admin console.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: Id,
    pub user_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub amount: Amount,
    pub status: DepositStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Bet,
    Prize,
    Commission,
    Bonus,
}

impl TransactionKind {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::Bet => "bet",
            TransactionKind::Prize => "prize",
            TransactionKind::Commission => "commission",
            TransactionKind::Bonus => "bonus",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

/// Entry of the user's financial history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Id,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Amount,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyType {
    Cpf,
    Email,
    Phone,
    Random,
}

impl fmt::Display for PixKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixKeyType::Cpf => "cpf",
            PixKeyType::Email => "email",
            PixKeyType::Phone => "phone",
            PixKeyType::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for PixKeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpf" => Ok(PixKeyType::Cpf),
            "email" => Ok(PixKeyType::Email),
            "phone" | "telefone" => Ok(PixKeyType::Phone),
            "random" | "aleatoria" | "evp" => Ok(PixKeyType::Random),
            other => Err(format!("unknown PIX key type: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub amount: Amount,
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub amount: Amount,
    pub pix_key: String,
    pub pix_key_type: PixKeyType,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_accepts_qr_code_alias() {
        let raw = r#"{"id":"dep_1","amount":25,"qrCode":"00020126...6304ABCD"}"#;
        let intent: PaymentIntent = serde_json::from_str(raw).unwrap();
        assert_eq!(intent.pix_code, "00020126...6304ABCD");
        assert_eq!(intent.amount, Amount::from_reais(25));
        assert!(intent.qr_code_image.is_none());
    }

    #[test]
    fn test_deposit_request_wire_shape() {
        let request = CreateDepositRequest {
            amount: Amount::from_centavos(2550),
            payment_method: PaymentMethod::Pix,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["paymentMethod"], "PIX");
        assert_eq!(json["amount"], 25.5);
    }

    #[test]
    fn test_pix_key_type_parsing() {
        assert_eq!("CPF".parse::<PixKeyType>().unwrap(), PixKeyType::Cpf);
        assert_eq!("evp".parse::<PixKeyType>().unwrap(), PixKeyType::Random);
        assert!("iban".parse::<PixKeyType>().is_err());
    }
}
