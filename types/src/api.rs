use crate::{Amount, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope wrapping every API response.
///
/// `success == false` carries a human readable `message` that is shown to the
/// user verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Profile of the logged-in user, as returned by login and profile fetches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Id,
    #[serde(alias = "username")]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub bonus_balance: Amount,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Payload returned by successful login and registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration body in the backend's field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub cpf: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_has_no_data() {
        let raw = r#"{"success":false,"message":"Email já cadastrado"}"#;
        let envelope: Envelope<AuthPayload> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Email já cadastrado"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_without_data_for_non_default_payload() {
        fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Envelope<T> {
            serde_json::from_str(raw).unwrap()
        }

        let envelope: Envelope<UserProfile> = decode(r#"{"success":true,"message":"ok"}"#);
        assert!(envelope.success);
        assert!(envelope.data.is_none());

        let envelope: Envelope<Vec<u32>> = decode(r#"{"success":true,"data":[1,2]}"#);
        assert_eq!(envelope.data, Some(vec![1, 2]));
    }

    #[test]
    fn test_profile_tolerates_sparse_payload() {
        let raw = r#"{"id":7,"username":"ana","email":"ana@example.com","balance":"12.30"}"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.id, Id::from(7));
        assert_eq!(profile.name, "ana");
        assert_eq!(profile.balance, Amount::from_centavos(1230));
        assert_eq!(profile.role, Role::User);
        assert!(profile.is_active);
        assert!(!profile.is_admin());
    }
}
