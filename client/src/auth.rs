use crate::{session::Session, Client, Error, Result};
use raspadinha_types::{Amount, AuthPayload, LoginRequest, RegisterRequest, UserProfile};
use tracing::{debug, info};

/// Registration form in the names the sign-up screen uses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    /// CPF, with or without punctuation.
    pub document: String,
    pub invite_code: Option<String>,
}

impl RegistrationForm {
    /// Validate locally and map onto the backend's field names.
    pub fn into_request(self) -> Result<RegisterRequest> {
        if self.password != self.confirm_password {
            return Err(Error::PasswordMismatch);
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        let email = self.email.trim().to_string();
        if !email.contains('@') {
            return Err(Error::InvalidField {
                field: "email",
                reason: "must be an email address".to_string(),
            });
        }
        let phone = digits(&self.phone);
        if !(10..=11).contains(&phone.len()) {
            return Err(Error::InvalidField {
                field: "phone",
                reason: "must have 10 or 11 digits".to_string(),
            });
        }
        let cpf = digits(&self.document);
        if cpf.len() != 11 {
            return Err(Error::InvalidField {
                field: "document",
                reason: "CPF must have 11 digits".to_string(),
            });
        }

        Ok(RegisterRequest {
            username: name,
            email,
            password: self.password,
            phone,
            cpf,
            invite_code: self
                .invite_code
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty()),
        })
    }
}

fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Result of re-fetching the profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceChange {
    Unchanged(Amount),
    Changed { previous: Option<Amount>, current: Amount },
}

impl Client {
    /// Log in and store the resulting session.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let payload: AuthPayload = self.post_public("auth/login", &request).await?;
        self.start_session(payload)
    }

    /// Register a new account and store the resulting session.
    ///
    /// Mismatched passwords and malformed fields fail before any request.
    pub async fn register(&self, form: RegistrationForm) -> Result<UserProfile> {
        let request = form.into_request()?;
        let payload: AuthPayload = self.post_public("auth/register", &request).await?;
        self.start_session(payload)
    }

    /// Drop the stored session. Subscribers observe the session cleared.
    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        info!("logged out");
        Ok(())
    }

    /// Fetch the profile of the logged-in user and cache it.
    pub async fn refresh_profile(&self) -> Result<UserProfile> {
        let profile: UserProfile = self.get("user/profile").await?;
        self.session().update_user(profile.clone())?;
        Ok(profile)
    }

    /// Fetch the profile and report whether the balance moved.
    pub async fn refresh_balance(&self) -> Result<BalanceChange> {
        let previous = self.session().balance();
        let profile = self.refresh_profile().await?;
        let current = profile.balance;
        if previous == Some(current) {
            return Ok(BalanceChange::Unchanged(current));
        }
        debug!(?previous, %current, "balance changed");
        Ok(BalanceChange::Changed { previous, current })
    }

    fn start_session(&self, payload: AuthPayload) -> Result<UserProfile> {
        let AuthPayload { user, token } = payload;
        if token.trim().is_empty() {
            return Err(Error::MissingData);
        }
        self.session().set(Session {
            user: user.clone(),
            token,
        })?;
        info!(user = %user.id, "session started");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registration, serve_router, TestContext};
    use crate::FALLBACK_MESSAGE;
    use axum::{
        extract::State as AxumState,
        http::StatusCode as AxumStatusCode,
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_registration_maps_fields() {
        let request = registration("ana@example.com").into_request().unwrap();
        assert_eq!(request.username, "Ana Souza");
        assert_eq!(request.phone, "11987654321");
        assert_eq!(request.cpf, "12345678909");
        assert!(request.invite_code.is_none());
    }

    #[test]
    fn test_registration_rejects_bad_fields() {
        let mut form = registration("ana@example.com");
        form.document = "123".to_string();
        assert!(matches!(
            form.into_request(),
            Err(Error::InvalidField { field: "document", .. })
        ));

        let mut form = registration("not-an-email");
        form.invite_code = Some("  ".to_string());
        assert!(matches!(
            form.into_request(),
            Err(Error::InvalidField { field: "email", .. })
        ));
    }

    #[tokio::test]
    async fn test_register_password_mismatch_sends_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/auth/register",
                post(|AxumState(counter): AxumState<Arc<AtomicUsize>>| async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"success": false}))
                }),
            )
            .with_state(counter.clone());
        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url).unwrap();

        let mut form = registration("ana@example.com");
        form.confirm_password = "outra".to_string();
        let err = client.register(form).await.unwrap_err();
        assert!(matches!(err, Error::PasswordMismatch));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(client.session().current().is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn test_login_persists_session_and_sends_bearer() {
        let ctx = TestContext::new().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let registered = ctx.logged_in_client("bia@example.com").await;
        registered.logout().unwrap();

        let client = ctx
            .create_client()
            .with_session(crate::SessionStore::persistent(&path));
        let user = client.login("bia@example.com", "segredo123").await.unwrap();
        assert_eq!(user.email, "bia@example.com");
        assert!(path.exists());

        // The profile endpoint only answers with a valid bearer token
        let profile = client.refresh_profile().await.unwrap();
        assert_eq!(profile.id, user.id);

        // A fresh process picks the session up from disk
        let restored = ctx
            .create_client()
            .with_session(crate::SessionStore::persistent(&path));
        assert_eq!(restored.refresh_profile().await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_state_unchanged() {
        let ctx = TestContext::new().await;
        ctx.logged_in_client("caio@example.com").await;

        let client = ctx.create_client();
        let err = client
            .login("caio@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(client.session().current().is_none());
    }

    #[tokio::test]
    async fn test_login_without_message_uses_fallback() {
        let router = Router::new().route(
            "/auth/login",
            post(|| async { (AxumStatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let (base_url, handle) = serve_router(router).await;
        let client = Client::new(&base_url).unwrap();

        let err = client.login("a@b.c", "x").await.unwrap_err();
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        assert!(client.session().current().is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("duda@example.com").await;
        let mut changes = client.session().subscribe();

        client.logout().unwrap();
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_none());
        assert!(matches!(
            client.refresh_profile().await,
            Err(Error::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_refresh_balance_detects_changes() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("edu@example.com").await;
        let user = client.session().user().unwrap();

        let change = client.refresh_balance().await.unwrap();
        assert_eq!(change, BalanceChange::Unchanged(user.balance));

        ctx.simulator
            .credit(&user.id, Amount::from_reais(30))
            .await
            .unwrap();
        let change = client.refresh_balance().await.unwrap();
        assert_eq!(
            change,
            BalanceChange::Changed {
                previous: Some(user.balance),
                current: user.balance + Amount::from_reais(30),
            }
        );
        assert_eq!(
            client.session().balance(),
            Some(user.balance + Amount::from_reais(30))
        );
    }
}
