//! Shared fixtures for client tests.

use crate::{Client, RegistrationForm};
use axum::Router;
use raspadinha_simulator::{Api, Simulator, SimulatorConfig};
use raspadinha_types::{Amount, Id, Role, UserProfile};
use std::{net::SocketAddr, sync::Arc};
use tokio::time::{sleep, Duration};

pub(crate) struct TestContext {
    pub simulator: Arc<Simulator>,
    pub base_url: String,
    server_handle: tokio::task::JoinHandle<()>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(SimulatorConfig::default()).await
    }

    pub async fn with_config(config: SimulatorConfig) -> Self {
        let simulator = Arc::new(Simulator::new(config));
        let router = Api::new(simulator.clone()).router();
        let (base_url, server_handle) = serve_router(router).await;
        Self {
            simulator,
            base_url,
            server_handle,
        }
    }

    pub fn create_client(&self) -> Client {
        Client::new(&self.base_url).unwrap()
    }

    /// Client already logged in as a freshly registered player.
    pub async fn logged_in_client(&self, email: &str) -> Client {
        let client = self.create_client();
        client.register(registration(email)).await.unwrap();
        client
    }

    /// Client logged in as the seeded administrator.
    pub async fn admin_client(&self) -> Client {
        let client = self.create_client();
        let config = self.simulator.config();
        client
            .login(&config.admin_email, &config.admin_password)
            .await
            .unwrap();
        client
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub(crate) fn registration(email: &str) -> RegistrationForm {
    RegistrationForm {
        name: "Ana Souza".to_string(),
        email: email.to_string(),
        password: "segredo123".to_string(),
        confirm_password: "segredo123".to_string(),
        phone: "(11) 98765-4321".to_string(),
        document: "123.456.789-09".to_string(),
        invite_code: None,
    }
}

pub(crate) async fn serve_router(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let actual_addr = listener.local_addr().unwrap();
    let base_url = format!("http://{actual_addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });

    // Give server time to start
    sleep(Duration::from_millis(50)).await;
    (base_url, handle)
}

pub(crate) fn sample_user() -> UserProfile {
    UserProfile {
        id: Id::from(1),
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: None,
        cpf: None,
        balance: Amount::from_reais(50),
        bonus_balance: Amount::ZERO,
        role: Role::User,
        is_active: true,
        affiliate_code: None,
        created_at: None,
    }
}
