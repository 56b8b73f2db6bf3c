use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Simulator;

mod http;

/// Card images are the largest payloads the backend accepts.
const BODY_LIMIT_BYTES: usize = 5 * 1024 * 1024;

pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> Router {
        let player = Router::new()
            .route("/auth/login", post(http::login))
            .route("/auth/register", post(http::register))
            .route("/user/profile", get(http::profile))
            .route("/user/transactions", get(http::transactions))
            .route("/user/games", get(http::games))
            .route("/deposits/create", post(http::create_deposit))
            .route("/deposits/check-unprocessed", post(http::check_unprocessed))
            .route(
                "/withdrawals",
                get(http::list_withdrawals).post(http::request_withdrawal),
            )
            .route("/affiliates/stats", get(http::affiliate_stats))
            .route("/inventory", get(http::inventory))
            .route("/inventory/:id/redeem", post(http::redeem))
            .route("/scratch-cards", get(http::list_cards))
            .route("/scratch-cards/:id", get(http::get_card))
            .route("/scratch-cards/:id/play", post(http::play));

        let admin = Router::new()
            .route("/admin/dashboard", get(http::admin_dashboard))
            .route("/admin/users", get(http::admin_users))
            .route("/admin/users/:id", put(http::admin_update_user))
            .route("/admin/users/:id/status", patch(http::admin_user_status))
            .route("/admin/deposits", get(http::admin_deposits))
            .route("/admin/withdrawals", get(http::admin_withdrawals))
            .route("/admin/withdrawals/:id", patch(http::admin_decide_withdrawal))
            .route(
                "/admin/scratch-cards",
                get(http::admin_cards).post(http::admin_create_card),
            )
            .route(
                "/admin/scratch-cards/:id",
                put(http::admin_update_card).delete(http::admin_delete_card),
            )
            .route(
                "/admin/settings",
                get(http::admin_settings).put(http::admin_update_settings),
            );

        // Not part of the platform API: liveness and a stand-in for the PIX gateway
        let local = Router::new()
            .route("/healthz", get(http::healthz))
            .route("/deposits/:id/confirm", post(http::confirm_deposit));

        Router::new()
            .merge(player)
            .merge(admin)
            .merge(local)
            .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
            .layer(middleware::from_fn(request_id_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(self.simulator.clone())
    }
}

async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(header::HeaderName::from_static("x-request-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let mut response = next.run(req).await;
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(
            header::HeaderName::from_static("x-request-id"),
            header_value,
        );
    }
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "http.request"
    );
    response
}
