use axum::{
    extract::{Multipart, Path, State as AxumState},
    http::{header, HeaderMap},
    Json,
};
use raspadinha_types::{
    account::{AffiliateStats, InventoryItem, RedeemRequest},
    admin::{
        DashboardStats, PlatformSettings, PrizeDraft, ScratchCardDraft, UserStatusUpdate,
        UserUpdate, WithdrawalDecision,
    },
    scratch::{GameRecord, PlayResult, ScratchCard},
    wallet::{
        CreateDepositRequest, Deposit, PaymentIntent, Transaction, UnprocessedDeposits,
        Withdrawal, WithdrawalRequest,
    },
    Amount, AuthPayload, Envelope, Id, LoginRequest, RegisterRequest, UserProfile,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::{SimError, Simulator};

type ApiResult<T> = Result<Json<Envelope<T>>, SimError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::ok(data)))
}

fn bearer(headers: &HeaderMap) -> Result<&str, SimError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(SimError::Unauthorized)
}

async fn player(simulator: &Simulator, headers: &HeaderMap) -> Result<Id, SimError> {
    let token = bearer(headers)?;
    simulator.read().await.authenticate(token)
}

async fn admin(simulator: &Simulator, headers: &HeaderMap) -> Result<Id, SimError> {
    let token = bearer(headers)?;
    simulator.read().await.authenticate_admin(token)
}

#[derive(Serialize)]
pub(super) struct HealthzResponse {
    ok: bool,
}

pub(super) async fn healthz() -> Json<HealthzResponse> {
    Json(HealthzResponse { ok: true })
}

pub(super) async fn login(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<AuthPayload> {
    let payload = simulator.write().await.login(request)?;
    info!(user = %payload.user.id, "login");
    Ok(Json(Envelope::ok_with_message(payload, "Login successful")))
}

pub(super) async fn register(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<AuthPayload> {
    let payload = simulator.write().await.register(request)?;
    Ok(Json(Envelope::ok_with_message(payload, "Account created")))
}

pub(super) async fn profile(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<UserProfile> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.profile(&user)?)
}

pub(super) async fn transactions(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Transaction>> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.transactions(&user))
}

pub(super) async fn games(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<GameRecord>> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.games(&user))
}

pub(super) async fn create_deposit(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<CreateDepositRequest>,
) -> ApiResult<PaymentIntent> {
    let user = player(&simulator, &headers).await?;
    let intent = simulator.write().await.create_deposit(&user, request)?;
    info!(user = %user, deposit = %intent.id, amount = %intent.amount, "deposit created");
    ok(intent)
}

pub(super) async fn check_unprocessed(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<UnprocessedDeposits> {
    let user = player(&simulator, &headers).await?;
    let result = simulator.write().await.check_unprocessed(&user)?;
    if result.processed > 0 {
        info!(user = %user, processed = result.processed, credited = %result.credited, "deposits credited");
    }
    ok(result)
}

/// Gateway callback stand-in: marks the charge as paid.
pub(super) async fn confirm_deposit(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(deposit_id): Path<String>,
) -> ApiResult<()> {
    simulator.write().await.mark_paid(&Id::new(deposit_id))?;
    Ok(Json(Envelope {
        success: true,
        message: Some("Payment confirmed".to_string()),
        data: None,
    }))
}

pub(super) async fn list_withdrawals(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Withdrawal>> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.withdrawals_of(&user))
}

pub(super) async fn request_withdrawal(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(request): Json<WithdrawalRequest>,
) -> ApiResult<Withdrawal> {
    let user = player(&simulator, &headers).await?;
    let withdrawal = simulator.write().await.request_withdrawal(&user, request)?;
    info!(user = %user, withdrawal = %withdrawal.id, amount = %withdrawal.amount, "withdrawal requested");
    ok(withdrawal)
}

pub(super) async fn affiliate_stats(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<AffiliateStats> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.affiliate_stats(&user)?)
}

pub(super) async fn inventory(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<InventoryItem>> {
    let user = player(&simulator, &headers).await?;
    ok(simulator.read().await.inventory(&user))
}

pub(super) async fn redeem(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    Json(request): Json<RedeemRequest>,
) -> ApiResult<InventoryItem> {
    let user = player(&simulator, &headers).await?;
    ok(simulator
        .write()
        .await
        .redeem(&user, &Id::new(item_id), request)?)
}

pub(super) async fn list_cards(
    AxumState(simulator): AxumState<Arc<Simulator>>,
) -> ApiResult<Vec<ScratchCard>> {
    ok(simulator.read().await.active_cards())
}

pub(super) async fn get_card(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Path(card_id): Path<String>,
) -> ApiResult<ScratchCard> {
    ok(simulator.read().await.card(&Id::new(card_id))?)
}

pub(super) async fn play(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(card_id): Path<String>,
) -> ApiResult<PlayResult> {
    let user = player(&simulator, &headers).await?;
    let result = simulator.write().await.play(&user, &Id::new(card_id))?;
    info!(user = %user, game = %result.game_id, winner = result.is_winner, "card played");
    ok(result)
}

pub(super) async fn admin_dashboard(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<DashboardStats> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.dashboard())
}

pub(super) async fn admin_users(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<UserProfile>> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.users())
}

pub(super) async fn admin_update_user(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<UserProfile> {
    admin(&simulator, &headers).await?;
    ok(simulator
        .write()
        .await
        .update_user(&Id::new(user_id), update)?)
}

pub(super) async fn admin_user_status(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(update): Json<UserStatusUpdate>,
) -> ApiResult<UserProfile> {
    admin(&simulator, &headers).await?;
    let user = simulator
        .write()
        .await
        .set_user_status(&Id::new(user_id), update.is_active)?;
    info!(user = %user.id, active = user.is_active, "user status changed");
    ok(user)
}

pub(super) async fn admin_deposits(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Deposit>> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.deposits())
}

pub(super) async fn admin_withdrawals(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<Withdrawal>> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.withdrawals())
}

pub(super) async fn admin_decide_withdrawal(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(withdrawal_id): Path<String>,
    Json(decision): Json<WithdrawalDecision>,
) -> ApiResult<Withdrawal> {
    admin(&simulator, &headers).await?;
    let withdrawal = simulator
        .write()
        .await
        .decide_withdrawal(&Id::new(withdrawal_id), decision)?;
    info!(withdrawal = %withdrawal.id, status = ?withdrawal.status, "withdrawal reviewed");
    ok(withdrawal)
}

pub(super) async fn admin_cards(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<Vec<ScratchCard>> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.all_cards())
}

/// Multipart card creation: text fields plus an optional `image` file.
pub(super) async fn admin_create_card(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<ScratchCard> {
    admin(&simulator, &headers).await?;
    let (draft, image_name) = read_card_form(multipart).await?;
    let card = simulator.write().await.create_card(draft, image_name)?;
    info!(card = %card.id, name = %card.name, "card created");
    ok(card)
}

async fn read_card_form(
    mut multipart: Multipart,
) -> Result<(ScratchCardDraft, Option<String>), SimError> {
    let bad = |reason: String| SimError::BadRequest(reason);

    let mut name = None;
    let mut description = None;
    let mut price = None;
    let mut rtp = None;
    let mut is_active = true;
    let mut prizes: Vec<PrizeDraft> = Vec::new();
    let mut image_name = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| bad(format!("invalid form: {err}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| bad(format!("invalid image: {err}")))?;
            if !bytes.is_empty() {
                image_name = file_name.or_else(|| Some("image".to_string()));
            }
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|err| bad(format!("invalid field {field_name}: {err}")))?;
        match field_name.as_str() {
            "name" => name = Some(value),
            "description" => description = Some(value).filter(|text| !text.trim().is_empty()),
            "price" => {
                price = Some(
                    value
                        .parse::<Amount>()
                        .map_err(|err| bad(format!("invalid price: {err}")))?,
                )
            }
            "rtp" => {
                rtp = Some(
                    value
                        .parse::<f64>()
                        .map_err(|err| bad(format!("invalid rtp: {err}")))?,
                )
            }
            "isActive" => is_active = value == "true",
            "prizes" => {
                prizes = serde_json::from_str(&value)
                    .map_err(|err| bad(format!("invalid prizes: {err}")))?
            }
            _ => {}
        }
    }

    let draft = ScratchCardDraft {
        name: name.ok_or_else(|| bad("card name is required".to_string()))?,
        description,
        price: price.ok_or_else(|| bad("card price is required".to_string()))?,
        rtp,
        is_active,
        prizes,
    };
    Ok((draft, image_name))
}

pub(super) async fn admin_update_card(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(card_id): Path<String>,
    Json(draft): Json<ScratchCardDraft>,
) -> ApiResult<ScratchCard> {
    admin(&simulator, &headers).await?;
    ok(simulator
        .write()
        .await
        .update_card(&Id::new(card_id), draft)?)
}

pub(super) async fn admin_delete_card(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Path(card_id): Path<String>,
) -> ApiResult<()> {
    admin(&simulator, &headers).await?;
    let card_id = Id::new(card_id);
    simulator.write().await.delete_card(&card_id)?;
    info!(card = %card_id, "card deleted");
    Ok(Json(Envelope {
        success: true,
        message: Some("Card deleted".to_string()),
        data: None,
    }))
}

pub(super) async fn admin_settings(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
) -> ApiResult<PlatformSettings> {
    admin(&simulator, &headers).await?;
    ok(simulator.read().await.settings())
}

pub(super) async fn admin_update_settings(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    headers: HeaderMap,
    Json(settings): Json<PlatformSettings>,
) -> ApiResult<PlatformSettings> {
    admin(&simulator, &headers).await?;
    let settings = simulator.write().await.update_settings(settings)?;
    info!(?settings, "settings updated");
    ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer(&headers), Err(SimError::Unauthorized)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(bearer(&headers), Err(SimError::Unauthorized)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer(&headers).unwrap(), "abc");
    }
}
