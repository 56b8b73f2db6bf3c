//! Admin console calls. Authorization is enforced by the backend.

use crate::{Client, Error, Result};
use raspadinha_types::{
    admin::{
        DashboardStats, PlatformSettings, ScratchCardDraft, UserStatusUpdate, UserUpdate,
        WithdrawalDecision, WithdrawalVerdict,
    },
    scratch::ScratchCard,
    wallet::{Deposit, Withdrawal},
    Id, UserProfile,
};
use reqwest::{
    multipart::{Form, Part},
    Method,
};
use tracing::info;

/// Image uploaded alongside a new card.
#[derive(Clone, Debug)]
pub struct CardImage {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CardImage {
    /// Guess the mime type from the file extension.
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        };
        Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        }
    }
}

fn card_form(draft: &ScratchCardDraft, image: Option<CardImage>) -> Result<Form> {
    let mut form = Form::new()
        .text("name", draft.name.clone())
        .text("price", draft.price.to_decimal_string())
        .text("isActive", draft.is_active.to_string())
        .text("prizes", serde_json::to_string(&draft.prizes)?);
    if let Some(description) = &draft.description {
        form = form.text("description", description.clone());
    }
    if let Some(rtp) = draft.rtp {
        form = form.text("rtp", rtp.to_string());
    }
    if let Some(image) = image {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime)?;
        form = form.part("image", part);
    }
    Ok(form)
}

impl Client {
    pub async fn admin_dashboard(&self) -> Result<DashboardStats> {
        self.get("admin/dashboard").await
    }

    pub async fn admin_users(&self) -> Result<Vec<UserProfile>> {
        self.get("admin/users").await
    }

    pub async fn admin_update_user(&self, user_id: &Id, update: &UserUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(Error::InvalidField {
                field: "update",
                reason: "nothing to change".to_string(),
            });
        }
        let user: UserProfile = self.put(&format!("admin/users/{user_id}"), update).await?;
        info!(user = %user_id, "updated user");
        Ok(user)
    }

    /// Enable or disable an account.
    pub async fn admin_set_user_status(&self, user_id: &Id, is_active: bool) -> Result<UserProfile> {
        self.patch(
            &format!("admin/users/{user_id}/status"),
            &UserStatusUpdate { is_active },
        )
        .await
    }

    pub async fn admin_deposits(&self) -> Result<Vec<Deposit>> {
        self.get("admin/deposits").await
    }

    pub async fn admin_withdrawals(&self) -> Result<Vec<Withdrawal>> {
        self.get("admin/withdrawals").await
    }

    pub async fn admin_decide_withdrawal(
        &self,
        withdrawal_id: &Id,
        verdict: WithdrawalVerdict,
        reason: Option<String>,
    ) -> Result<Withdrawal> {
        self.patch(
            &format!("admin/withdrawals/{withdrawal_id}"),
            &WithdrawalDecision {
                status: verdict,
                reason,
            },
        )
        .await
    }

    /// All cards, including inactive ones.
    pub async fn admin_cards(&self) -> Result<Vec<ScratchCard>> {
        self.get("admin/scratch-cards").await
    }

    /// Create a card, uploading its image as multipart form data.
    pub async fn admin_create_card(
        &self,
        draft: &ScratchCardDraft,
        image: Option<CardImage>,
    ) -> Result<ScratchCard> {
        let form = card_form(draft, image)?;
        let card: ScratchCard = self.post_multipart("admin/scratch-cards", form).await?;
        info!(card = %card.id, name = %card.name, "created card");
        Ok(card)
    }

    pub async fn admin_update_card(&self, card_id: &Id, draft: &ScratchCardDraft) -> Result<ScratchCard> {
        self.put(&format!("admin/scratch-cards/{card_id}"), draft).await
    }

    pub async fn admin_delete_card(&self, card_id: &Id) -> Result<()> {
        self.call_unit::<()>(Method::DELETE, &format!("admin/scratch-cards/{card_id}"), None)
            .await
    }

    pub async fn admin_settings(&self) -> Result<PlatformSettings> {
        self.get("admin/settings").await
    }

    pub async fn admin_update_settings(&self, settings: &PlatformSettings) -> Result<PlatformSettings> {
        self.put("admin/settings", settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use raspadinha_types::{
        admin::PrizeDraft, scratch::PrizeKind, wallet::WithdrawalStatus, Amount,
    };
    use raspadinha_types::wallet::PixKeyType;

    fn draft() -> ScratchCardDraft {
        ScratchCardDraft {
            name: "Raspa Turbo".to_string(),
            description: Some("Prêmios de até R$ 1.000".to_string()),
            price: Amount::from_centavos(250),
            rtp: Some(85.0),
            is_active: true,
            prizes: vec![
                PrizeDraft {
                    name: "R$ 5".to_string(),
                    value: Amount::from_reais(5),
                    kind: PrizeKind::Cash,
                },
                PrizeDraft {
                    name: "R$ 1.000".to_string(),
                    value: Amount::from_reais(1000),
                    kind: PrizeKind::Cash,
                },
            ],
        }
    }

    #[test]
    fn test_card_image_mime() {
        assert_eq!(CardImage::from_file_name("capa.PNG", vec![]).mime, "image/png");
        assert_eq!(
            CardImage::from_file_name("capa", vec![]).mime,
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_players_cannot_use_admin_routes() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("sara@example.com").await;
        let err = client.admin_users().await.unwrap_err();
        assert_eq!(err.user_message(), "Admin access required");
        // Forbidden is not a session failure
        assert!(client.session().current().is_some());
    }

    #[tokio::test]
    async fn test_user_management() {
        let ctx = TestContext::new().await;
        let player = ctx.logged_in_client("tina@example.com").await;
        let player_id = player.session().user().unwrap().id;
        let admin = ctx.admin_client().await;

        let users = admin.admin_users().await.unwrap();
        assert!(users.iter().any(|user| user.id == player_id));

        let err = admin
            .admin_update_user(&player_id, &UserUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_local());

        let updated = admin
            .admin_update_user(
                &player_id,
                &UserUpdate {
                    name: Some("Tina Lima".to_string()),
                    balance: Some(Amount::from_reais(15)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Tina Lima");
        assert_eq!(updated.balance, Amount::from_reais(15));

        let disabled = admin.admin_set_user_status(&player_id, false).await.unwrap();
        assert!(!disabled.is_active);
        let err = ctx
            .create_client()
            .login("tina@example.com", "segredo123")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Account disabled");

        let stats = admin.admin_dashboard().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
    }

    #[tokio::test]
    async fn test_withdrawal_review() {
        let ctx = TestContext::new().await;
        let player = ctx.logged_in_client("uli@example.com").await;
        let player_id = player.session().user().unwrap().id;
        ctx.simulator
            .credit(&player_id, Amount::from_reais(100))
            .await
            .unwrap();
        let first = player
            .request_withdrawal(Amount::from_reais(30), "12345678909", PixKeyType::Cpf)
            .await
            .unwrap();
        let second = player
            .request_withdrawal(Amount::from_reais(20), "12345678909", PixKeyType::Cpf)
            .await
            .unwrap();

        let admin = ctx.admin_client().await;
        assert_eq!(admin.admin_withdrawals().await.unwrap().len(), 2);

        let approved = admin
            .admin_decide_withdrawal(&first.id, WithdrawalVerdict::Approved, None)
            .await
            .unwrap();
        assert_eq!(approved.status, WithdrawalStatus::Approved);

        let rejected = admin
            .admin_decide_withdrawal(
                &second.id,
                WithdrawalVerdict::Rejected,
                Some("dados divergentes".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);

        // Rejected payouts go back to the wallet
        assert_eq!(
            player.refresh_profile().await.unwrap().balance,
            Amount::from_reais(70)
        );

        let err = admin
            .admin_decide_withdrawal(&first.id, WithdrawalVerdict::Rejected, None)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Withdrawal already reviewed");
    }

    #[tokio::test]
    async fn test_card_lifecycle_with_upload() {
        let ctx = TestContext::new().await;
        let admin = ctx.admin_client().await;
        let before = admin.admin_cards().await.unwrap().len();

        let image = CardImage::from_file_name("turbo.png", vec![0x89, b'P', b'N', b'G']);
        let card = admin.admin_create_card(&draft(), Some(image)).await.unwrap();
        assert_eq!(card.name, "Raspa Turbo");
        assert_eq!(card.price, Amount::from_centavos(250));
        assert_eq!(card.prizes.len(), 2);
        assert!(card.image_url.as_deref().unwrap_or_default().ends_with("turbo.png"));
        assert_eq!(admin.admin_cards().await.unwrap().len(), before + 1);

        let mut edit = draft();
        edit.is_active = false;
        let updated = admin.admin_update_card(&card.id, &edit).await.unwrap();
        assert!(!updated.is_active);
        let public = ctx.create_client().list_cards().await.unwrap();
        assert!(public.iter().all(|listed| listed.id != card.id));

        admin.admin_delete_card(&card.id).await.unwrap();
        assert_eq!(admin.admin_cards().await.unwrap().len(), before);
        let err = admin.admin_delete_card(&card.id).await.unwrap_err();
        assert_eq!(err.user_message(), "Card not found");
    }

    #[tokio::test]
    async fn test_settings_and_deposits() {
        let ctx = TestContext::new().await;
        let admin = ctx.admin_client().await;

        let mut settings = admin.admin_settings().await.unwrap();
        settings.min_deposit = Amount::from_reais(15);
        let saved = admin.admin_update_settings(&settings).await.unwrap();
        assert_eq!(saved, settings);

        let player = ctx.logged_in_client("vera@example.com").await;
        // Client-side minimum is still R$ 10; the backend enforces its own
        let err = player
            .create_deposit(Amount::from_reais(12))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Minimum deposit is R$ 15,00");
        player.create_deposit(Amount::from_reais(20)).await.unwrap();

        let deposits = admin.admin_deposits().await.unwrap();
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].amount, Amount::from_reais(20));
    }
}
