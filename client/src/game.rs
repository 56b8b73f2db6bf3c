use crate::{scratch::Grid, Client, Result, ScratchTicket};
use raspadinha_types::{
    scratch::{PlayResult, ScratchCard},
    Id,
};
use tracing::{info, warn};

impl Client {
    /// Active cards on sale.
    pub async fn list_cards(&self) -> Result<Vec<ScratchCard>> {
        self.get_public("scratch-cards").await
    }

    pub async fn card(&self, card_id: &Id) -> Result<ScratchCard> {
        self.get_public(&format!("scratch-cards/{card_id}")).await
    }

    /// Buy and play one card. The backend settles the outcome and balance;
    /// the cached balance is replaced with the one it returns.
    pub async fn play(&self, card_id: &Id) -> Result<PlayResult> {
        let result: PlayResult = self
            .post(&format!("scratch-cards/{card_id}/play"), &serde_json::json!({}))
            .await?;
        info!(
            card = %card_id,
            game = %result.game_id,
            winner = result.is_winner,
            balance = %result.new_balance,
            "played card"
        );
        if let Err(err) = self.session().set_balance(result.new_balance) {
            warn!(error = %err, "failed to cache balance after play");
        }
        Ok(result)
    }

    /// Play `card` and lay out its cosmetic grid, ready to be scratched.
    pub async fn play_ticket(&self, card: &ScratchCard) -> Result<ScratchTicket> {
        let result = self.play(&card.id).await?;
        let grid = Grid::for_result(&result, &card.prizes, &mut rand::thread_rng());
        Ok(ScratchTicket::new(result, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use crate::{Error, RevealState};
    use raspadinha_simulator::Outcome;
    use raspadinha_types::Amount;

    #[tokio::test]
    async fn test_list_cards_is_public() {
        let ctx = TestContext::new().await;
        let client = ctx.create_client();
        let cards = client.list_cards().await.unwrap();
        assert!(!cards.is_empty());
        assert!(cards.iter().all(|card| card.is_active));

        let card = client.card(&cards[0].id).await.unwrap();
        assert_eq!(card, cards[0]);
    }

    #[tokio::test]
    async fn test_winning_play_updates_balance_and_grid() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("joao@example.com").await;
        let user = client.session().user().unwrap();
        ctx.simulator
            .credit(&user.id, Amount::from_reais(20))
            .await
            .unwrap();
        client.refresh_profile().await.unwrap();

        let card = client.list_cards().await.unwrap().remove(0);
        let prize = card.prizes[0].clone();
        ctx.simulator.queue_outcome(Outcome::Win(prize.id.clone())).await;

        let mut ticket = client.play_ticket(&card).await.unwrap();
        let result = ticket.result().clone();
        assert!(result.is_winner);
        assert_eq!(result.prize.as_ref().map(|p| &p.id), Some(&prize.id));
        assert_eq!(
            result.new_balance,
            user.balance + Amount::from_reais(20) - card.price + prize.value
        );
        assert_eq!(client.session().balance(), Some(result.new_balance));
        assert_eq!(ticket.grid().count(&prize.id), 3);

        assert_eq!(ticket.reveal_all(), RevealState::Completed);
    }

    #[tokio::test]
    async fn test_losing_play_grid() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("lia@example.com").await;
        let user = client.session().user().unwrap();
        ctx.simulator
            .credit(&user.id, Amount::from_reais(20))
            .await
            .unwrap();

        let card = client.list_cards().await.unwrap().remove(0);
        ctx.simulator.queue_outcome(Outcome::Lose).await;
        let ticket = client.play_ticket(&card).await.unwrap();
        assert!(!ticket.result().is_winner);
        assert!(ticket.grid().winning_symbol().is_none());
    }

    #[tokio::test]
    async fn test_insufficient_balance_keeps_state() {
        let ctx = TestContext::new().await;
        let client = ctx.logged_in_client("mel@example.com").await;
        let before = client.session().current().unwrap();

        let card = client.list_cards().await.unwrap().remove(0);
        let err = client.play(&card.id).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { .. } | Error::Api(_)));
        assert_eq!(err.user_message(), "Insufficient balance");
        assert_eq!(client.session().current(), Some(before));
    }
}
