use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use raspadinha_types::{
    account::{AffiliateStats, InventoryItem, RedeemRequest, RedemptionStatus, Referral},
    admin::{
        DashboardStats, PlatformSettings, ScratchCardDraft, UserUpdate, WithdrawalDecision,
        WithdrawalVerdict,
    },
    scratch::{GameRecord, PlayResult, Prize, PrizeKind, ScratchCard},
    wallet::{
        CreateDepositRequest, Deposit, DepositStatus, PaymentIntent, Transaction,
        TransactionKind, TransactionStatus, UnprocessedDeposits, Withdrawal, WithdrawalRequest,
        WithdrawalStatus,
    },
    Amount, AuthPayload, Id, LoginRequest, RegisterRequest, Role, UserProfile,
};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

use crate::SimError;

const DEFAULT_ADMIN_EMAIL: &str = "admin@raspadinha.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_WIN_RATE: f64 = 0.3;

#[derive(Clone, Debug, Serialize)]
pub struct SimulatorConfig {
    pub admin_email: String,
    pub admin_password: String,
    /// Chance of a random play winning when no outcome is queued.
    pub win_rate: f64,
    /// Seed for play outcomes (entropy when omitted).
    pub seed: Option<u64>,
    /// Balance granted to new registrations.
    pub signup_bonus: Amount,
    pub settings: PlatformSettings,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            win_rate: DEFAULT_WIN_RATE,
            seed: None,
            signup_bonus: Amount::ZERO,
            settings: PlatformSettings::default(),
        }
    }
}

/// Result of the next play, decided ahead of time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win(Id),
    Lose,
}

struct UserRecord {
    profile: UserProfile,
    password: String,
    invited_by: Option<Id>,
    joined_at: DateTime<Utc>,
    commission_total: Amount,
    commission_available: Amount,
}

struct DepositRecord {
    deposit: Deposit,
    paid: bool,
    credited: bool,
}

pub struct State {
    next_id: u64,
    rng: StdRng,
    outcomes: VecDeque<Outcome>,
    win_rate: f64,
    signup_bonus: Amount,
    users: Vec<UserRecord>,
    sessions: HashMap<String, Id>,
    cards: Vec<ScratchCard>,
    deposits: Vec<DepositRecord>,
    withdrawals: Vec<Withdrawal>,
    transactions: HashMap<Id, Vec<Transaction>>,
    games: HashMap<Id, Vec<GameRecord>>,
    inventory: HashMap<Id, Vec<InventoryItem>>,
    settings: PlatformSettings,
}

impl State {
    pub fn new(config: &SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut state = Self {
            next_id: 0,
            rng,
            outcomes: VecDeque::new(),
            win_rate: config.win_rate.clamp(0.0, 1.0),
            signup_bonus: config.signup_bonus,
            users: Vec::new(),
            sessions: HashMap::new(),
            cards: Vec::new(),
            deposits: Vec::new(),
            withdrawals: Vec::new(),
            transactions: HashMap::new(),
            games: HashMap::new(),
            inventory: HashMap::new(),
            settings: config.settings.clone(),
        };
        state.seed_admin(&config.admin_email, &config.admin_password);
        state.seed_cards();
        state
    }

    fn next_id(&mut self, prefix: &str) -> Id {
        self.next_id += 1;
        Id::new(format!("{prefix}_{}", self.next_id))
    }

    fn seed_admin(&mut self, email: &str, password: &str) {
        let id = self.next_id("usr");
        self.users.push(UserRecord {
            profile: UserProfile {
                id: id.clone(),
                name: "Admin".to_string(),
                email: email.to_string(),
                phone: None,
                cpf: None,
                balance: Amount::ZERO,
                bonus_balance: Amount::ZERO,
                role: Role::Admin,
                is_active: true,
                affiliate_code: Some(affiliate_code(&id)),
                created_at: Some(Utc::now()),
            },
            password: password.to_string(),
            invited_by: None,
            joined_at: Utc::now(),
            commission_total: Amount::ZERO,
            commission_available: Amount::ZERO,
        });
    }

    fn seed_cards(&mut self) {
        let catalogue: [(&str, i64, &[(&str, i64, PrizeKind)]); 3] = [
            (
                "Raspadinha da Sorte",
                100,
                &[
                    ("R$ 2", 200, PrizeKind::Cash),
                    ("R$ 5", 500, PrizeKind::Cash),
                    ("R$ 10", 1_000, PrizeKind::Cash),
                    ("R$ 50", 5_000, PrizeKind::Cash),
                    ("R$ 100", 10_000, PrizeKind::Cash),
                ],
            ),
            (
                "Raspa PIX",
                500,
                &[
                    ("R$ 10", 1_000, PrizeKind::Cash),
                    ("R$ 25", 2_500, PrizeKind::Cash),
                    ("R$ 100", 10_000, PrizeKind::Cash),
                    ("R$ 500", 50_000, PrizeKind::Cash),
                ],
            ),
            (
                "Raspa Eletrônicos",
                1_000,
                &[
                    ("R$ 20", 2_000, PrizeKind::Cash),
                    ("Fone Bluetooth", 15_000, PrizeKind::Product),
                    ("Smartphone", 150_000, PrizeKind::Product),
                ],
            ),
        ];
        for (name, price, prizes) in catalogue {
            let card_id = self.next_id("card");
            let prizes = prizes
                .iter()
                .map(|(prize_name, value, kind)| Prize {
                    id: self.next_id("prz"),
                    name: prize_name.to_string(),
                    value: Amount::from_centavos(*value),
                    kind: *kind,
                    image_url: None,
                })
                .collect();
            self.cards.push(ScratchCard {
                id: card_id,
                name: name.to_string(),
                description: None,
                price: Amount::from_centavos(price),
                image_url: None,
                prizes,
                is_active: true,
                rtp: Some(90.0),
            });
        }
    }

    fn user(&self, id: &Id) -> Result<&UserRecord, SimError> {
        self.users
            .iter()
            .find(|user| &user.profile.id == id)
            .ok_or(SimError::UserNotFound)
    }

    fn user_mut(&mut self, id: &Id) -> Result<&mut UserRecord, SimError> {
        self.users
            .iter_mut()
            .find(|user| &user.profile.id == id)
            .ok_or(SimError::UserNotFound)
    }

    fn open_session(&mut self, user_id: Id) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user_id);
        token
    }

    fn record(&mut self, user_id: &Id, kind: TransactionKind, amount: Amount, description: String) {
        let id = self.next_id("txn");
        self.transactions
            .entry(user_id.clone())
            .or_default()
            .push(Transaction {
                id,
                kind,
                amount,
                status: TransactionStatus::Completed,
                description: Some(description),
                created_at: Utc::now(),
            });
    }

    pub fn register(&mut self, request: RegisterRequest) -> Result<AuthPayload, SimError> {
        let email = request.email.trim().to_ascii_lowercase();
        if request.username.trim().is_empty() || !email.contains('@') {
            return Err(SimError::BadRequest("name and email are required".to_string()));
        }
        if request.password.len() < 6 {
            return Err(SimError::BadRequest(
                "password must have at least 6 characters".to_string(),
            ));
        }
        if request.cpf.len() != 11 || !request.cpf.chars().all(|c| c.is_ascii_digit()) {
            return Err(SimError::BadRequest("invalid CPF".to_string()));
        }
        if self
            .users
            .iter()
            .any(|user| user.profile.email.eq_ignore_ascii_case(&email))
        {
            return Err(SimError::EmailTaken);
        }
        let invited_by = match request.invite_code.as_deref() {
            Some(code) => Some(
                self.users
                    .iter()
                    .find(|user| user.profile.affiliate_code.as_deref() == Some(code))
                    .map(|user| user.profile.id.clone())
                    .ok_or_else(|| SimError::BadRequest("unknown invite code".to_string()))?,
            ),
            None => None,
        };

        let id = self.next_id("usr");
        let profile = UserProfile {
            id: id.clone(),
            name: request.username.trim().to_string(),
            email,
            phone: Some(request.phone),
            cpf: Some(request.cpf),
            balance: self.signup_bonus,
            bonus_balance: Amount::ZERO,
            role: Role::User,
            is_active: true,
            affiliate_code: Some(affiliate_code(&id)),
            created_at: Some(Utc::now()),
        };
        self.users.push(UserRecord {
            profile: profile.clone(),
            password: request.password,
            invited_by,
            joined_at: Utc::now(),
            commission_total: Amount::ZERO,
            commission_available: Amount::ZERO,
        });
        info!(user = %id, "registered user");
        let token = self.open_session(id);
        Ok(AuthPayload {
            user: profile,
            token,
        })
    }

    pub fn login(&mut self, request: LoginRequest) -> Result<AuthPayload, SimError> {
        let user = self
            .users
            .iter()
            .find(|user| user.profile.email.eq_ignore_ascii_case(request.email.trim()))
            .filter(|user| user.password == request.password)
            .ok_or(SimError::InvalidCredentials)?;
        if !user.profile.is_active {
            return Err(SimError::AccountDisabled);
        }
        let profile = user.profile.clone();
        let token = self.open_session(profile.id.clone());
        Ok(AuthPayload {
            user: profile,
            token,
        })
    }

    /// Resolve a bearer token to an active user.
    pub fn authenticate(&self, token: &str) -> Result<Id, SimError> {
        let id = self.sessions.get(token).ok_or(SimError::Unauthorized)?;
        let user = self.user(id)?;
        if !user.profile.is_active {
            return Err(SimError::AccountDisabled);
        }
        Ok(id.clone())
    }

    pub fn authenticate_admin(&self, token: &str) -> Result<Id, SimError> {
        let id = self.authenticate(token)?;
        if !self.user(&id)?.profile.is_admin() {
            return Err(SimError::Forbidden);
        }
        Ok(id)
    }

    pub fn profile(&self, user_id: &Id) -> Result<UserProfile, SimError> {
        Ok(self.user(user_id)?.profile.clone())
    }

    pub fn credit(&mut self, user_id: &Id, amount: Amount) -> Result<Amount, SimError> {
        let user = self.user_mut(user_id)?;
        user.profile.balance = user
            .profile
            .balance
            .checked_add(amount)
            .ok_or_else(|| SimError::BadRequest("Balance out of range".to_string()))?;
        Ok(user.profile.balance)
    }

    pub fn queue_outcome(&mut self, outcome: Outcome) {
        self.outcomes.push_back(outcome);
    }

    pub fn create_deposit(
        &mut self,
        user_id: &Id,
        request: CreateDepositRequest,
    ) -> Result<PaymentIntent, SimError> {
        if self.settings.maintenance_mode {
            return Err(SimError::Maintenance);
        }
        if request.amount < self.settings.min_deposit {
            return Err(SimError::MinimumDeposit(self.settings.min_deposit));
        }
        let user_name = self.user(user_id)?.profile.name.clone();
        let id = self.next_id("dep");
        let created_at = Utc::now();
        self.deposits.push(DepositRecord {
            deposit: Deposit {
                id: id.clone(),
                user_id: user_id.clone(),
                user_name: Some(user_name),
                amount: request.amount,
                status: DepositStatus::Pending,
                payment_method: request.payment_method,
                created_at,
            },
            paid: false,
            credited: false,
        });
        Ok(PaymentIntent {
            pix_code: pix_code(&id, request.amount),
            id,
            amount: request.amount,
            qr_code_image: None,
            expires_at: Some(created_at + chrono::Duration::minutes(15)),
        })
    }

    /// Gateway confirmation. Crediting happens on the next unprocessed check.
    pub fn mark_paid(&mut self, deposit_id: &Id) -> Result<(), SimError> {
        let record = self
            .deposits
            .iter_mut()
            .find(|record| &record.deposit.id == deposit_id)
            .ok_or(SimError::DepositNotFound)?;
        record.paid = true;
        record.deposit.status = DepositStatus::Paid;
        debug!(deposit = %deposit_id, "deposit paid at gateway");
        Ok(())
    }

    pub fn deposit_count(&self) -> usize {
        self.deposits.len()
    }

    pub fn check_unprocessed(&mut self, user_id: &Id) -> Result<UnprocessedDeposits, SimError> {
        let pending: Vec<(Id, Amount)> = self
            .deposits
            .iter()
            .filter(|record| &record.deposit.user_id == user_id && record.paid && !record.credited)
            .map(|record| (record.deposit.id.clone(), record.deposit.amount))
            .collect();

        let mut result = UnprocessedDeposits::default();
        for (deposit_id, amount) in pending {
            self.credit(user_id, amount)?;
            if let Some(record) = self
                .deposits
                .iter_mut()
                .find(|record| record.deposit.id == deposit_id)
            {
                record.credited = true;
            }
            self.record(
                user_id,
                TransactionKind::Deposit,
                amount,
                format!("PIX deposit {deposit_id}"),
            );
            self.pay_commission(user_id, amount)?;
            result.processed += 1;
            result.credited = result.credited + amount;
        }
        Ok(result)
    }

    fn pay_commission(&mut self, user_id: &Id, deposit: Amount) -> Result<(), SimError> {
        let Some(sponsor_id) = self.user(user_id)?.invited_by.clone() else {
            return Ok(());
        };
        let rate = self.settings.affiliate_commission_rate / 100.0;
        let commission =
            Amount::from_centavos((deposit.centavos() as f64 * rate).round() as i64);
        if !commission.is_positive() {
            return Ok(());
        }
        let sponsor = self.user_mut(&sponsor_id)?;
        sponsor.commission_total = sponsor.commission_total + commission;
        sponsor.commission_available = sponsor.commission_available + commission;
        Ok(())
    }

    pub fn transactions(&self, user_id: &Id) -> Vec<Transaction> {
        let mut entries = self.transactions.get(user_id).cloned().unwrap_or_default();
        entries.reverse();
        entries
    }

    pub fn games(&self, user_id: &Id) -> Vec<GameRecord> {
        let mut entries = self.games.get(user_id).cloned().unwrap_or_default();
        entries.reverse();
        entries
    }

    pub fn withdrawals_of(&self, user_id: &Id) -> Vec<Withdrawal> {
        self.withdrawals
            .iter()
            .filter(|withdrawal| withdrawal.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect()
    }

    pub fn request_withdrawal(
        &mut self,
        user_id: &Id,
        request: WithdrawalRequest,
    ) -> Result<Withdrawal, SimError> {
        if request.amount < self.settings.min_withdrawal {
            return Err(SimError::MinimumWithdrawal(self.settings.min_withdrawal));
        }
        if request.pix_key.trim().is_empty() {
            return Err(SimError::BadRequest("PIX key is required".to_string()));
        }
        let user = self.user(user_id)?;
        if user.profile.balance < request.amount {
            return Err(SimError::InsufficientBalance);
        }
        let user_name = user.profile.name.clone();
        self.credit(user_id, Amount::ZERO - request.amount)?;
        let id = self.next_id("wdr");
        self.record(
            user_id,
            TransactionKind::Withdrawal,
            request.amount,
            format!("PIX withdrawal {id}"),
        );
        let withdrawal = Withdrawal {
            id,
            user_id: Some(user_id.clone()),
            user_name: Some(user_name),
            amount: request.amount,
            pix_key: request.pix_key,
            pix_key_type: request.pix_key_type,
            status: WithdrawalStatus::Pending,
            created_at: Utc::now(),
        };
        self.withdrawals.push(withdrawal.clone());
        Ok(withdrawal)
    }

    pub fn affiliate_stats(&self, user_id: &Id) -> Result<AffiliateStats, SimError> {
        let user = self.user(user_id)?;
        let invite_code = user
            .profile
            .affiliate_code
            .clone()
            .unwrap_or_else(|| affiliate_code(user_id));
        let referrals: Vec<Referral> = self
            .users
            .iter()
            .filter(|other| other.invited_by.as_ref() == Some(user_id))
            .map(|other| Referral {
                name: other.profile.name.clone(),
                joined_at: other.joined_at,
                deposited: self
                    .deposits
                    .iter()
                    .filter(|record| record.credited && record.deposit.user_id == other.profile.id)
                    .fold(Amount::ZERO, |total, record| total + record.deposit.amount),
            })
            .collect();
        Ok(AffiliateStats {
            invite_link: Some(format!("/register?ref={invite_code}")),
            invite_code,
            total_referrals: referrals.len() as u32,
            total_commission: user.commission_total,
            available_commission: user.commission_available,
            commission_rate: self.settings.affiliate_commission_rate,
            referrals,
        })
    }

    pub fn inventory(&self, user_id: &Id) -> Vec<InventoryItem> {
        self.inventory.get(user_id).cloned().unwrap_or_default()
    }

    pub fn redeem(
        &mut self,
        user_id: &Id,
        item_id: &Id,
        request: RedeemRequest,
    ) -> Result<InventoryItem, SimError> {
        let item = self
            .inventory
            .get_mut(user_id)
            .and_then(|items| items.iter_mut().find(|item| &item.id == item_id))
            .ok_or(SimError::ItemNotFound)?;
        if item.status != RedemptionStatus::Pending {
            return Err(SimError::AlreadyRedeemed);
        }
        item.status = RedemptionStatus::Requested;
        debug!(item = %item_id, address = ?request.address, "redemption requested");
        Ok(item.clone())
    }

    pub fn active_cards(&self) -> Vec<ScratchCard> {
        self.cards.iter().filter(|card| card.is_active).cloned().collect()
    }

    pub fn card(&self, card_id: &Id) -> Result<ScratchCard, SimError> {
        self.cards
            .iter()
            .find(|card| &card.id == card_id)
            .cloned()
            .ok_or(SimError::CardNotFound)
    }

    pub fn play(&mut self, user_id: &Id, card_id: &Id) -> Result<PlayResult, SimError> {
        if self.settings.maintenance_mode {
            return Err(SimError::Maintenance);
        }
        let card = self.card(card_id)?;
        if !card.is_active {
            return Err(SimError::CardInactive);
        }
        if self.user(user_id)?.profile.balance < card.price {
            return Err(SimError::InsufficientBalance);
        }

        let prize = self.draw(&card);
        self.credit(user_id, Amount::ZERO - card.price)?;
        self.record(
            user_id,
            TransactionKind::Bet,
            card.price,
            format!("Played {}", card.name),
        );
        if let Some(prize) = &prize {
            match prize.kind {
                PrizeKind::Cash => {
                    self.credit(user_id, prize.value)?;
                    self.record(
                        user_id,
                        TransactionKind::Prize,
                        prize.value,
                        format!("Won {}", prize.name),
                    );
                }
                PrizeKind::Product => {
                    let id = self.next_id("inv");
                    self.inventory
                        .entry(user_id.clone())
                        .or_default()
                        .push(InventoryItem {
                            id,
                            prize_name: prize.name.clone(),
                            prize_value: prize.value,
                            image_url: prize.image_url.clone(),
                            status: RedemptionStatus::Pending,
                            won_at: Utc::now(),
                        });
                }
            }
        }

        let game_id = self.next_id("game");
        self.games
            .entry(user_id.clone())
            .or_default()
            .push(GameRecord {
                id: game_id.clone(),
                card_id: card.id.clone(),
                card_name: card.name.clone(),
                price: card.price,
                is_winner: prize.is_some(),
                prize_name: prize.as_ref().map(|prize| prize.name.clone()),
                prize_value: prize.as_ref().map(|prize| prize.value),
                created_at: Utc::now(),
            });

        Ok(PlayResult {
            game_id,
            is_winner: prize.is_some(),
            prize,
            new_balance: self.user(user_id)?.profile.balance,
        })
    }

    /// Next queued outcome, or a random one at the configured win rate.
    fn draw(&mut self, card: &ScratchCard) -> Option<Prize> {
        match self.outcomes.pop_front() {
            Some(Outcome::Win(prize_id)) => {
                card.prizes.iter().find(|prize| prize.id == prize_id).cloned()
            }
            Some(Outcome::Lose) => None,
            None => {
                if !self.rng.gen_bool(self.win_rate) {
                    return None;
                }
                card.prizes.choose(&mut self.rng).cloned()
            }
        }
    }

    pub fn dashboard(&self) -> DashboardStats {
        let total_deposits = self
            .deposits
            .iter()
            .filter(|record| record.credited)
            .fold(Amount::ZERO, |total, record| total + record.deposit.amount);
        let total_withdrawals = self
            .withdrawals
            .iter()
            .filter(|withdrawal| withdrawal.status != WithdrawalStatus::Rejected)
            .fold(Amount::ZERO, |total, withdrawal| total + withdrawal.amount);
        DashboardStats {
            total_users: self.users.len() as u64,
            active_users: self.users.iter().filter(|user| user.profile.is_active).count() as u64,
            total_deposits,
            total_withdrawals,
            pending_withdrawals: self
                .withdrawals
                .iter()
                .filter(|withdrawal| withdrawal.status == WithdrawalStatus::Pending)
                .count() as u64,
            games_played: self.games.values().map(|games| games.len() as u64).sum(),
        }
    }

    pub fn users(&self) -> Vec<UserProfile> {
        self.users.iter().map(|user| user.profile.clone()).collect()
    }

    pub fn update_user(&mut self, user_id: &Id, update: UserUpdate) -> Result<UserProfile, SimError> {
        if let Some(email) = &update.email {
            if self
                .users
                .iter()
                .any(|user| &user.profile.id != user_id && user.profile.email.eq_ignore_ascii_case(email))
            {
                return Err(SimError::EmailTaken);
            }
        }
        let user = self.user_mut(user_id)?;
        if let Some(name) = update.name {
            user.profile.name = name;
        }
        if let Some(email) = update.email {
            user.profile.email = email;
        }
        if let Some(phone) = update.phone {
            user.profile.phone = Some(phone);
        }
        if let Some(balance) = update.balance {
            user.profile.balance = balance;
        }
        if let Some(role) = update.role {
            user.profile.role = role;
        }
        Ok(user.profile.clone())
    }

    pub fn set_user_status(&mut self, user_id: &Id, is_active: bool) -> Result<UserProfile, SimError> {
        let user = self.user_mut(user_id)?;
        user.profile.is_active = is_active;
        Ok(user.profile.clone())
    }

    pub fn deposits(&self) -> Vec<Deposit> {
        self.deposits.iter().map(|record| record.deposit.clone()).collect()
    }

    pub fn withdrawals(&self) -> Vec<Withdrawal> {
        self.withdrawals.clone()
    }

    pub fn decide_withdrawal(
        &mut self,
        withdrawal_id: &Id,
        decision: WithdrawalDecision,
    ) -> Result<Withdrawal, SimError> {
        let withdrawal = self
            .withdrawals
            .iter_mut()
            .find(|withdrawal| &withdrawal.id == withdrawal_id)
            .ok_or(SimError::WithdrawalNotFound)?;
        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(SimError::AlreadyReviewed);
        }
        withdrawal.status = match decision.status {
            WithdrawalVerdict::Approved => WithdrawalStatus::Approved,
            WithdrawalVerdict::Rejected => WithdrawalStatus::Rejected,
        };
        let withdrawal = withdrawal.clone();
        if withdrawal.status == WithdrawalStatus::Rejected {
            if let Some(user_id) = &withdrawal.user_id {
                self.credit(user_id, withdrawal.amount)?;
                let reason = decision.reason.unwrap_or_else(|| "no reason given".to_string());
                self.record(
                    user_id,
                    TransactionKind::Withdrawal,
                    withdrawal.amount,
                    format!("Withdrawal {} refunded: {reason}", withdrawal.id),
                );
            }
        }
        Ok(withdrawal)
    }

    pub fn all_cards(&self) -> Vec<ScratchCard> {
        self.cards.clone()
    }

    pub fn create_card(
        &mut self,
        draft: ScratchCardDraft,
        image_name: Option<String>,
    ) -> Result<ScratchCard, SimError> {
        validate_draft(&draft)?;
        let id = self.next_id("card");
        let image_url = image_name.map(|name| format!("/uploads/{id}/{name}"));
        let card = self.build_card(id, draft, image_url);
        self.cards.push(card.clone());
        Ok(card)
    }

    pub fn update_card(&mut self, card_id: &Id, draft: ScratchCardDraft) -> Result<ScratchCard, SimError> {
        validate_draft(&draft)?;
        let position = self
            .cards
            .iter()
            .position(|card| &card.id == card_id)
            .ok_or(SimError::CardNotFound)?;
        let image_url = self.cards[position].image_url.clone();
        let card = self.build_card(card_id.clone(), draft, image_url);
        self.cards[position] = card.clone();
        Ok(card)
    }

    pub fn delete_card(&mut self, card_id: &Id) -> Result<(), SimError> {
        let before = self.cards.len();
        self.cards.retain(|card| &card.id != card_id);
        if self.cards.len() == before {
            return Err(SimError::CardNotFound);
        }
        Ok(())
    }

    fn build_card(&mut self, id: Id, draft: ScratchCardDraft, image_url: Option<String>) -> ScratchCard {
        let prizes = draft
            .prizes
            .into_iter()
            .map(|prize| Prize {
                id: self.next_id("prz"),
                name: prize.name,
                value: prize.value,
                kind: prize.kind,
                image_url: None,
            })
            .collect();
        ScratchCard {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            image_url,
            prizes,
            is_active: draft.is_active,
            rtp: draft.rtp,
        }
    }

    pub fn settings(&self) -> PlatformSettings {
        self.settings.clone()
    }

    pub fn update_settings(&mut self, settings: PlatformSettings) -> Result<PlatformSettings, SimError> {
        if !settings.min_deposit.is_positive() || !settings.min_withdrawal.is_positive() {
            return Err(SimError::BadRequest("minimums must be positive".to_string()));
        }
        if !(0.0..=100.0).contains(&settings.affiliate_commission_rate) {
            return Err(SimError::BadRequest(
                "commission rate must be between 0 and 100".to_string(),
            ));
        }
        self.settings = settings;
        Ok(self.settings.clone())
    }
}

fn validate_draft(draft: &ScratchCardDraft) -> Result<(), SimError> {
    if draft.name.trim().is_empty() {
        return Err(SimError::BadRequest("card name is required".to_string()));
    }
    if !draft.price.is_positive() {
        return Err(SimError::BadRequest("card price must be positive".to_string()));
    }
    if let Some(rtp) = draft.rtp {
        if !(0.0..=100.0).contains(&rtp) {
            return Err(SimError::BadRequest("rtp must be between 0 and 100".to_string()));
        }
    }
    Ok(())
}

fn affiliate_code(id: &Id) -> String {
    format!("RASP{}", id.as_str().trim_start_matches("usr_"))
}

/// Fake "copia e cola" payload; only the shape resembles a real BR Code.
fn pix_code(deposit_id: &Id, amount: Amount) -> String {
    format!(
        "00020126580014br.gov.bcb.pix0136{deposit_id}5204000053039865406{}5802BR6304",
        amount.to_decimal_string()
    )
}
