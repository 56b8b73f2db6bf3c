use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use raspadinha_client::{
    admin::CardImage, BalancePoller, Client, Config, Level, Notice, Notifications, PaymentOutcome,
    RegistrationForm, SessionStore,
};
use raspadinha_types::{
    admin::{PlatformSettings, PrizeDraft, ScratchCardDraft, UserUpdate, WithdrawalVerdict},
    scratch::PrizeKind,
    wallet::{PaymentIntent, PixKeyType},
    Amount, Id, Role, UserProfile,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

mod scratch_screen;

/// CLI flags (override the YAML config and the remembered API URL)
#[derive(Parser, Debug)]
#[command(name = "raspadinha", version, about = "Raspadinha terminal client")]
struct Args {
    /// YAML client configuration; missing keys keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, remembered for later runs
    #[arg(long, env = "RASPADINHA_API_URL", global = true)]
    api_url: Option<String>,

    /// Log requests to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RASPADINHA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged in profile
    Me,
    /// Print balance changes until Ctrl-C
    Watch,
    /// Create a PIX deposit and wait for the payment
    Deposit {
        amount: Amount,
        /// Print the code and exit without waiting
        #[arg(long)]
        no_wait: bool,
    },
    /// List cards on sale
    Cards,
    /// Buy a card and scratch it
    Play {
        card_id: String,
        /// Print the uncovered grid instead of opening the scratch screen
        #[arg(long)]
        plain: bool,
    },
    /// Financial history
    History,
    /// Played games
    Games,
    /// Request a PIX withdrawal
    Withdraw {
        amount: Amount,
        #[arg(long)]
        pix_key: String,
        /// cpf, email, phone or random
        #[arg(long, default_value = "cpf")]
        pix_key_type: PixKeyType,
    },
    /// Withdrawal requests and their status
    Withdrawals,
    /// Invite code, referrals and commissions
    Affiliate,
    /// Product prizes waiting to be redeemed
    Inventory,
    /// Ask for a product prize to be delivered
    Redeem {
        item_id: String,
        #[arg(long)]
        address: Option<String>,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(ClapArgs, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "RASPADINHA_PASSWORD", hide_env_values = true)]
    password: String,
    /// Repeat the password; defaults to --password
    #[arg(long)]
    confirm_password: Option<String>,
    #[arg(long)]
    phone: String,
    /// CPF, punctuation allowed
    #[arg(long)]
    document: String,
    #[arg(long)]
    invite_code: Option<String>,
}

/// Platform administration
#[derive(Subcommand, Debug)]
enum AdminCommand {
    Dashboard,
    Users,
    UpdateUser {
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        balance: Option<Amount>,
        #[arg(long)]
        role: Option<RoleArg>,
    },
    Enable {
        user_id: String,
    },
    Disable {
        user_id: String,
    },
    Deposits,
    Withdrawals,
    Approve {
        withdrawal_id: String,
    },
    Reject {
        withdrawal_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    Cards,
    CreateCard {
        #[command(flatten)]
        card: CardArgs,
        /// Cover image uploaded with the card
        #[arg(long)]
        image: Option<PathBuf>,
    },
    UpdateCard {
        card_id: String,
        #[command(flatten)]
        card: CardArgs,
    },
    DeleteCard {
        card_id: String,
    },
    Settings,
    UpdateSettings {
        #[arg(long)]
        min_deposit: Option<Amount>,
        #[arg(long)]
        min_withdrawal: Option<Amount>,
        /// Percentage paid to sponsors on referral deposits
        #[arg(long)]
        commission_rate: Option<f64>,
        #[arg(long)]
        maintenance: Option<bool>,
    },
}

#[derive(ClapArgs, Debug)]
struct CardArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    price: Amount,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    rtp: Option<f64>,
    /// NAME=VALUE, or NAME=VALUE:product for physical prizes (repeatable)
    #[arg(long = "prize", value_parser = parse_prize)]
    prizes: Vec<PrizeDraft>,
    /// Keep the card off sale
    #[arg(long)]
    inactive: bool,
}

impl CardArgs {
    fn into_draft(self) -> ScratchCardDraft {
        ScratchCardDraft {
            name: self.name,
            description: self.description,
            price: self.price,
            rtp: self.rtp,
            is_active: !self.inactive,
            prizes: self.prizes,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    User,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Admin => Role::Admin,
        }
    }
}

fn parse_prize(raw: &str) -> std::result::Result<PrizeDraft, String> {
    let (name, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let (value, kind) = match rest.rsplit_once(':') {
        Some((value, "product")) => (value, PrizeKind::Product),
        Some((value, "cash")) => (value, PrizeKind::Cash),
        Some((_, other)) => return Err(format!("unknown prize kind {other:?}")),
        None => (rest, PrizeKind::Cash),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("prize name must not be empty".to_string());
    }
    let value: Amount = value.parse().map_err(|err| format!("{err}"))?;
    Ok(PrizeDraft {
        name: name.to_string(),
        value,
        kind,
    })
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedConfig {
    api_url: Option<String>,
}

fn load_config() -> Option<PersistedConfig> {
    let path = config_path()?;
    let data = std::fs::read(path).ok()?;
    serde_json::from_slice(&data).ok()
}

fn save_config(cfg: &PersistedConfig) -> Result<()> {
    if let Some(path) = config_path() {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        std::fs::write(path, data)?;
    }
    Ok(())
}

fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("br", "raspadinha", "raspadinha")
        .map(|d| d.config_dir().join("terminal.json"))
}

/// Flag or env first, then an explicit config file, then the remembered URL.
fn pick_api_url(
    flag: Option<String>,
    from_file: Option<String>,
    remembered: Option<String>,
    default: String,
) -> String {
    flag.or(from_file).or(remembered).unwrap_or(default)
}

fn resolve_config(args: &Args) -> Result<Config> {
    let file_config = match &args.config {
        Some(path) => Some(
            Config::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        ),
        None => None,
    };
    let mut persisted = load_config().unwrap_or_default();
    let mut config = file_config.clone().unwrap_or_default();
    config.api_url = pick_api_url(
        args.api_url.clone(),
        file_config.map(|config| config.api_url),
        persisted.api_url.clone(),
        config.api_url,
    );

    if args.api_url.is_some() {
        persisted.api_url = args.api_url.clone();
        if let Err(err) = save_config(&persisted) {
            warn!(error = %err, "failed to remember API URL");
        }
    }
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            eprintln!("{}", describe(&err));
            ExitCode::FAILURE
        }
    }
}

/// Client errors print their user-facing message; anything else prints the chain.
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<raspadinha_client::Error>() {
        Some(client_err) => client_err.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    let session = match SessionStore::default_path() {
        Some(path) => SessionStore::persistent(path),
        None => {
            warn!("no config directory; session will not be remembered");
            SessionStore::in_memory()
        }
    };
    let client = Client::from_config(&config)
        .map_err(|err| anyhow::anyhow!("invalid API URL {}: {err}", config.api_url))?
        .with_session(session);

    match args.command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            println!("Welcome back, {}! Balance: {}", user.name, user.balance);
        }
        Command::Register(register) => {
            let form = RegistrationForm {
                confirm_password: register
                    .confirm_password
                    .unwrap_or_else(|| register.password.clone()),
                name: register.name,
                email: register.email,
                password: register.password,
                phone: register.phone,
                document: register.document,
                invite_code: register.invite_code,
            };
            let user = client.register(form).await?;
            println!("Account created. Welcome, {}!", user.name);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
        }
        Command::Me => print_profile(&client.refresh_profile().await?),
        Command::Watch => watch(&client, &config).await?,
        Command::Deposit { amount, no_wait } => deposit(&client, &config, amount, !no_wait).await?,
        Command::Cards => cards(&client).await?,
        Command::Play { card_id, plain } => play(&client, &card_id, plain).await?,
        Command::History => {
            for tx in client.transactions().await? {
                println!(
                    "{}  {:<10} {:>14}  {:<9} {}",
                    when(&tx.created_at),
                    tx.kind.label(),
                    tx.amount.to_string(),
                    lower(&tx.status),
                    tx.description.unwrap_or_default()
                );
            }
        }
        Command::Games => {
            for game in client.game_history().await? {
                let outcome = match (&game.prize_name, game.prize_value) {
                    (Some(name), Some(value)) => format!("won {name} ({value})"),
                    (Some(name), None) => format!("won {name}"),
                    _ if game.is_winner => "won".to_string(),
                    _ => "no prize".to_string(),
                };
                println!(
                    "{}  {:<24} {:>12}  {}",
                    when(&game.created_at),
                    game.card_name,
                    game.price.to_string(),
                    outcome
                );
            }
        }
        Command::Withdraw {
            amount,
            pix_key,
            pix_key_type,
        } => {
            let withdrawal = client
                .request_withdrawal(amount, &pix_key, pix_key_type)
                .await?;
            println!(
                "Withdrawal {} of {} requested ({}).",
                withdrawal.id,
                withdrawal.amount,
                lower(&withdrawal.status)
            );
        }
        Command::Withdrawals => {
            for withdrawal in client.withdrawals().await? {
                println!(
                    "{}  {:<10} {:>12}  {} {}  {}",
                    when(&withdrawal.created_at),
                    withdrawal.id,
                    withdrawal.amount.to_string(),
                    withdrawal.pix_key_type,
                    withdrawal.pix_key,
                    lower(&withdrawal.status)
                );
            }
        }
        Command::Affiliate => {
            let stats = client.affiliate_stats().await?;
            println!("Invite code: {}", stats.invite_code);
            if let Some(link) = &stats.invite_link {
                println!("Invite link: {link}");
            }
            println!(
                "Referrals: {} | Commission rate: {}%",
                stats.total_referrals, stats.commission_rate
            );
            println!(
                "Commission: {} earned, {} available",
                stats.total_commission, stats.available_commission
            );
            for referral in stats.referrals {
                println!(
                    "  {}  {:<24} deposited {}",
                    when(&referral.joined_at),
                    referral.name,
                    referral.deposited
                );
            }
        }
        Command::Inventory => {
            for item in client.inventory().await? {
                println!(
                    "{}  {:<10} {:<24} {:>12}  {}",
                    when(&item.won_at),
                    item.id,
                    item.prize_name,
                    item.prize_value.to_string(),
                    lower(&item.status)
                );
            }
        }
        Command::Redeem { item_id, address } => {
            let item = client.redeem(&Id::from(item_id), address).await?;
            println!("{}: {}", item.prize_name, lower(&item.status));
        }
        Command::Admin(command) => admin(&client, command).await?,
    }
    Ok(())
}

fn when(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

fn lower(value: &impl std::fmt::Debug) -> String {
    format!("{value:?}").to_lowercase()
}

fn print_profile(user: &UserProfile) {
    println!("{} <{}>", user.name, user.email);
    println!("Balance: {}", user.balance);
    if user.bonus_balance.is_positive() {
        println!("Bonus: {}", user.bonus_balance);
    }
    if let Some(code) = &user.affiliate_code {
        println!("Invite code: {code}");
    }
    if user.is_admin() {
        println!("Role: admin");
    }
}

fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        Level::Success => "ok",
        Level::Info => "info",
        Level::Error => "error",
    };
    eprintln!("[{tag}] {}", notice.message);
}

async fn watch(client: &Client, config: &Config) -> Result<()> {
    let user = client.refresh_profile().await?;
    println!("{} | balance {}", user.name, user.balance);

    let poller = BalancePoller::spawn(
        client.clone(),
        config.poll_interval(),
        config.check_unprocessed_deposits,
    );
    let mut balance = poller.subscribe();
    balance.borrow_and_update();
    let mut session = client.session().subscribe();
    session.borrow_and_update();

    loop {
        tokio::select! {
            changed = balance.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(current) = *balance.borrow_and_update() {
                    println!("{}  balance {current}", Local::now().format("%H:%M:%S"));
                }
            }
            changed = session.changed() => {
                if changed.is_err() || session.borrow_and_update().is_none() {
                    bail!("Session ended. Please log in again.");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn deposit(client: &Client, config: &Config, amount: Amount, wait: bool) -> Result<()> {
    if !wait {
        let intent = client.create_deposit(amount).await?;
        print_pix_code(&intent);
        println!("Deposit {} created.", intent.id);
        return Ok(());
    }

    let (notifications, mut notices) = Notifications::channel();
    let flow = client
        .start_deposit(amount, config.payment_ttl(), notifications)
        .await?;
    print_pix_code(flow.intent());
    // Spawned after the profile refresh so it starts from the fresh balance
    let poller = BalancePoller::spawn(
        client.clone(),
        config.poll_interval(),
        config.check_unprocessed_deposits,
    );
    let countdown = *flow.countdown();
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            eprint!("\rWaiting for payment... {} ", countdown.display());
            if countdown.is_expired() {
                break;
            }
        }
    });

    let outcome = flow
        .monitor(poller.subscribe(), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    ticker.abort();
    eprintln!();
    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }

    match outcome {
        PaymentOutcome::Paid { balance } => println!("Balance: {balance}"),
        PaymentOutcome::Expired => bail!("Deposit not paid in time."),
        PaymentOutcome::Cancelled => {
            println!("Stopped waiting. The code stays valid until it expires.")
        }
    }
    Ok(())
}

fn print_pix_code(intent: &PaymentIntent) {
    println!("PIX deposit of {}", intent.amount);
    println!("Copy and paste this code in your bank app:\n\n{}\n", intent.pix_code);
}

async fn cards(client: &Client) -> Result<()> {
    for card in client.list_cards().await? {
        let top = card
            .max_prize()
            .map(|prize| format!("up to {prize}"))
            .unwrap_or_default();
        println!("{:<10} {:<24} {:>10}  {}", card.id, card.name, card.price.to_string(), top);
        for prize in &card.prizes {
            let kind = match prize.kind {
                PrizeKind::Cash => "",
                PrizeKind::Product => " (product)",
            };
            println!("    {} {}{kind}", prize.name, prize.value);
        }
    }
    Ok(())
}

async fn play(client: &Client, card_id: &str, plain: bool) -> Result<()> {
    let card = client.card(&Id::from(card_id)).await?;
    let mut ticket = client.play_ticket(&card).await?;
    if plain {
        ticket.reveal_all();
    } else {
        ticket = scratch_screen::run(&card, ticket)?;
        ticket.reveal_all();
    }

    for line in scratch_screen::grid_lines(&card, &ticket) {
        println!("{line}");
    }
    println!("{}", scratch_screen::outcome_line(&ticket));
    println!("Balance: {}", ticket.result().new_balance);
    Ok(())
}

async fn admin(client: &Client, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Dashboard => {
            let stats = client.admin_dashboard().await?;
            println!("Users: {} ({} active)", stats.total_users, stats.active_users);
            println!("Deposits: {}", stats.total_deposits);
            println!(
                "Withdrawals: {} ({} pending)",
                stats.total_withdrawals, stats.pending_withdrawals
            );
            println!("Games played: {}", stats.games_played);
        }
        AdminCommand::Users => {
            for user in client.admin_users().await? {
                println!(
                    "{:<10} {:<24} {:<28} {:>12}  {}{}",
                    user.id,
                    user.name,
                    user.email,
                    user.balance.to_string(),
                    lower(&user.role),
                    if user.is_active { "" } else { " (disabled)" }
                );
            }
        }
        AdminCommand::UpdateUser {
            user_id,
            name,
            email,
            phone,
            balance,
            role,
        } => {
            let update = UserUpdate {
                name,
                email,
                phone,
                balance,
                role: role.map(Role::from),
            };
            let user = client.admin_update_user(&Id::from(user_id), &update).await?;
            print_profile(&user);
        }
        AdminCommand::Enable { user_id } => {
            let user = client.admin_set_user_status(&Id::from(user_id), true).await?;
            println!("{} enabled.", user.email);
        }
        AdminCommand::Disable { user_id } => {
            let user = client
                .admin_set_user_status(&Id::from(user_id), false)
                .await?;
            println!("{} disabled.", user.email);
        }
        AdminCommand::Deposits => {
            for deposit in client.admin_deposits().await? {
                println!(
                    "{}  {:<10} {:<24} {:>12}  {}",
                    when(&deposit.created_at),
                    deposit.id,
                    deposit.user_name.unwrap_or_else(|| deposit.user_id.to_string()),
                    deposit.amount.to_string(),
                    lower(&deposit.status)
                );
            }
        }
        AdminCommand::Withdrawals => {
            for withdrawal in client.admin_withdrawals().await? {
                println!(
                    "{}  {:<10} {:<24} {:>12}  {} {}  {}",
                    when(&withdrawal.created_at),
                    withdrawal.id,
                    withdrawal.user_name.unwrap_or_default(),
                    withdrawal.amount.to_string(),
                    withdrawal.pix_key_type,
                    withdrawal.pix_key,
                    lower(&withdrawal.status)
                );
            }
        }
        AdminCommand::Approve { withdrawal_id } => {
            let withdrawal = client
                .admin_decide_withdrawal(&Id::from(withdrawal_id), WithdrawalVerdict::Approved, None)
                .await?;
            println!("Withdrawal {} approved.", withdrawal.id);
        }
        AdminCommand::Reject {
            withdrawal_id,
            reason,
        } => {
            let withdrawal = client
                .admin_decide_withdrawal(&Id::from(withdrawal_id), WithdrawalVerdict::Rejected, reason)
                .await?;
            println!("Withdrawal {} rejected and refunded.", withdrawal.id);
        }
        AdminCommand::Cards => {
            for card in client.admin_cards().await? {
                println!(
                    "{:<10} {:<24} {:>10}  {} prizes{}",
                    card.id,
                    card.name,
                    card.price.to_string(),
                    card.prizes.len(),
                    if card.is_active { "" } else { " (inactive)" }
                );
            }
        }
        AdminCommand::CreateCard { card, image } => {
            let image = image.as_deref().map(read_image).transpose()?;
            let card = client.admin_create_card(&card.into_draft(), image).await?;
            println!("Created card {} ({}).", card.id, card.name);
        }
        AdminCommand::UpdateCard { card_id, card } => {
            let card = client
                .admin_update_card(&Id::from(card_id), &card.into_draft())
                .await?;
            println!("Updated card {} ({}).", card.id, card.name);
        }
        AdminCommand::DeleteCard { card_id } => {
            client.admin_delete_card(&Id::from(card_id.clone())).await?;
            println!("Deleted card {card_id}.");
        }
        AdminCommand::Settings => print_settings(&client.admin_settings().await?),
        AdminCommand::UpdateSettings {
            min_deposit,
            min_withdrawal,
            commission_rate,
            maintenance,
        } => {
            let mut settings = client.admin_settings().await?;
            if let Some(min_deposit) = min_deposit {
                settings.min_deposit = min_deposit;
            }
            if let Some(min_withdrawal) = min_withdrawal {
                settings.min_withdrawal = min_withdrawal;
            }
            if let Some(rate) = commission_rate {
                settings.affiliate_commission_rate = rate;
            }
            if let Some(maintenance) = maintenance {
                settings.maintenance_mode = maintenance;
            }
            print_settings(&client.admin_update_settings(&settings).await?);
        }
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<CardImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(CardImage::from_file_name(file_name, bytes))
}

fn print_settings(settings: &PlatformSettings) {
    println!("Minimum deposit: {}", settings.min_deposit);
    println!("Minimum withdrawal: {}", settings.min_withdrawal);
    println!("Affiliate commission: {}%", settings.affiliate_commission_rate);
    println!(
        "Maintenance: {}",
        if settings.maintenance_mode { "on" } else { "off" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prize_specs() {
        let cash = parse_prize("R$ 50=50").unwrap();
        assert_eq!(cash.name, "R$ 50");
        assert_eq!(cash.value, Amount::from_reais(50));
        assert_eq!(cash.kind, PrizeKind::Cash);

        let product = parse_prize("Smartphone=1500,00:product").unwrap();
        assert_eq!(product.kind, PrizeKind::Product);
        assert_eq!(product.value, Amount::from_reais(1500));

        assert!(parse_prize("no value").is_err());
        assert!(parse_prize("=10").is_err());
        assert!(parse_prize("Bike=10:gift").is_err());
    }

    #[test]
    fn api_url_precedence() {
        let default = "http://127.0.0.1:8080/".to_string();
        assert_eq!(
            pick_api_url(
                Some("https://flag/".into()),
                Some("https://file/".into()),
                Some("https://saved/".into()),
                default.clone()
            ),
            "https://flag/"
        );
        assert_eq!(
            pick_api_url(None, Some("https://file/".into()), Some("https://saved/".into()), default.clone()),
            "https://file/"
        );
        assert_eq!(
            pick_api_url(None, None, Some("https://saved/".into()), default.clone()),
            "https://saved/"
        );
        assert_eq!(pick_api_url(None, None, None, default.clone()), default);
    }

    #[test]
    fn parses_admin_card_command() {
        let args = Args::try_parse_from([
            "raspadinha",
            "admin",
            "create-card",
            "--name",
            "Raspa Turbo",
            "--price",
            "2,50",
            "--prize",
            "R$ 5=5",
            "--prize",
            "Fone=150:product",
            "--inactive",
        ])
        .unwrap();
        let Command::Admin(AdminCommand::CreateCard { card, image }) = args.command else {
            panic!("unexpected command");
        };
        assert!(image.is_none());
        let draft = card.into_draft();
        assert_eq!(draft.price, Amount::from_centavos(250));
        assert_eq!(draft.prizes.len(), 2);
        assert!(!draft.is_active);
    }

    #[test]
    fn describe_prefers_user_message() {
        let err = anyhow::Error::new(raspadinha_client::Error::Api("Saldo insuficiente".into()))
            .context("play failed");
        assert_eq!(describe(&err), "Saldo insuficiente");
        let err = anyhow::anyhow!("plain failure");
        assert_eq!(describe(&err), "plain failure");
    }
}
