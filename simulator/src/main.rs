use anyhow::{Context, Result};
use clap::Parser;
use raspadinha_simulator::{Api, Simulator, SimulatorConfig};
use raspadinha_types::Amount;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::info;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host interface to bind (default: localhost).
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Seed for play outcomes; omit for a random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Probability of a random play winning.
    #[arg(long, default_value_t = 0.3)]
    win_rate: f64,

    #[arg(long, env = "RASPADINHA_ADMIN_EMAIL", default_value = "admin@raspadinha.local")]
    admin_email: String,

    #[arg(long, env = "RASPADINHA_ADMIN_PASSWORD", default_value = "admin123")]
    admin_password: String,

    /// Balance granted to new accounts, in reais (e.g. "10" or "10,50").
    #[arg(long, default_value = "0")]
    signup_bonus: Amount,
}

fn build_config(args: &Args) -> Result<SimulatorConfig> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.win_rate),
        "win_rate must be between 0 and 1"
    );
    anyhow::ensure!(!args.admin_password.is_empty(), "admin_password must not be empty");
    Ok(SimulatorConfig {
        admin_email: args.admin_email.clone(),
        admin_password: args.admin_password.clone(),
        win_rate: args.win_rate,
        seed: args.seed,
        signup_bonus: args.signup_bonus,
        ..Default::default()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = build_config(&args)?;
    info!(admin = %config.admin_email, win_rate = config.win_rate, seed = ?config.seed, "starting simulator");
    let simulator = Arc::new(Simulator::new(config));
    let router = Api::new(simulator).router();

    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seed_and_bonus() {
        let args = Args::parse_from(["simulator", "--seed", "7", "--signup-bonus", "10,50"]);
        let config = build_config(&args).expect("config should parse");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.signup_bonus, Amount::from_centavos(1050));
    }

    #[test]
    fn rejects_invalid_win_rate() {
        let args = Args::parse_from(["simulator", "--win-rate", "1.5"]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("win_rate"), "unexpected error: {err}");
    }
}
