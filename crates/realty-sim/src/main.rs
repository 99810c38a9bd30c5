//! realty-sim: one pool lifecycle against an in-process oracle.
//!
//! ```text
//! RUST_LOG=realty_settlement=debug cargo run -p realty-sim -- --holders 4
//! ```
//!
//! Prints a JSON summary of the settled pool to stdout; logs go to stderr.

mod cli;
mod oracle_task;

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Duration;
use clap::Parser;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use realty_escrow::InMemoryEscrow;
use realty_settlement::TokenizedRealty;
use realty_types::{AccountId, Clock, LedgerConfig, ManualClock, PropertyId, PropertyPool, Receipt};
use realty_valuation::ChannelOracle;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Args;
use crate::oracle_task::{Fulfilled, PriceSchedule};

#[derive(Debug, Serialize)]
struct HolderSummary {
    holder: String,
    principal: Decimal,
    value_at_purchase: Option<Decimal>,
    credit: Decimal,
    debit: Decimal,
    payout: Decimal,
}

#[derive(Debug, Serialize)]
struct Summary {
    pool: PropertyPool,
    holders: Vec<HolderSummary>,
    creator_payout: Decimal,
    escrow_remaining: Decimal,
    receipts: Vec<Receipt>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args);
    if let Err(e) = args.validate() {
        bail!("invalid arguments: {e}");
    }

    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            LedgerConfig::from_json_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => LedgerConfig::default(),
    };

    // The simulated oracle signs with a fresh key each run.
    let signer = SigningKey::generate(&mut OsRng);
    if config.oracle.oracle_key.is_some() {
        tracing::warn!("Configured oracle_key replaced by the simulator's own key");
    }
    config.oracle.oracle_key = Some(hex::encode(signer.verifying_key().to_bytes()));

    let summary = run(&args, config, signer).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: &Args, config: LedgerConfig, signer: SigningKey) -> anyhow::Result<Summary> {
    let escrow = Arc::new(InMemoryEscrow::new());
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let (oracle, requests) = ChannelOracle::new();
    let ledger = Arc::new(TokenizedRealty::with_clock(
        config,
        escrow.clone(),
        Arc::new(oracle),
        clock.clone(),
    )?);

    let (done_tx, mut done) = mpsc::unbounded_channel();
    let schedule = PriceSchedule {
        base_value: args.base_value,
        value_step: args.value_step,
        final_value: args.final_value,
    };
    let oracle_task = oracle_task::spawn(Arc::clone(&ledger), signer, schedule, requests, done_tx);

    // --- create ---
    let creator = funded_account(&escrow, ledger.config().collateral_for(args.total));
    let id = PropertyId::new(args.property.as_str())?;
    let pool = ledger.create_property_tokens(
        creator,
        id.clone(),
        clock.now() + Duration::days(args.maturity_days),
        args.total,
    )?;
    tracing::info!(property = %id, collateral = %pool.collateral, "Simulation pool open");

    // --- purchase ---
    let shares = split(ledger.config(), args.total, args.holders);
    let mut holders = Vec::with_capacity(shares.len());
    for share in shares {
        let holder = funded_account(&escrow, share);
        ledger.purchase_property_tokens(holder, &id, share)?;
        expect_applied(done.recv().await)?;
        holders.push(holder);
    }

    // --- reconcile ---
    clock.advance(Duration::days(args.maturity_days + 1));
    ledger.reconcile_property_tokens(&id)?;
    expect_applied(done.recv().await)?;

    // --- claim ---
    let mut holder_summaries = Vec::with_capacity(holders.len());
    for holder in holders {
        let payout = ledger.claim_property_token_earnings(holder, &id)?;
        let position = ledger.get_holder_for_address(holder, &id)?;
        holder_summaries.push(HolderSummary {
            holder: holder.to_string(),
            principal: position.principal,
            value_at_purchase: position.value_at_purchase,
            credit: position.credit,
            debit: position.debit,
            payout,
        });
    }
    let creator_payout = ledger.claim_creator_collateral(creator, &id)?;

    escrow.verify_supply()?;
    oracle_task.abort();

    let pool = ledger.get_property_token(&id)?;
    tracing::info!(
        property = %id,
        phase = %pool.phase,
        final_value = ?pool.final_value,
        %creator_payout,
        "Simulation complete"
    );
    Ok(Summary {
        pool,
        holders: holder_summaries,
        creator_payout,
        escrow_remaining: escrow.escrowed(),
        receipts: ledger.receipts(&id),
    })
}

fn funded_account(escrow: &InMemoryEscrow, amount: Decimal) -> AccountId {
    let account = AccountId::from_bytes(rand::random());
    escrow.deposit(account, amount);
    escrow.request_allowance(account, amount);
    account
}

/// Split `total` into `n` shares at the currency scale; the last share
/// takes the rounding remainder.
fn split(config: &LedgerConfig, total: Decimal, n: usize) -> Vec<Decimal> {
    let count = Decimal::from(n);
    let share = config.round_down(total / count);
    let mut shares = vec![share; n.saturating_sub(1)];
    shares.push(total - share * (count - Decimal::ONE));
    shares.retain(|s| *s > Decimal::ZERO);
    shares
}

fn expect_applied(outcome: Option<Fulfilled>) -> anyhow::Result<()> {
    let outcome = outcome.context("oracle task stopped")?;
    if !outcome.applied {
        bail!(
            "valuation {} for {} was not applied",
            outcome.value,
            outcome.correlation_id
        );
    }
    Ok(())
}
