//! llm-cascade - cascade walkthrough
//!
//! Loads the tier catalog, pricing and budget from the environment, then
//! walks one simulated task through the cascade, printing every decision.

use std::path::Path;
use std::sync::Arc;

use llm_cascade::budget::{BudgetGate, ExpenseLedger, PricingTable, SharedBudgetGate, SqliteLedger};
use llm_cascade::cascade::{EscalationState, TierCascade, TierCatalog};
use llm_cascade::{CascadeRouter, Config};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Failed attempts simulated before the walkthrough stops.
const SIMULATED_FAILURES: usize = 4;

/// Token usage billed for every simulated call.
const SIMULATED_PROMPT_TOKENS: u64 = 1_500;
const SIMULATED_COMPLETION_TOKENS: u64 = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "llm_cascade=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: tiers={}, daily_budget=${:.2}",
        config.tiers_path.display(),
        config.daily_budget_usd
    );

    let catalog = load_catalog(&config.tiers_path)?;
    let pricing = load_pricing(&config.pricing_path)?;

    let budget = match &config.budget_db_path {
        Some(db_path) => {
            let ledger = SqliteLedger::open(db_path).await?;
            let today = ledger.daily_total(chrono::Utc::now().date_naive()).await?;
            info!("Restoring ${:.4} already spent today from ledger", today);
            let gate = BudgetGate::new(config.daily_budget_usd).with_spent(today);
            SharedBudgetGate::new(gate).with_ledger(Arc::new(ledger))
        }
        None => SharedBudgetGate::new(BudgetGate::new(config.daily_budget_usd)),
    };

    let router = CascadeRouter::new(TierCascade::new(catalog), budget, pricing);

    for (tier, model) in router.cascade().catalog().iter() {
        println!("{:<9} {}", tier, model);
    }
    println!();

    let mut state = EscalationState::start();
    let selection = router.select(&state).await?;
    println!("start     {}", serde_json::to_string(&selection)?);

    for _ in 0..SIMULATED_FAILURES {
        let model = router.select(&state).await?.model.model;
        match router
            .record_usage(&model, SIMULATED_PROMPT_TOKENS, SIMULATED_COMPLETION_TOKENS)
            .await
        {
            Ok(cost) => info!(model = %model, cost, "Billed simulated call"),
            Err(e) => warn!(model = %model, "Could not price call: {}", e),
        }

        let decision = router.on_failure(&mut state).await?;
        println!("failure   {}", serde_json::to_string(&decision)?);
    }

    let gate = router.budget().snapshot().await;
    println!();
    println!(
        "spent ${:.4} of ${:.2} ({:.1}%)",
        gate.spent_today(),
        gate.daily_limit(),
        gate.utilization() * 100.0
    );

    Ok(())
}

fn load_catalog(path: &Path) -> anyhow::Result<TierCatalog> {
    if !path.exists() {
        warn!(
            "No tier catalog at {}, using builtin catalog",
            path.display()
        );
        return Ok(TierCatalog::builtin());
    }
    Ok(TierCatalog::load(path)?)
}

fn load_pricing(path: &Path) -> anyhow::Result<PricingTable> {
    if !path.exists() {
        warn!("No pricing file at {}, using builtin prices", path.display());
        return Ok(PricingTable::builtin());
    }
    Ok(PricingTable::load(path)?)
}
