use ellio_savings::{
    config::{self, database},
    core::{GoalTracker, SavingsLedger, progress, status_message},
    errors::Result,
    storage::{KeyValueStore, SeaOrmStore},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the ledger configuration
    let config_path = env::var("SAVINGS_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let ledger_config = config::load_config_or_default(&config_path)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Open the database and make sure the key-value table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))?;

    let store: Arc<dyn KeyValueStore> = Arc::new(SeaOrmStore::new(db));
    let ledger = SavingsLedger::new(Arc::clone(&store), &ledger_config);
    let goals = GoalTracker::new(store, ledger_config.failure_policy);

    // 5. Report this week's savings and the active goal
    let weekly = ledger.get_weekly_savings().await?;
    info!(
        "Week of {}: saved ${:.2} on ${:.2} across {} receipts",
        weekly.week_start.format("%Y-%m-%d"),
        weekly.total_saved,
        weekly.total_spent,
        weekly.receipts_count
    );
    if let Some(deal) = &weekly.best_deal {
        info!("Best deal: {} (saved ${:.2})", deal.item_name, deal.savings);
    }
    for category in &weekly.top_savings_categories {
        info!("  {}: ${:.2}", category.category, category.saved);
    }

    match goals.get_active_goal().await? {
        Some(goal) => {
            let report = progress(&goal, chrono::Utc::now());
            info!("{}", status_message(&report));
        }
        None => info!("No active savings goal."),
    }

    Ok(())
}
