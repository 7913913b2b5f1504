//! Demo data seeder for Paycore development.
//!
//! Creates a demo user with a funded savings wallet and an empty fixed wallet,
//! then moves money between them through the ledger engine. The transfer uses
//! a fixed idempotency key, so running the seeder again replays it instead of
//! moving money twice.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use paycore_core::ledger::{
    IdempotencyKey, LedgerEngine, LedgerQueries, TransactionType, TransferRequest, Wallet,
    WalletType,
};
use paycore_db::{SeaOrmLedgerStore, UserRepository, WalletRepository};
use paycore_shared::types::{Currency, Money, PageRequest, UserId};
use paycore_shared::{AppConfig, RetryPolicy, telemetry};

const DEMO_EMAIL: &str = "demo@paycore.dev";
const DEMO_TRANSFER_KEY: &str = "seed-demo-transfer-0001";
const OPENING_BALANCE: Decimal = dec!(1000.00);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging);

    info!("Connecting to database...");
    let db = paycore_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    let users = UserRepository::new(db.clone());
    let user_id: UserId = match users.find_by_email(DEMO_EMAIL).await? {
        Some(user) => {
            info!(user_id = %user.id, "Demo user already exists, skipping...");
            user.id.into()
        }
        None => users.create(DEMO_EMAIL, "Demo User").await?.id.into(),
    };

    let wallets = WalletRepository::new(db.clone());
    let savings = ensure_wallet(&wallets, user_id, WalletType::Savings, OPENING_BALANCE).await?;
    let fixed = ensure_wallet(&wallets, user_id, WalletType::Fixed, Decimal::ZERO).await?;

    let store = SeaOrmLedgerStore::from_config(db, &config.ledger);
    let engine = LedgerEngine::from_config(store.clone(), &config.ledger);
    let request = TransferRequest::new(
        savings.id,
        fixed.id,
        Money::new(dec!(250.00), Currency::Ngn),
        TransactionType::Transfer,
        Some("Seeded demo transfer".to_string()),
        IdempotencyKey::new(DEMO_TRANSFER_KEY)?,
    )?;

    let outcome = engine.execute_transfer(request).await?;
    info!(
        transaction_id = %outcome.transaction().id,
        replayed = outcome.is_replay(),
        "Demo transfer done"
    );

    let queries = LedgerQueries::new(store, RetryPolicy::from(&config.retry));
    for wallet in [savings.id, fixed.id] {
        let current = queries.get_wallet(wallet).await?;
        let history = queries.wallet_history(wallet, PageRequest::default()).await?;
        info!(
            wallet_id = %wallet,
            balance = %current.money(),
            transactions = history.meta.total,
            "Wallet seeded"
        );
    }

    info!("Seeding complete!");
    Ok(())
}

async fn ensure_wallet(
    wallets: &WalletRepository,
    user_id: UserId,
    wallet_type: WalletType,
    opening_balance: Decimal,
) -> anyhow::Result<Wallet> {
    if let Some(existing) = wallets
        .list_by_user(user_id)
        .await?
        .into_iter()
        .find(|w| w.wallet_type == wallet_type)
    {
        info!(wallet_id = %existing.id, ?wallet_type, "Wallet already exists, skipping...");
        return Ok(existing);
    }

    let wallet = wallets
        .open_wallet(user_id, wallet_type, Currency::Ngn, opening_balance)
        .await?;
    info!(wallet_id = %wallet.id, ?wallet_type, "Wallet opened");
    Ok(wallet)
}
