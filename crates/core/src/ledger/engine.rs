//! Transfer execution.
//!
//! One transfer runs inside one unit of work:
//!
//! 1. Lock both wallets, lower id first.
//! 2. Replay a committed transaction with the same idempotency key, if any.
//! 3. Validate currencies and funds against the locked rows.
//! 4. Insert a pending transaction; a key collision replays the winner.
//! 5. Write the debit and credit entries and both balances.
//! 6. Mark the transaction completed and commit.
//!
//! Any failure, and any deadline expiry, rolls back every write. Transfers are
//! never retried here: a client retry with the same key is the safe path.

use std::time::Duration;

use tracing::{Instrument, error, info, info_span, warn};

use paycore_shared::config::LedgerConfig;

use super::error::LedgerError;
use super::pair::WalletPair;
use super::posting::plan_transfer;
use super::store::{InsertOutcome, LedgerStore, UnitOfWork};
use super::transaction::{NewTransaction, Transaction, TransactionStatus};
use super::types::{TransferOutcome, TransferRequest};
use super::validation::{validate_request, validate_transfer};

/// Executes transfers against a [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct LedgerEngine<S> {
    store: S,
    deadline: Duration,
}

enum Applied {
    Created(Transaction),
    Replayed(Transaction),
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Creates an engine with a default per-transfer deadline.
    #[must_use]
    pub const fn new(store: S, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Creates an engine using the configured transfer timeout.
    #[must_use]
    pub const fn from_config(store: S, config: &LedgerConfig) -> Self {
        Self::new(store, config.transfer_timeout())
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Executes a transfer under the default deadline.
    ///
    /// # Errors
    ///
    /// See [`LedgerEngine::execute_transfer_within`].
    pub async fn execute_transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, LedgerError> {
        self.execute_transfer_within(request, self.deadline).await
    }

    /// Executes a transfer, abandoning it if it has not committed within `deadline`.
    ///
    /// Returns [`TransferOutcome::Replayed`] with the existing transaction when
    /// one with the same idempotency key has already committed.
    ///
    /// # Errors
    ///
    /// - Validation errors for a malformed request; nothing is opened.
    /// - [`LedgerError::WalletNotFound`], [`LedgerError::CurrencyMismatch`] or
    ///   [`LedgerError::InsufficientFunds`] from checks under lock.
    /// - [`LedgerError::Store`] for storage failures; contention and connection
    ///   failures may be resubmitted with the same key.
    /// - [`LedgerError::DeadlineExceeded`] if the deadline elapsed; no write is visible.
    pub async fn execute_transfer_within(
        &self,
        request: TransferRequest,
        deadline: Duration,
    ) -> Result<TransferOutcome, LedgerError> {
        let span = info_span!(
            "transfer",
            idempotency_key = %request.idempotency_key,
            sender = %request.sender_wallet_id,
            receiver = %request.receiver_wallet_id,
            amount = %request.amount,
            currency = %request.currency,
        );

        async move {
            if let Err(err) = validate_request(&request) {
                warn!(error = %err, code = err.error_code(), "Transfer request rejected");
                return Err(err);
            }

            match tokio::time::timeout(deadline, self.run(&request)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                        "Transfer deadline exceeded, unit of work abandoned"
                    );
                    Err(LedgerError::DeadlineExceeded(deadline))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &TransferRequest) -> Result<TransferOutcome, LedgerError> {
        let mut unit = self.store.begin().await?;

        match apply(&mut unit, request).await {
            Ok(Applied::Created(txn)) => {
                unit.commit().await.inspect_err(|e| {
                    error!(error = %e, transaction_id = %txn.id, "Commit failed");
                })?;
                info!(transaction_id = %txn.id, "Transfer completed");
                Ok(TransferOutcome::Created(txn))
            }
            Ok(Applied::Replayed(txn)) => {
                rollback(unit).await;
                info!(transaction_id = %txn.id, "Idempotency key already used, replaying");
                Ok(TransferOutcome::Replayed(txn))
            }
            Err(err) => {
                rollback(unit).await;
                if err.is_domain() {
                    warn!(error = %err, code = err.error_code(), "Transfer rejected");
                } else {
                    error!(
                        error = %err,
                        code = err.error_code(),
                        retryable = err.is_retryable(),
                        "Transfer failed"
                    );
                }
                Err(err)
            }
        }
    }
}

async fn apply<U: UnitOfWork>(
    unit: &mut U,
    request: &TransferRequest,
) -> Result<Applied, LedgerError> {
    let pair = WalletPair::new(request.sender_wallet_id, request.receiver_wallet_id)?;
    let rows = unit.lock_wallets(pair).await?;
    let (sender, receiver) =
        pair.resolve(rows, request.sender_wallet_id, request.receiver_wallet_id)?;

    if let Some(existing) = unit
        .find_transaction_by_key(&request.idempotency_key)
        .await?
    {
        return Ok(Applied::Replayed(existing));
    }

    validate_transfer(request, &sender, &receiver)?;

    let pending = match unit
        .insert_transaction(NewTransaction::pending(request))
        .await?
    {
        InsertOutcome::Inserted(txn) => txn,
        InsertOutcome::DuplicateKey => {
            let existing = unit
                .find_transaction_by_key(&request.idempotency_key)
                .await?
                .ok_or_else(|| {
                    LedgerError::InvariantViolation(format!(
                        "idempotency key {} collided but no transaction owns it",
                        request.idempotency_key
                    ))
                })?;
            return Ok(Applied::Replayed(existing));
        }
    };

    let plan = plan_transfer(&pending, &sender, &receiver)?;
    unit.insert_ledger_entry(plan.debit).await?;
    unit.insert_ledger_entry(plan.credit).await?;
    unit.update_wallet_balance(sender.id, plan.sender_balance)
        .await?;
    unit.update_wallet_balance(receiver.id, plan.receiver_balance)
        .await?;
    let completed = unit
        .update_transaction_status(pending.id, TransactionStatus::Completed)
        .await?;

    Ok(Applied::Created(completed))
}

async fn rollback<U: UnitOfWork>(unit: U) {
    if let Err(e) = unit.rollback().await {
        error!(error = %e, "Rollback failed");
    }
}
