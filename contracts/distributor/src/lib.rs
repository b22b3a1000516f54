//! # Payment Distributor
//!
//! Escrows stablecoin funds for batches of authorized payments and releases
//! them only after each recipient has signed off on their own entry and a
//! mandatory dispute window has elapsed.
//!
//! Lifecycle per batch: the operator submits recipients, amounts and
//! recipient signatures; the contract verifies every signature, records the
//! signature hashes in a global replay set, and pulls the full funding amount
//! into escrow — all atomically. After the dispute window, anyone may trigger
//! processing, which pays each unprocessed entry exactly once (a failing
//! transfer skips that entry and leaves it open for retry). Anyone may expire
//! an aged batch, sweeping whatever is still unprocessed back to the
//! operator and closing the batch.
//!
//! The funding token is opaque: the contract only pulls from the operator at
//! creation and pushes to recipients (or back to the operator) afterwards.

#![no_std]

mod auth;
mod events;
pub mod security {
    pub mod reentrancy_guard;
}

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_disputes;

use events::{
    emit_batch_created, emit_batch_expired, emit_batch_payout_completed,
    emit_claim_key_registered, emit_initialized, emit_pause_toggled, emit_payment_disputed,
    emit_payment_processed, BatchCreated, BatchExpired, BatchPayoutCompleted, ClaimKeyRegistered,
    DistributorInitialized, PauseToggled, PaymentDisputed, PaymentProcessed,
};
use security::reentrancy_guard::ReentrancyGuard;
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, token, Address, BytesN, Env, Vec,
};

/// Hard cap on entries per batch.
pub const MAX_BATCH_SIZE: u32 = 100;

/// Seconds a batch must age before its entries may be paid out or swept.
/// Recipients use this window to dispute their entry.
pub const DISPUTE_WINDOW: u64 = 24 * 60 * 60;

/// Ledgers to keep used-signature entries alive per touch (~30 days). Losing
/// a replay-set entry re-opens replay, so these are extended aggressively.
const SIG_INDEX_TTL: u32 = 17280 * 30;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    ContractPaused = 3,
    LengthMismatch = 4,
    EmptyBatch = 5,
    BatchTooLarge = 6,
    BatchExists = 7,
    BatchNotFound = 8,
    PaymentNotFound = 9,
    InvalidAmount = 10,
    AmountOverflow = 11,
    NoClaimKey = 12,
    MalformedSignature = 13,
    SignerMismatch = 14,
    SignatureReplayed = 15,
    WindowNotElapsed = 16,
    BatchClosed = 17,
    AlreadyProcessed = 18,
    TransferFailed = 19,
    ReentrantCall = 20,
}

/// One authorized payment. Everything but `processed` is immutable after
/// batch creation; `processed` flips false -> true exactly once.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payment {
    pub recipient: Address,
    pub amount: i128,
    pub processed: bool,
    pub created_at: u64,
    pub signature: BytesN<65>,
}

/// A funded batch. Entries are fixed at creation; `refunded` is the terminal
/// closed flag set by `expire_batch`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batch {
    pub entries: Vec<Payment>,
    pub refunded: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BatchStatus {
    Open,
    PartiallyProcessed,
    FullyProcessed,
    Refunded,
}

#[contracttype]
pub enum DataKey {
    Admin,
    Token,
    Paused,
    Batch(BytesN<32>),
    UsedSig(BytesN<32>),
    TotalPaid(Address),
    ClaimKey(Address),
}

#[contract]
pub struct PaymentDistributor;

#[contractimpl]
impl PaymentDistributor {
    /// One-shot construction: fixes the operator and the funding token.
    pub fn init(env: Env, operator: Address, token: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::AlreadyInitialized);
        }
        env.storage().instance().set(&DataKey::Admin, &operator);
        env.storage().instance().set(&DataKey::Token, &token);

        emit_initialized(
            &env,
            DistributorInitialized {
                operator,
                token,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    /// Binds a recipient address to the secp256k1 identity (keccak-160 of
    /// the public key) that must sign their payment entries. Authorized by
    /// the recipient; re-registering replaces the binding for future batches
    /// only, since signatures are verified at creation time.
    pub fn register_claim_key(env: Env, recipient: Address, key: BytesN<20>) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Admin) {
            return Err(Error::NotInitialized);
        }
        recipient.require_auth();

        env.storage()
            .persistent()
            .set(&DataKey::ClaimKey(recipient.clone()), &key);

        emit_claim_key_registered(&env, ClaimKeyRegistered { recipient, key });
        Ok(())
    }

    /// Creates and fully funds a batch of authorized payments.
    ///
    /// Operator-only, disabled while paused. All-or-nothing: any failed check
    /// on any entry rejects the whole call with no state change, because a
    /// partially admitted batch would burn the single-use `batch_id` while
    /// leaving authorized recipients unpaid. On success the exact sum of
    /// `amounts` has been pulled from the operator into escrow and every
    /// signature hash is marked used for the lifetime of the contract.
    pub fn create_batch(
        env: Env,
        batch_id: BytesN<32>,
        recipients: Vec<Address>,
        amounts: Vec<i128>,
        signatures: Vec<BytesN<65>>,
    ) -> Result<(), Error> {
        let operator = Self::operator_internal(&env)?;
        operator.require_auth();

        if Self::paused_internal(&env) {
            return Err(Error::ContractPaused);
        }

        let count = recipients.len();
        if count == 0 {
            return Err(Error::EmptyBatch);
        }
        if amounts.len() != count || signatures.len() != count {
            return Err(Error::LengthMismatch);
        }
        if count > MAX_BATCH_SIZE {
            return Err(Error::BatchTooLarge);
        }

        let batch_key = DataKey::Batch(batch_id.clone());
        if env.storage().persistent().has(&batch_key) {
            return Err(Error::BatchExists);
        }

        let created_at = env.ledger().timestamp();
        let mut entries = Vec::new(&env);
        let mut total: i128 = 0;

        for i in 0..count {
            let recipient = recipients.get_unchecked(i);
            let amount = amounts.get_unchecked(i);
            let signature = signatures.get_unchecked(i);

            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }

            let claim_key: BytesN<20> = env
                .storage()
                .persistent()
                .get(&DataKey::ClaimKey(recipient.clone()))
                .ok_or(Error::NoClaimKey)?;
            let signer = auth::recover_signer(&env, &batch_id, &recipient, amount, &signature)?;
            if signer != claim_key {
                return Err(Error::SignerMismatch);
            }

            // Global replay set: a signature hash backs at most one admitted
            // entry across all batches, ever. Marking as we go also rejects
            // duplicates within this batch.
            let used_key = DataKey::UsedSig(auth::signature_hash(&env, &signature));
            if env.storage().persistent().has(&used_key) {
                return Err(Error::SignatureReplayed);
            }
            env.storage().persistent().set(&used_key, &true);
            env.storage()
                .persistent()
                .extend_ttl(&used_key, SIG_INDEX_TTL, SIG_INDEX_TTL);

            total = total.checked_add(amount).ok_or(Error::AmountOverflow)?;

            entries.push_back(Payment {
                recipient,
                amount,
                processed: false,
                created_at,
                signature,
            });
        }

        // Pull exactly the batch total from the operator. Failure aborts the
        // whole creation; the entries and used-signature marks above are
        // rolled back with the error.
        let token_client = token::Client::new(&env, &Self::token_internal(&env)?);
        if token_client
            .try_transfer(&operator, &env.current_contract_address(), &total)
            .is_err()
        {
            return Err(Error::TransferFailed);
        }

        env.storage().persistent().set(
            &batch_key,
            &Batch {
                entries,
                refunded: false,
            },
        );

        emit_batch_created(
            &env,
            BatchCreated {
                batch_id,
                count,
                total,
                operator,
            },
        );
        Ok(())
    }

    /// Pays out every unprocessed entry of an aged batch.
    ///
    /// Callable by anyone once at least one entry has aged past the dispute
    /// window. Per-entry transfer failures skip that entry only; a later call
    /// retries the remainder. Already-processed entries are silent no-ops, so
    /// repeated calls are free and never double-pay. Returns the sum actually
    /// moved in this call.
    pub fn process_batch(env: Env, batch_id: BytesN<32>) -> Result<i128, Error> {
        if Self::paused_internal(&env) {
            return Err(Error::ContractPaused);
        }
        let _guard = ReentrancyGuard::lock(&env)?;

        let batch_key = DataKey::Batch(batch_id.clone());
        let mut batch: Batch = env
            .storage()
            .persistent()
            .get(&batch_key)
            .ok_or(Error::BatchNotFound)?;
        if batch.refunded {
            return Err(Error::BatchClosed);
        }

        let now = env.ledger().timestamp();
        let any_aged = batch
            .entries
            .iter()
            .any(|entry| window_elapsed(&entry, now));
        if !any_aged {
            return Err(Error::WindowNotElapsed);
        }

        let token_client = token::Client::new(&env, &Self::token_internal(&env)?);
        let escrow = env.current_contract_address();
        let mut moved: i128 = 0;
        let mut paid: u32 = 0;

        for i in 0..batch.entries.len() {
            let mut entry = batch.entries.get_unchecked(i);
            if entry.processed {
                continue;
            }
            // A failing transfer must not block the rest of the batch; the
            // entry stays unprocessed and visible for a later retry.
            if token_client
                .try_transfer(&escrow, &entry.recipient, &entry.amount)
                .is_err()
            {
                continue;
            }

            entry.processed = true;
            batch.entries.set(i, entry.clone());
            credit_total_paid(&env, &entry.recipient, entry.amount)?;
            moved += entry.amount;
            paid += 1;

            emit_payment_processed(
                &env,
                PaymentProcessed {
                    batch_id: batch_id.clone(),
                    index: i,
                    recipient: entry.recipient,
                    amount: entry.amount,
                },
            );
        }

        if paid > 0 {
            env.storage().persistent().set(&batch_key, &batch);
            emit_batch_payout_completed(
                &env,
                BatchPayoutCompleted {
                    batch_id,
                    paid,
                    total: moved,
                },
            );
        }
        Ok(moved)
    }

    /// Pays out a single entry of an aged batch.
    ///
    /// Unlike the batch sweep, targeting an already-processed entry is an
    /// error: the caller named a specific payment, so silently doing nothing
    /// would mask a stale index.
    pub fn process_payment(env: Env, batch_id: BytesN<32>, index: u32) -> Result<(), Error> {
        if Self::paused_internal(&env) {
            return Err(Error::ContractPaused);
        }
        let _guard = ReentrancyGuard::lock(&env)?;

        let batch_key = DataKey::Batch(batch_id.clone());
        let mut batch: Batch = env
            .storage()
            .persistent()
            .get(&batch_key)
            .ok_or(Error::BatchNotFound)?;
        if batch.refunded {
            return Err(Error::BatchClosed);
        }
        if index >= batch.entries.len() {
            return Err(Error::PaymentNotFound);
        }

        let mut entry = batch.entries.get_unchecked(index);
        if entry.processed {
            return Err(Error::AlreadyProcessed);
        }
        if !window_elapsed(&entry, env.ledger().timestamp()) {
            return Err(Error::WindowNotElapsed);
        }

        let token_client = token::Client::new(&env, &Self::token_internal(&env)?);
        if token_client
            .try_transfer(&env.current_contract_address(), &entry.recipient, &entry.amount)
            .is_err()
        {
            return Err(Error::TransferFailed);
        }

        entry.processed = true;
        batch.entries.set(index, entry.clone());
        env.storage().persistent().set(&batch_key, &batch);
        credit_total_paid(&env, &entry.recipient, entry.amount)?;

        emit_payment_processed(
            &env,
            PaymentProcessed {
                batch_id,
                index,
                recipient: entry.recipient,
                amount: entry.amount,
            },
        );
        Ok(())
    }

    /// Records a recipient's objection to their own unprocessed entry.
    ///
    /// Advisory: emits a signal for off-chain handling but does not block
    /// processing. Deliberately available while paused so recipients can
    /// always raise their hand.
    pub fn dispute_payment(env: Env, batch_id: BytesN<32>, index: u32) -> Result<(), Error> {
        let batch: Batch = env
            .storage()
            .persistent()
            .get(&DataKey::Batch(batch_id.clone()))
            .ok_or(Error::BatchNotFound)?;
        if index >= batch.entries.len() {
            return Err(Error::PaymentNotFound);
        }

        let entry = batch.entries.get_unchecked(index);
        if entry.processed {
            return Err(Error::AlreadyProcessed);
        }
        entry.recipient.require_auth();

        emit_payment_disputed(
            &env,
            PaymentDisputed {
                batch_id,
                index,
                recipient: entry.recipient,
                amount: entry.amount,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    /// Sweeps all still-unprocessed funds of an aged batch back to the
    /// operator and closes the batch.
    ///
    /// Callable by anyone once the batch's first entry has aged past the
    /// dispute window; already-processed entries are untouched. Closing sets
    /// the terminal `refunded` flag, so later processing attempts fail with
    /// `BatchClosed` instead of racing funds that are no longer in escrow.
    /// Deliberately available while paused so a paused system can be exited.
    pub fn expire_batch(env: Env, batch_id: BytesN<32>) -> Result<i128, Error> {
        let _guard = ReentrancyGuard::lock(&env)?;

        let batch_key = DataKey::Batch(batch_id.clone());
        let mut batch: Batch = env
            .storage()
            .persistent()
            .get(&batch_key)
            .ok_or(Error::BatchNotFound)?;
        if batch.refunded {
            return Err(Error::BatchClosed);
        }

        // The first entry anchors the batch-wide aging test; all entries of a
        // batch share their creation timestamp.
        let anchor = batch.entries.get_unchecked(0);
        if !window_elapsed(&anchor, env.ledger().timestamp()) {
            return Err(Error::WindowNotElapsed);
        }

        let mut remainder: i128 = 0;
        for entry in batch.entries.iter() {
            if !entry.processed {
                remainder += entry.amount;
            }
        }

        let operator = Self::operator_internal(&env)?;
        if remainder > 0 {
            let token_client = token::Client::new(&env, &Self::token_internal(&env)?);
            if token_client
                .try_transfer(&env.current_contract_address(), &operator, &remainder)
                .is_err()
            {
                // Retryable: nothing has been committed yet.
                return Err(Error::TransferFailed);
            }
        }

        batch.refunded = true;
        env.storage().persistent().set(&batch_key, &batch);

        emit_batch_expired(
            &env,
            BatchExpired {
                batch_id,
                refunded: remainder,
                operator,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(remainder)
    }

    /// Operator-only. Disables `create_batch` and both processing entry
    /// points; disputes and expiry stay available.
    pub fn pause(env: Env) -> Result<(), Error> {
        Self::set_paused(env, true)
    }

    /// Operator-only.
    pub fn unpause(env: Env) -> Result<(), Error> {
        Self::set_paused(env, false)
    }

    // ---- Read-only surface -------------------------------------------------

    pub fn get_batch(env: Env, batch_id: BytesN<32>) -> Result<Batch, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Batch(batch_id))
            .ok_or(Error::BatchNotFound)
    }

    pub fn get_payment(env: Env, batch_id: BytesN<32>, index: u32) -> Result<Payment, Error> {
        let batch: Batch = env
            .storage()
            .persistent()
            .get(&DataKey::Batch(batch_id))
            .ok_or(Error::BatchNotFound)?;
        batch.entries.get(index).ok_or(Error::PaymentNotFound)
    }

    /// Entry count of a batch; 0 means the batch does not exist (batches are
    /// never deleted, so a nonzero count is permanent).
    pub fn batch_count(env: Env, batch_id: BytesN<32>) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::Batch(batch_id))
            .map_or(0, |batch: Batch| batch.entries.len())
    }

    pub fn batch_status(env: Env, batch_id: BytesN<32>) -> Result<BatchStatus, Error> {
        let batch: Batch = env
            .storage()
            .persistent()
            .get(&DataKey::Batch(batch_id))
            .ok_or(Error::BatchNotFound)?;
        if batch.refunded {
            return Ok(BatchStatus::Refunded);
        }
        let processed = batch.entries.iter().filter(|entry| entry.processed).count() as u32;
        Ok(if processed == 0 {
            BatchStatus::Open
        } else if processed == batch.entries.len() {
            BatchStatus::FullyProcessed
        } else {
            BatchStatus::PartiallyProcessed
        })
    }

    /// Whether a signature hash (keccak-256 of the 65 signature bytes) has
    /// ever backed an admitted entry.
    pub fn is_signature_used(env: Env, sig_hash: BytesN<32>) -> bool {
        env.storage().persistent().has(&DataKey::UsedSig(sig_hash))
    }

    /// Lifetime total successfully paid to a recipient, across all batches.
    pub fn total_paid(env: Env, recipient: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::TotalPaid(recipient))
            .unwrap_or(0)
    }

    pub fn get_claim_key(env: Env, recipient: Address) -> Option<BytesN<20>> {
        env.storage().persistent().get(&DataKey::ClaimKey(recipient))
    }

    pub fn is_paused(env: Env) -> bool {
        Self::paused_internal(&env)
    }

    pub fn get_operator(env: Env) -> Result<Address, Error> {
        Self::operator_internal(&env)
    }

    pub fn get_token(env: Env) -> Result<Address, Error> {
        Self::token_internal(&env)
    }

    /// Funding-token balance currently held in escrow.
    pub fn get_balance(env: Env) -> Result<i128, Error> {
        let token_client = token::Client::new(&env, &Self::token_internal(&env)?);
        Ok(token_client.balance(&env.current_contract_address()))
    }

    // ---- Internal ----------------------------------------------------------

    fn set_paused(env: Env, paused: bool) -> Result<(), Error> {
        let operator = Self::operator_internal(&env)?;
        operator.require_auth();

        env.storage().instance().set(&DataKey::Paused, &paused);
        emit_pause_toggled(
            &env,
            PauseToggled {
                operator,
                paused,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(())
    }

    fn operator_internal(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }

    fn token_internal(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Token)
            .ok_or(Error::NotInitialized)
    }

    fn paused_internal(env: &Env) -> bool {
        env.storage()
            .instance()
            .get(&DataKey::Paused)
            .unwrap_or(false)
    }
}

fn window_elapsed(entry: &Payment, now: u64) -> bool {
    now >= entry.created_at.saturating_add(DISPUTE_WINDOW)
}

fn credit_total_paid(env: &Env, recipient: &Address, amount: i128) -> Result<(), Error> {
    let key = DataKey::TotalPaid(recipient.clone());
    let current: i128 = env.storage().persistent().get(&key).unwrap_or(0);
    let updated = current.checked_add(amount).ok_or(Error::AmountOverflow)?;
    env.storage().persistent().set(&key, &updated);
    Ok(())
}
