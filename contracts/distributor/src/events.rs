//! Observable signals emitted by the distributor.
//!
//! Events are the only way off-chain tooling (indexers, dashboards) learns
//! about outcomes; every state transition publishes one.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

#[contracttype]
#[derive(Clone, Debug)]
pub struct DistributorInitialized {
    pub operator: Address,
    pub token: Address,
    pub timestamp: u64,
}

pub fn emit_initialized(env: &Env, event: DistributorInitialized) {
    env.events().publish((symbol_short!("init"),), event);
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ClaimKeyRegistered {
    pub recipient: Address,
    pub key: BytesN<20>,
}

pub fn emit_claim_key_registered(env: &Env, event: ClaimKeyRegistered) {
    env.events().publish((symbol_short!("key_reg"),), event);
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BatchCreated {
    pub batch_id: BytesN<32>,
    pub count: u32,
    pub total: i128,
    pub operator: Address,
}

pub fn emit_batch_created(env: &Env, event: BatchCreated) {
    env.events().publish((symbol_short!("batch_new"),), event);
}

/// One entry paid out; fires per entry, for both batch and single processing.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentProcessed {
    pub batch_id: BytesN<32>,
    pub index: u32,
    pub recipient: Address,
    pub amount: i128,
}

pub fn emit_payment_processed(env: &Env, event: PaymentProcessed) {
    env.events().publish((symbol_short!("pay_done"),), event);
}

/// Fires once per `process_batch` call that paid at least one entry, with the
/// sum actually moved in that call.
#[contracttype]
#[derive(Clone, Debug)]
pub struct BatchPayoutCompleted {
    pub batch_id: BytesN<32>,
    pub paid: u32,
    pub total: i128,
}

pub fn emit_batch_payout_completed(env: &Env, event: BatchPayoutCompleted) {
    env.events().publish((symbol_short!("batch_out"),), event);
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BatchExpired {
    pub batch_id: BytesN<32>,
    pub refunded: i128,
    pub operator: Address,
    pub timestamp: u64,
}

pub fn emit_batch_expired(env: &Env, event: BatchExpired) {
    env.events().publish((symbol_short!("batch_exp"),), event);
}

/// Advisory: a recipient contested their entry. Processing is not halted.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentDisputed {
    pub batch_id: BytesN<32>,
    pub index: u32,
    pub recipient: Address,
    pub amount: i128,
    pub timestamp: u64,
}

pub fn emit_payment_disputed(env: &Env, event: PaymentDisputed) {
    env.events().publish((symbol_short!("disputed"),), event);
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PauseToggled {
    pub operator: Address,
    pub paused: bool,
    pub timestamp: u64,
}

pub fn emit_pause_toggled(env: &Env, event: PauseToggled) {
    env.events().publish((symbol_short!("paused"),), event);
}
