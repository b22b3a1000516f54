//! Ledger time manipulation helpers.

use soroban_sdk::{testutils::Ledger, Env};

/// Current ledger timestamp.
pub fn current_time(env: &Env) -> u64 {
    env.ledger().timestamp()
}

/// Advances the ledger timestamp by `seconds`.
pub fn advance_time(env: &Env, seconds: u64) {
    let current = env.ledger().timestamp();
    env.ledger().set_timestamp(current + seconds);
}

/// Sets the ledger timestamp to an absolute value.
pub fn set_time(env: &Env, timestamp: u64) {
    env.ledger().set_timestamp(timestamp);
}
