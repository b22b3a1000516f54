//! Reentrancy guard for operations that move funds out of escrow.
//!
//! Token transfers are external calls; a malicious token could call back into
//! the distributor before `processed` flags are committed and observe
//! pre-transfer state. Every outbound-transfer operation holds this guard for
//! its full duration, so the reentrant call fails with `ReentrantCall`
//! instead of double-paying.

use soroban_sdk::{symbol_short, Env, Symbol};

use crate::Error;

const GUARD_KEY: Symbol = symbol_short!("RE_GUARD");

/// RAII guard over a "currently executing" storage flag. Acquired before the
/// first external transfer, released on drop (including the error paths).
pub struct ReentrancyGuard<'a> {
    env: &'a Env,
}

impl<'a> ReentrancyGuard<'a> {
    pub fn lock(env: &'a Env) -> Result<Self, Error> {
        let locked: bool = env.storage().instance().get(&GUARD_KEY).unwrap_or(false);
        if locked {
            return Err(Error::ReentrantCall);
        }
        env.storage().instance().set(&GUARD_KEY, &true);
        Ok(Self { env })
    }

    pub fn is_locked(env: &Env) -> bool {
        env.storage().instance().get(&GUARD_KEY).unwrap_or(false)
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.env.storage().instance().set(&GUARD_KEY, &false);
    }
}
