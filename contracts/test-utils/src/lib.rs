//! Shared helpers for distributor contract tests.
//!
//! - [`time`] - ledger time manipulation (advancing past the dispute window)
//! - [`balances`] - token balance assertions
//! - [`signing`] - deterministic secp256k1 test signers producing the
//!   `r || s || v` signatures the contract recovers

pub mod balances;
pub mod signing;
pub mod time;

pub use balances::*;
pub use signing::*;
pub use time::*;
