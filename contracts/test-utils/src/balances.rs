//! Token balance assertions.

use soroban_sdk::{token, Address};

/// Asserts that `address`'s balance moved by exactly `expected_change` from
/// `initial_balance` and returns the new balance.
pub fn verify_balance_change(
    token_client: &token::Client,
    address: &Address,
    initial_balance: i128,
    expected_change: i128,
) -> i128 {
    let new_balance = token_client.balance(address);
    let actual_change = new_balance - initial_balance;

    assert_eq!(
        actual_change, expected_change,
        "Expected balance change of {} for {:?}, got {} (initial: {}, new: {})",
        expected_change, address, actual_change, initial_balance, new_balance
    );

    new_balance
}

/// Asserts an exact balance.
pub fn assert_balance(token_client: &token::Client, address: &Address, expected: i128) {
    let balance = token_client.balance(address);
    assert_eq!(
        balance, expected,
        "Expected {:?} to hold {}, got {}",
        address, expected, balance
    );
}
