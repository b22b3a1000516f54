// Invariant checkers for the distributor, run from tests after mutations.

use crate::{Batch, PaymentDistributorClient};
use soroban_sdk::{token, BytesN};

/// Solvency: escrow balance covers every unprocessed entry of every open
/// batch, system-wide.
pub fn check_solvency(
    distributor: &PaymentDistributorClient,
    token_client: &token::Client,
    batch_ids: &[BytesN<32>],
) {
    let mut owed: i128 = 0;
    for batch_id in batch_ids {
        let batch = distributor.get_batch(batch_id);
        if batch.refunded {
            continue;
        }
        for entry in batch.entries.iter() {
            if !entry.processed {
                owed += entry.amount;
            }
        }
    }

    let balance = token_client.balance(&distributor.address);
    assert!(
        owed <= balance,
        "Solvency violated: unprocessed entries owe {} but escrow holds {}",
        owed,
        balance
    );
}

/// Processed flags only ever transition false -> true.
pub fn check_processed_monotonic(before: &Batch, after: &Batch, operation: &str) {
    for (prev, next) in before.entries.iter().zip(after.entries.iter()) {
        assert!(
            !(prev.processed && !next.processed),
            "Processed flag regressed during {} (recipient {:?})",
            operation,
            prev.recipient
        );
    }
}

/// Recipient, amount, creation time and signature are fixed at creation.
pub fn check_entries_immutable(before: &Batch, after: &Batch, operation: &str) {
    assert_eq!(
        before.entries.len(),
        after.entries.len(),
        "Entry count changed during {}",
        operation
    );
    for (prev, next) in before.entries.iter().zip(after.entries.iter()) {
        assert_eq!(prev.recipient, next.recipient, "Recipient changed during {}", operation);
        assert_eq!(prev.amount, next.amount, "Amount changed during {}", operation);
        assert_eq!(
            prev.created_at, next.created_at,
            "Creation time changed during {}",
            operation
        );
        assert_eq!(
            prev.signature, next.signature,
            "Signature changed during {}",
            operation
        );
    }
}

/// A refunded batch stays refunded.
pub fn check_refunded_terminal(before: &Batch, after: &Batch, operation: &str) {
    assert!(
        !(before.refunded && !after.refunded),
        "Refunded flag cleared during {}",
        operation
    );
}

/// All admitted amounts are positive.
pub fn check_amounts_positive(batch: &Batch) {
    for entry in batch.entries.iter() {
        assert!(
            entry.amount > 0,
            "Admitted entry carries non-positive amount {}",
            entry.amount
        );
    }
}

/// Composite checker comparing a batch before and after one operation.
pub fn verify_batch_invariants(before: &Option<Batch>, after: &Batch, operation: &str) {
    check_amounts_positive(after);
    if let Some(before) = before {
        check_processed_monotonic(before, after, operation);
        check_entries_immutable(before, after, operation);
        check_refunded_terminal(before, after, operation);
    }
}
