#![cfg(test)]

use super::*;
use soroban_sdk::{
    testutils::{Address as _, Events},
    token, vec, Address, BytesN, Env,
};
use test_utils::{advance_time, assert_balance, TestSigner};

fn create_token_contract<'a>(
    e: &Env,
    admin: &Address,
) -> (Address, token::Client<'a>, token::StellarAssetClient<'a>) {
    let stellar_asset = e.register_stellar_asset_contract_v2(admin.clone());
    let token_address = stellar_asset.address();
    (
        token_address.clone(),
        token::Client::new(e, &token_address),
        token::StellarAssetClient::new(e, &token_address),
    )
}

struct TestSetup<'a> {
    env: Env,
    operator: Address,
    recipient: Address,
    signer: TestSigner,
    token: token::Client<'a>,
    distributor: PaymentDistributorClient<'a>,
}

impl TestSetup<'_> {
    fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();

        let operator = Address::generate(&env);
        let recipient = Address::generate(&env);

        let (token_address, token, token_admin) = create_token_contract(&env, &operator);
        let contract_id = env.register_contract(None, PaymentDistributor);
        let distributor = PaymentDistributorClient::new(&env, &contract_id);

        distributor.init(&operator, &token_address);
        token_admin.mint(&operator, &1_000_000);

        let signer = TestSigner::from_seed(3);
        let pubkey = BytesN::from_array(&env, &signer.public_key());
        let key = env.as_contract(&contract_id, || crate::auth::pubkey_identity(&env, &pubkey));
        distributor.register_claim_key(&recipient, &key);

        Self {
            env,
            operator,
            recipient,
            signer,
            token,
            distributor,
        }
    }

    fn create_batch(&self, seed: u8, amount: i128) -> BytesN<32> {
        let batch_id = BytesN::from_array(&self.env, &[seed; 32]);
        let digest: [u8; 32] = self.env.as_contract(&self.distributor.address, || {
            crate::auth::payment_digest(&self.env, &batch_id, &self.recipient, amount).to_array()
        });
        let signature = BytesN::from_array(&self.env, &self.signer.sign_prehash(&digest));

        let recipients = vec![&self.env, self.recipient.clone()];
        let amounts = vec![&self.env, amount];
        let signatures = vec![&self.env, signature];
        self.distributor
            .create_batch(&batch_id, &recipients, &amounts, &signatures);
        batch_id
    }
}

#[test]
fn test_dispute_is_advisory() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);

    setup.distributor.dispute_payment(&batch_id, &0);
    // The dispute published a signal...
    assert!(!setup.env.events().all().is_empty());
    // ...but changed nothing: the entry is still open and still pays out.
    assert!(!setup.distributor.get_payment(&batch_id, &0).processed);

    advance_time(&setup.env, DISPUTE_WINDOW);
    assert_eq!(setup.distributor.process_batch(&batch_id), 500);
    assert_balance(&setup.token, &setup.recipient, 500);
}

#[test]
fn test_dispute_allowed_any_time_before_processing() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);

    // Even after the window has elapsed, an unprocessed entry can still be
    // contested; the window gates payout, it is not a dispute deadline.
    advance_time(&setup.env, DISPUTE_WINDOW * 3);
    setup.distributor.dispute_payment(&batch_id, &0);
}

#[test]
#[should_panic(expected = "Error(Contract, #18)")]
fn test_dispute_after_processing_rejected() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);

    advance_time(&setup.env, DISPUTE_WINDOW);
    setup.distributor.process_batch(&batch_id);
    setup.distributor.dispute_payment(&batch_id, &0);
}

#[test]
#[should_panic(expected = "Error(Contract, #8)")]
fn test_dispute_unknown_batch() {
    let setup = TestSetup::new();
    let missing = BytesN::from_array(&setup.env, &[9u8; 32]);
    setup.distributor.dispute_payment(&missing, &0);
}

#[test]
#[should_panic(expected = "Error(Contract, #9)")]
fn test_dispute_out_of_range_index() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);
    setup.distributor.dispute_payment(&batch_id, &3);
}

#[test]
fn test_dispute_available_while_paused() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);

    setup.distributor.pause();
    setup.distributor.dispute_payment(&batch_id, &0);
    assert!(setup.distributor.is_paused());
}

#[test]
fn test_dispute_after_expiry_still_possible() {
    let setup = TestSetup::new();
    let batch_id = setup.create_batch(1, 500);

    advance_time(&setup.env, DISPUTE_WINDOW);
    assert_eq!(setup.distributor.expire_batch(&batch_id), 500);
    assert_balance(&setup.token, &setup.operator, 1_000_000);

    // The entry was never processed, so the recipient can still signal.
    setup.distributor.dispute_payment(&batch_id, &0);
}
