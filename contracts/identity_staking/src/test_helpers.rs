//! Shared setup for the contract tests: a registered ledger, a Stellar asset
//! as staking token, and one slasher and one releaser.

#![cfg(test)]

use crate::{IdentityStaking, IdentityStakingClient, Role, SlashMember, Stake};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, BytesN, Env};

pub const DAY: u64 = 24 * 60 * 60;
pub const WEEK: u64 = 7 * DAY;

pub struct TestContext<'a> {
    pub client: IdentityStakingClient<'a>,
    pub contract: Address,
    pub admin: Address,
    pub slasher: Address,
    pub releaser: Address,
    pub token: token::Client<'a>,
    pub token_admin: token::StellarAssetClient<'a>,
}

pub fn setup(e: &Env) -> TestContext<'_> {
    e.mock_all_auths();
    let admin = Address::generate(e);
    let issuer = Address::generate(e);
    let token_id = e.register_stellar_asset_contract_v2(issuer).address();

    let contract = e.register(IdentityStaking, ());
    let client = IdentityStakingClient::new(e, &contract);
    client.initialize(&admin, &token_id);

    let slasher = Address::generate(e);
    let releaser = Address::generate(e);
    client.grant_role(&Role::Slasher, &slasher);
    client.grant_role(&Role::Releaser, &releaser);

    TestContext {
        client,
        contract,
        admin,
        slasher,
        releaser,
        token: token::Client::new(e, &token_id),
        token_admin: token::StellarAssetClient::new(e, &token_id),
    }
}

/// A fresh identity holding `amount` staking tokens.
pub fn funded_user(e: &Env, ctx: &TestContext, amount: i128) -> Address {
    let user = Address::generate(e);
    ctx.token_admin.mint(&user, &amount);
    user
}

/// Deterministic 32-byte value for proof hashes, nonces and roots.
pub fn hash(e: &Env, seed: u8) -> BytesN<32> {
    BytesN::from_array(e, &[seed; 32])
}

pub fn advance_time(e: &Env, seconds: u64) {
    e.ledger().with_mut(|li| li.timestamp += seconds);
}

/// Member entry for the slashed part of `stake`, as committed in a chain head.
pub fn member(stake: &Stake, amount: i128) -> SlashMember {
    SlashMember {
        staker: stake.staker.clone(),
        stakee: stake.stakee.clone(),
        stake_id: stake.id,
        amount,
    }
}
