//! Tests for the release chain: head authentication, member ordering,
//! tracked balances, nonces and the burn cutoff.

#![cfg(test)]

use crate::proof;
use crate::test_helpers::{self, advance_time, funded_user, hash, member, TestContext, WEEK};
use crate::{Error, Role, SlashMember};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{vec, Address, BytesN, Env, Vec};

/// One 100_000 self-stake slashed 50% under proof hash `hash(1)`.
fn slashed_stake<'a>(e: &Env, ctx: &TestContext<'a>) -> (Address, Vec<SlashMember>, BytesN<32>) {
    let user = funded_user(e, ctx, 100_000);
    let id = ctx.client.self_stake(&user, &100_000, &(12 * WEEK));
    let head = ctx.client.slash(&ctx.slasher, &vec![e, id], &50, &hash(e, 1));
    let members = vec![e, member(&ctx.client.get_stake(&id), 50_000)];
    (user, members, head)
}

#[test]
fn test_release_returns_funds_and_moves_head() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (user, members, head) = slashed_stake(&e, &ctx);
    let id = members.get(0).unwrap().stake_id;

    let new_head = ctx.client.release(
        &ctx.releaser,
        &members,
        &0,
        &500,
        &head,
        &hash(&e, 1),
        &hash(&e, 2),
    );

    assert_eq!(ctx.token.balance(&user), 500);
    assert_eq!(ctx.client.total_slashed(), 49_500);
    let stake = ctx.client.get_stake(&id);
    assert_eq!(stake.slashed_amount, 49_500);
    assert_eq!(stake.amount - stake.slashed_amount, 50_000);

    let updated = vec![&e, member(&stake, 49_500)];
    assert_eq!(new_head, proof::compute_head(&e, &updated, &hash(&e, 2)));
    assert!(ctx.client.is_proof_head_valid(&new_head));
    assert!(!ctx.client.is_proof_head_valid(&head));
}

#[test]
fn test_release_chain_continues_from_new_head() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (user, members, head) = slashed_stake(&e, &ctx);
    let stake = ctx.client.get_stake(&members.get(0).unwrap().stake_id);

    let head2 = ctx.client.release(
        &ctx.releaser,
        &members,
        &0,
        &500,
        &head,
        &hash(&e, 1),
        &hash(&e, 2),
    );
    let head3 = ctx.client.release(
        &ctx.releaser,
        &vec![&e, member(&stake, 49_500)],
        &0,
        &9_500,
        &head2,
        &hash(&e, 2),
        &hash(&e, 3),
    );

    assert!(ctx.client.is_proof_head_valid(&head3));
    assert_eq!(ctx.token.balance(&user), 10_000);
    assert_eq!(ctx.client.total_slashed(), 40_000);
}

#[test]
fn test_superseded_head_not_found() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);
    ctx.client.release(
        &ctx.releaser,
        &members,
        &0,
        &500,
        &head,
        &hash(&e, 1),
        &hash(&e, 2),
    );

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &0,
            &500,
            &head,
            &hash(&e, 1),
            &hash(&e, 3),
        ),
        Err(Ok(Error::SlashProofHashNotFound))
    );
}

#[test]
fn test_unknown_chain_not_found() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &Vec::new(&e),
            &0,
            &1,
            &hash(&e, 42),
            &hash(&e, 1),
            &hash(&e, 2),
        ),
        Err(Ok(Error::SlashProofHashNotFound))
    );
}

#[test]
fn test_swapped_member_order_not_valid() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let alice = funded_user(&e, &ctx, 1_000);
    let bob = funded_user(&e, &ctx, 1_000);
    let a = ctx.client.self_stake(&alice, &1_000, &WEEK);
    let b = ctx.client.self_stake(&bob, &1_000, &WEEK);
    let head = ctx
        .client
        .slash(&ctx.slasher, &vec![&e, a, b], &50, &hash(&e, 1));

    let ma = member(&ctx.client.get_stake(&a), 500);
    let mb = member(&ctx.client.get_stake(&b), 500);
    let swapped = vec![&e, mb, ma];

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &swapped,
            &0,
            &100,
            &head,
            &hash(&e, 1),
            &hash(&e, 2),
        ),
        Err(Ok(Error::SlashProofHashNotValid))
    );
}

#[test]
fn test_wrong_nonce_not_valid() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &0,
            &500,
            &head,
            &hash(&e, 9),
            &hash(&e, 2),
        ),
        Err(Ok(Error::SlashProofHashNotValid))
    );
}

#[test]
fn test_release_more_than_tracked_balance() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &0,
            &50_001,
            &head,
            &hash(&e, 1),
            &hash(&e, 2),
        ),
        Err(Ok(Error::FundsNotAvailableToRelease))
    );
    assert!(ctx.client.is_proof_head_valid(&head));
}

#[test]
fn test_release_index_out_of_range() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &1,
            &1,
            &head,
            &hash(&e, 1),
            &hash(&e, 2),
        ),
        Err(Ok(Error::InvalidMemberIndex))
    );
}

#[test]
fn test_release_requires_fresh_nonce() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &0,
            &500,
            &head,
            &hash(&e, 1),
            &hash(&e, 1),
        ),
        Err(Ok(Error::NonceAlreadyUsed))
    );
}

#[test]
fn test_release_requires_releaser_role() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);
    let stranger = Address::generate(&e);

    for caller in [ctx.slasher.clone(), stranger] {
        assert_eq!(
            ctx.client.try_release(
                &caller,
                &members,
                &0,
                &500,
                &head,
                &hash(&e, 1),
                &hash(&e, 2),
            ),
            Err(Ok(Error::Unauthorized))
        );
    }
    ctx.client.grant_role(&Role::Releaser, &ctx.slasher);
    ctx.client.release(
        &ctx.slasher,
        &members,
        &0,
        &500,
        &head,
        &hash(&e, 1),
        &hash(&e, 2),
    );
}

#[test]
fn test_burned_funds_cannot_be_released() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let (_user, members, head) = slashed_stake(&e, &ctx);
    ctx.client.burn(&ctx.slasher);
    advance_time(&e, WEEK);

    assert_eq!(
        ctx.client.try_release(
            &ctx.releaser,
            &members,
            &0,
            &500,
            &head,
            &hash(&e, 1),
            &hash(&e, 2),
        ),
        Err(Ok(Error::FundsNotAvailableToRelease))
    );
}

#[test]
fn test_release_member_list_slash() {
    let e = Env::default();
    let ctx = test_helpers::setup(&e);
    let alice = funded_user(&e, &ctx, 1_000);
    let bob = funded_user(&e, &ctx, 1_000);
    let c = ctx.client.community_stake(&bob, &alice, &1_000, &WEEK);
    let head = ctx.client.slash_members(
        &ctx.slasher,
        &Vec::new(&e),
        &vec![
            &e,
            crate::CommunitySlashMember {
                staker: bob.clone(),
                stakee: alice.clone(),
                stake_id: c,
                amount: 400,
            },
        ],
        &hash(&e, 5),
    );
    let members = vec![&e, member(&ctx.client.get_stake(&c), 400)];

    ctx.client.release(
        &ctx.releaser,
        &members,
        &0,
        &400,
        &head,
        &hash(&e, 5),
        &hash(&e, 6),
    );

    assert_eq!(ctx.token.balance(&bob), 400);
    assert_eq!(ctx.token.balance(&alice), 1_000);
    assert_eq!(ctx.client.get_stake(&c).slashed_amount, 0);
    assert_eq!(ctx.client.total_slashed(), 0);
}
