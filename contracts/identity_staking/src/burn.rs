//! Burn scheduler: sweeps the whole unreleased slashed pool at most once per
//! `BURN_ROUND_MIN_DURATION`.

use soroban_sdk::{Address, Env};

use crate::access;
use crate::events::SlashedBurned;
use crate::ledger;
use crate::slashing;
use crate::types::Role;
use crate::{DataKey, Error};

/// Minimum time between two successful burns (91 days).
pub const BURN_ROUND_MIN_DURATION: u64 = 91 * 24 * 60 * 60;

#[must_use]
pub fn last_burn_timestamp(e: &Env) -> Option<u64> {
    e.storage().instance().get(&DataKey::LastBurnTimestamp)
}

/// Number of successful burns so far. Release chains opened in an older
/// epoch refer to funds that no longer exist.
#[must_use]
pub fn burn_epoch(e: &Env) -> u32 {
    e.storage().instance().get(&DataKey::BurnEpoch).unwrap_or(0)
}

/// Burns the slashed pool and returns the burned amount. The first burn is
/// never gated; later ones need the cooldown to have elapsed in full.
pub fn burn(e: &Env, caller: &Address) -> Result<i128, Error> {
    access::require_any_role(e, caller, &[Role::Slasher, Role::Releaser])?;

    let now = e.ledger().timestamp();
    if let Some(last) = last_burn_timestamp(e) {
        if now < last.saturating_add(BURN_ROUND_MIN_DURATION) {
            return Err(Error::MinimumBurnRoundDurationNotMet);
        }
    }
    let token = ledger::token_client(e)?;
    let epoch = burn_epoch(e)
        .checked_add(1)
        .ok_or(Error::ArithmeticOverflow)?;
    let amount = ledger::total_slashed(e);

    ledger::set_total_slashed(e, 0);
    slashing::seal_rounds(e);
    e.storage().instance().set(&DataKey::LastBurnTimestamp, &now);
    e.storage().instance().set(&DataKey::BurnEpoch, &epoch);

    if amount > 0 {
        token.burn(&e.current_contract_address(), &amount);
    }
    SlashedBurned {
        amount,
        timestamp: now,
    }
    .publish(e);
    Ok(amount)
}
