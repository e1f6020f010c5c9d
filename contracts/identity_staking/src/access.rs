//! Role gate: admin-managed capability table `(account, role) -> bool`.
//!
//! Every mutating slashing, release and burn entry point calls
//! [`require_any_role`] before reading any ledger state.

use soroban_sdk::{Address, Env};

use crate::events::{RoleGranted, RoleRevoked};
use crate::types::Role;
use crate::{DataKey, Error};

/// Returns the admin, or `NotInitialized` before `initialize`.
pub fn get_admin(e: &Env) -> Result<Address, Error> {
    e.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

/// Authenticates the stored admin.
pub fn require_admin(e: &Env) -> Result<Address, Error> {
    let admin = get_admin(e)?;
    admin.require_auth();
    Ok(admin)
}

#[must_use]
pub fn has_role(e: &Env, account: &Address, role: Role) -> bool {
    e.storage()
        .persistent()
        .get(&DataKey::Role(account.clone(), role))
        .unwrap_or(false)
}

pub fn grant_role(e: &Env, role: Role, account: &Address) -> Result<(), Error> {
    require_admin(e)?;
    if has_role(e, account, role) {
        return Ok(());
    }
    e.storage()
        .persistent()
        .set(&DataKey::Role(account.clone(), role), &true);
    RoleGranted {
        account: account.clone(),
        role,
    }
    .publish(e);
    Ok(())
}

pub fn revoke_role(e: &Env, role: Role, account: &Address) -> Result<(), Error> {
    require_admin(e)?;
    if !has_role(e, account, role) {
        return Ok(());
    }
    e.storage()
        .persistent()
        .remove(&DataKey::Role(account.clone(), role));
    RoleRevoked {
        account: account.clone(),
        role,
    }
    .publish(e);
    Ok(())
}

/// Authenticates `caller` and checks it holds at least one of `roles`.
pub fn require_any_role(e: &Env, caller: &Address, roles: &[Role]) -> Result<(), Error> {
    caller.require_auth();
    if roles.iter().any(|role| has_role(e, caller, *role)) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}
