//! State cache, layered view and canonical in-memory store

use crate::error::StateResult;
use crate::traits::{Account, FeeAllowance, StateReader, StateWriter};
use flora_primitives::{Address, Coins};
use std::collections::HashMap;

type BalanceKey = (Address, String);
type AllowanceKey = (Address, Address);

/// In-memory state cache for batching changes
#[derive(Clone, Debug, Default)]
pub struct StateCache {
    /// Cached accounts
    accounts: HashMap<Address, Account>,
    /// Cached balances
    balances: HashMap<BalanceKey, u128>,
    /// Cached allowances (None = removed)
    allowances: HashMap<AllowanceKey, Option<FeeAllowance>>,
}

impl StateCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of cached account changes
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Get number of cached balance changes
    pub fn balance_count(&self) -> usize {
        self.balances.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.balances.is_empty() && self.allowances.is_empty()
    }
}

impl StateReader for StateCache {
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>> {
        Ok(self.accounts.get(address).cloned())
    }

    fn get_balance(&self, address: &Address, denom: &str) -> StateResult<u128> {
        Ok(self
            .balances
            .get(&(*address, denom.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn get_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
    ) -> StateResult<Option<FeeAllowance>> {
        Ok(self.allowances.get(&(*granter, *grantee)).cloned().flatten())
    }
}

impl StateWriter for StateCache {
    fn set_account(&mut self, account: Account) -> StateResult<()> {
        self.accounts.insert(account.address, account);
        Ok(())
    }

    fn set_balance(&mut self, address: Address, denom: &str, amount: u128) -> StateResult<()> {
        self.balances.insert((address, denom.to_string()), amount);
        Ok(())
    }

    fn set_allowance(
        &mut self,
        granter: Address,
        grantee: Address,
        allowance: Option<FeeAllowance>,
    ) -> StateResult<()> {
        self.allowances.insert((granter, grantee), allowance);
        Ok(())
    }
}

/// Layered state with fallback to an underlying snapshot.
///
/// Writes land in the cache only; dropping the view discards them.
pub struct CachedState<'a> {
    cache: StateCache,
    underlying: &'a dyn StateReader,
}

impl<'a> CachedState<'a> {
    /// Create a new cached state layer
    pub fn new(underlying: &'a dyn StateReader) -> Self {
        Self {
            cache: StateCache::new(),
            underlying,
        }
    }

    /// Get the cache
    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    /// Take ownership of the cache
    pub fn into_cache(self) -> StateCache {
        self.cache
    }
}

impl StateReader for CachedState<'_> {
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>> {
        if let Some(cached) = self.cache.accounts.get(address) {
            return Ok(Some(cached.clone()));
        }
        self.underlying.get_account(address)
    }

    fn get_balance(&self, address: &Address, denom: &str) -> StateResult<u128> {
        if let Some(cached) = self.cache.balances.get(&(*address, denom.to_string())) {
            return Ok(*cached);
        }
        self.underlying.get_balance(address, denom)
    }

    fn get_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
    ) -> StateResult<Option<FeeAllowance>> {
        if let Some(cached) = self.cache.allowances.get(&(*granter, *grantee)) {
            return Ok(cached.clone());
        }
        self.underlying.get_allowance(granter, grantee)
    }
}

impl StateWriter for CachedState<'_> {
    fn set_account(&mut self, account: Account) -> StateResult<()> {
        self.cache.set_account(account)
    }

    fn set_balance(&mut self, address: Address, denom: &str, amount: u128) -> StateResult<()> {
        self.cache.set_balance(address, denom, amount)
    }

    fn set_allowance(
        &mut self,
        granter: Address,
        grantee: Address,
        allowance: Option<FeeAllowance>,
    ) -> StateResult<()> {
        self.cache.set_allowance(granter, grantee, allowance)
    }
}

/// Canonical in-memory state
#[derive(Clone, Debug, Default)]
pub struct MemoryState {
    accounts: HashMap<Address, Account>,
    balances: HashMap<BalanceKey, u128>,
    allowances: HashMap<AllowanceKey, FeeAllowance>,
    next_account_number: u64,
}

impl MemoryState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account under the next account number, or return the
    /// existing one
    pub fn create_account(&mut self, address: Address) -> Account {
        if let Some(account) = self.accounts.get(&address) {
            return account.clone();
        }
        let account = Account::new(address, self.next_account_number);
        self.next_account_number += 1;
        self.accounts.insert(address, account.clone());
        account
    }

    /// Credit `amount` to `address`
    pub fn fund(&mut self, address: Address, amount: &Coins) -> StateResult<()> {
        for coin in amount {
            self.add_balance(&address, coin)?;
        }
        Ok(())
    }

    /// Number of accounts
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Apply a write set
    pub fn commit(&mut self, cache: StateCache) {
        self.accounts.extend(cache.accounts);
        for (key, amount) in cache.balances {
            if amount == 0 {
                self.balances.remove(&key);
            } else {
                self.balances.insert(key, amount);
            }
        }
        for (key, allowance) in cache.allowances {
            match allowance {
                Some(allowance) => {
                    self.allowances.insert(key, allowance);
                }
                None => {
                    self.allowances.remove(&key);
                }
            }
        }
    }
}

impl StateReader for MemoryState {
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>> {
        Ok(self.accounts.get(address).cloned())
    }

    fn get_balance(&self, address: &Address, denom: &str) -> StateResult<u128> {
        Ok(self
            .balances
            .get(&(*address, denom.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn get_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
    ) -> StateResult<Option<FeeAllowance>> {
        Ok(self.allowances.get(&(*granter, *grantee)).cloned())
    }
}

impl StateWriter for MemoryState {
    fn set_account(&mut self, account: Account) -> StateResult<()> {
        self.next_account_number = self.next_account_number.max(account.account_number + 1);
        self.accounts.insert(account.address, account);
        Ok(())
    }

    fn set_balance(&mut self, address: Address, denom: &str, amount: u128) -> StateResult<()> {
        let key = (address, denom.to_string());
        if amount == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, amount);
        }
        Ok(())
    }

    fn set_allowance(
        &mut self,
        granter: Address,
        grantee: Address,
        allowance: Option<FeeAllowance>,
    ) -> StateResult<()> {
        match allowance {
            Some(allowance) => {
                self.allowances.insert((granter, grantee), allowance);
            }
            None => {
                self.allowances.remove(&(granter, grantee));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use flora_primitives::Coin;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn funded() -> MemoryState {
        let mut state = MemoryState::new();
        state.create_account(addr(1));
        state.fund(addr(1), &Coins::single("petal", 100)).unwrap();
        state
    }

    #[test]
    fn test_account_numbers() {
        let mut state = MemoryState::new();
        assert_eq!(state.create_account(addr(1)).account_number, 0);
        assert_eq!(state.create_account(addr(2)).account_number, 1);
        assert_eq!(state.create_account(addr(1)).account_number, 0);
        assert_eq!(state.account_count(), 2);
    }

    #[test]
    fn test_state_cache() {
        let mut cache = StateCache::new();
        cache.set_account(Account::new(addr(1), 0)).unwrap();
        cache.set_balance(addr(1), "petal", 5).unwrap();

        assert_eq!(cache.account_count(), 1);
        assert_eq!(cache.balance_count(), 1);
        assert_eq!(cache.get_balance(&addr(1), "petal").unwrap(), 5);
        assert!(!cache.is_empty());
        assert!(StateCache::new().is_empty());
    }

    #[test]
    fn test_cached_state_layering() {
        let state = funded();
        let mut cached = CachedState::new(&state);

        assert_eq!(cached.get_balance(&addr(1), "petal").unwrap(), 100);
        cached.send_coins(&addr(1), &addr(2), &Coins::single("petal", 40)).unwrap();
        assert_eq!(cached.increment_sequence(&addr(1)).unwrap(), 1);

        assert_eq!(cached.get_balance(&addr(1), "petal").unwrap(), 60);
        assert_eq!(cached.get_balance(&addr(2), "petal").unwrap(), 40);

        // underlying unchanged
        assert_eq!(state.get_balance(&addr(1), "petal").unwrap(), 100);
        assert_eq!(state.get_sequence(&addr(1)).unwrap(), 0);
    }

    #[test]
    fn test_send_coins_all_or_nothing() {
        let state = funded();
        let mut cached = CachedState::new(&state);
        let amount = Coins::normalized(vec![Coin::new("petal", 10), Coin::new("uatom", 1)]).unwrap();

        let err = cached.send_coins(&addr(1), &addr(2), &amount).unwrap_err();
        assert!(matches!(err, StateError::InsufficientFunds { available: 0, .. }));
        assert!(cached.cache().is_empty());
    }

    #[test]
    fn test_increment_unknown_account() {
        let state = MemoryState::new();
        let mut cached = CachedState::new(&state);
        assert_eq!(
            cached.increment_sequence(&addr(9)),
            Err(StateError::UnknownAccount(addr(9)))
        );
    }

    #[test]
    fn test_commit_cache() {
        let mut state = funded();
        state
            .set_allowance(addr(1), addr(2), Some(FeeAllowance::default()))
            .unwrap();

        let cache = {
            let mut cached = CachedState::new(&state);
            cached.sub_balance(&addr(1), &Coin::new("petal", 100)).unwrap();
            cached.increment_sequence(&addr(1)).unwrap();
            cached.set_allowance(addr(1), addr(2), None).unwrap();
            cached.into_cache()
        };
        state.commit(cache);

        assert_eq!(state.get_balance(&addr(1), "petal").unwrap(), 0);
        assert_eq!(state.get_sequence(&addr(1)).unwrap(), 1);
        assert!(state.get_allowance(&addr(1), &addr(2)).unwrap().is_none());
    }
}
