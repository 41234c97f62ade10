//! State access traits

use crate::error::{StateError, StateResult};
use flora_crypto::PublicKey;
use flora_primitives::{Address, BlockHeight, Coin, Coins, Sequence};

/// Account data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account address
    pub address: Address,
    /// Public key, unset until the account first signs
    pub public_key: Option<PublicKey>,
    /// Number assigned at account creation
    pub account_number: u64,
    /// Replay-protection counter
    pub sequence: Sequence,
}

impl Account {
    /// Create an account with no key and sequence 0
    pub fn new(address: Address, account_number: u64) -> Self {
        Self {
            address,
            public_key: None,
            account_number,
            sequence: 0,
        }
    }
}

/// Allowance letting a grantee spend a granter's funds on fees
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeAllowance {
    /// Remaining spendable amount (`None` = unlimited)
    pub spend_limit: Option<Coins>,
    /// Last height at which the allowance is usable (`None` = never expires)
    pub expiration: Option<BlockHeight>,
    /// Message types the allowance pays for (empty = any)
    pub allowed_messages: Vec<String>,
}

impl FeeAllowance {
    /// Check if the allowance has expired at `height`
    pub fn is_expired(&self, height: BlockHeight) -> bool {
        self.expiration.is_some_and(|exp| height > exp)
    }

    /// Check that every message type is covered
    pub fn allows_messages<'a>(&self, mut type_urls: impl Iterator<Item = &'a str>) -> bool {
        self.allowed_messages.is_empty()
            || type_urls.all(|url| self.allowed_messages.iter().any(|allowed| allowed == url))
    }
}

/// Read access to state
pub trait StateReader {
    /// Get account by address
    fn get_account(&self, address: &Address) -> StateResult<Option<Account>>;

    /// Get balance of one denom
    fn get_balance(&self, address: &Address, denom: &str) -> StateResult<u128>;

    /// Get the allowance `granter` gave `grantee`
    fn get_allowance(&self, granter: &Address, grantee: &Address)
        -> StateResult<Option<FeeAllowance>>;

    /// Get account sequence
    fn get_sequence(&self, address: &Address) -> StateResult<Sequence> {
        self.get_account(address)?
            .map(|a| a.sequence)
            .ok_or(StateError::UnknownAccount(*address))
    }
}

/// Write access to state
pub trait StateWriter: StateReader {
    /// Set account
    fn set_account(&mut self, account: Account) -> StateResult<()>;

    /// Set balance of one denom
    fn set_balance(&mut self, address: Address, denom: &str, amount: u128) -> StateResult<()>;

    /// Set or remove (`None`) an allowance
    fn set_allowance(
        &mut self,
        granter: Address,
        grantee: Address,
        allowance: Option<FeeAllowance>,
    ) -> StateResult<()>;

    /// Increment sequence, returning the new value
    fn increment_sequence(&mut self, address: &Address) -> StateResult<Sequence> {
        let mut account = self
            .get_account(address)?
            .ok_or(StateError::UnknownAccount(*address))?;
        account.sequence = account
            .sequence
            .checked_add(1)
            .ok_or(StateError::Overflow("sequence"))?;
        let new_sequence = account.sequence;
        self.set_account(account)?;
        Ok(new_sequence)
    }

    /// Add to balance
    fn add_balance(&mut self, address: &Address, coin: &Coin) -> StateResult<()> {
        let balance = self.get_balance(address, &coin.denom)?;
        let balance = balance
            .checked_add(coin.amount)
            .ok_or(StateError::Overflow("balance"))?;
        self.set_balance(*address, &coin.denom, balance)
    }

    /// Subtract from balance
    fn sub_balance(&mut self, address: &Address, coin: &Coin) -> StateResult<()> {
        let balance = self.get_balance(address, &coin.denom)?;
        if balance < coin.amount {
            return Err(StateError::InsufficientFunds {
                address: *address,
                denom: coin.denom.clone(),
                needed: coin.amount,
                available: balance,
            });
        }
        self.set_balance(*address, &coin.denom, balance - coin.amount)
    }

    /// Move `amount` from `from` to `to`; nothing is written unless every
    /// denom is covered
    fn send_coins(&mut self, from: &Address, to: &Address, amount: &Coins) -> StateResult<()> {
        for coin in amount {
            let available = self.get_balance(from, &coin.denom)?;
            if available < coin.amount {
                return Err(StateError::InsufficientFunds {
                    address: *from,
                    denom: coin.denom.clone(),
                    needed: coin.amount,
                    available,
                });
            }
        }
        for coin in amount {
            self.sub_balance(from, coin)?;
            self.add_balance(to, coin)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new(Address::from_bytes([1; 20]), 7);
        assert_eq!(account.sequence, 0);
        assert_eq!(account.account_number, 7);
        assert!(account.public_key.is_none());
    }

    #[test]
    fn test_allowance_expiration() {
        let allowance = FeeAllowance {
            expiration: Some(10),
            ..Default::default()
        };
        assert!(!allowance.is_expired(10));
        assert!(allowance.is_expired(11));
        assert!(!FeeAllowance::default().is_expired(u64::MAX));
    }

    #[test]
    fn test_allowance_messages() {
        let open = FeeAllowance::default();
        assert!(open.allows_messages(["/a", "/b"].into_iter()));

        let restricted = FeeAllowance {
            allowed_messages: vec!["/a".into()],
            ..Default::default()
        };
        assert!(restricted.allows_messages(["/a", "/a"].into_iter()));
        assert!(!restricted.allows_messages(["/a", "/b"].into_iter()));
    }
}
