//! Collaborators consumed by the stages, and their default implementations.
//!
//! Keepers that touch accounts, balances or allowances take the run's
//! isolated state view as an argument so every write lands in the
//! per-transaction cache.

use crate::error::{AnteError, AnteResult};
use dashmap::DashSet;
use flora_crypto::sha256;
use flora_primitives::{Address, BlockHeight, Coins, Dec, Gas};
use flora_state::{Account, StateReader, StateWriter};
use flora_types::{Msg, Packet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Module account receiving transaction fees
pub const FEE_COLLECTOR: &str = "fee_collector";

/// Address of a module account
pub fn module_address(name: &str) -> Address {
    Address::from_digest(sha256(name.as_bytes()).as_bytes())
}

/// Auth module parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthParams {
    /// Maximum memo length in UTF-8 bytes
    pub max_memo_characters: u64,
    /// Maximum leaf signatures per transaction
    pub tx_sig_limit: u64,
    /// Gas charged per encoded transaction byte
    pub tx_size_cost_per_byte: Gas,
    /// Gas per secp256k1 verification
    pub sig_verify_cost_secp256k1: Gas,
    /// Gas per eth_secp256k1 verification
    pub sig_verify_cost_eth_secp256k1: Gas,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_secp256k1: 1_000,
            sig_verify_cost_eth_secp256k1: 21_000,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Account store
pub trait AccountKeeper: Send + Sync {
    /// Auth parameters
    fn params(&self) -> AuthParams;

    /// Get an account
    fn get_account(&self, state: &dyn StateReader, address: &Address)
        -> AnteResult<Option<Account>>;

    /// Store an account
    fn set_account(&self, state: &mut dyn StateWriter, account: Account) -> AnteResult<()>;

    /// Bump the account sequence by one
    fn increment_sequence(&self, state: &mut dyn StateWriter, address: &Address)
        -> AnteResult<u64>;

    /// Get an account that must exist
    fn require_account(&self, state: &dyn StateReader, address: &Address) -> AnteResult<Account> {
        self.get_account(state, address)?
            .ok_or(AnteError::UnknownAccount(*address))
    }
}

/// Balance store
pub trait BankKeeper: Send + Sync {
    /// Balance of one denom
    fn get_balance(&self, state: &dyn StateReader, address: &Address, denom: &str)
        -> AnteResult<u128>;

    /// Move coins between accounts, all or nothing
    fn send_coins(
        &self,
        state: &mut dyn StateWriter,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> AnteResult<()>;
}

/// Fee allowance store
pub trait FeeGrantKeeper: Send + Sync {
    /// Charge `fee` against the allowance `granter` gave `grantee` for `msgs`
    fn use_granted_fees(
        &self,
        state: &mut dyn StateWriter,
        height: BlockHeight,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> AnteResult<()>;
}

/// Fee market parameters
pub trait FeeMarketKeeper: Send + Sync {
    /// Global minimum gas price (zero disables the floor)
    fn min_gas_price(&self) -> Dec;
}

/// Virtual-machine collaborator
pub trait EvmKeeper: Send + Sync {
    /// Denom fees are paid in
    fn evm_denom(&self) -> String;

    /// Gas the VM needs to execute `msg`
    fn estimate_gas_wanted(&self, msg: &Msg) -> AnteResult<Gas>;
}

/// Registry of globally disabled message types
pub trait CircuitKeeper: Send + Sync {
    /// Check if a message type may execute
    fn is_allowed(&self, type_url: &str) -> bool;
}

/// Cross-chain relay de-duplication index
pub trait RelayIndex: Send + Sync {
    /// Whether relaying `msg` would repeat an already-processed packet
    fn is_redundant(&self, msg: &Msg) -> bool;
}

// ============================================================================
// Default implementations
// ============================================================================

/// Account keeper over the pipeline's state view
#[derive(Clone, Debug, Default)]
pub struct AuthKeeper {
    params: AuthParams,
}

impl AuthKeeper {
    /// Create with parameters
    pub fn new(params: AuthParams) -> Self {
        Self { params }
    }
}

impl AccountKeeper for AuthKeeper {
    fn params(&self) -> AuthParams {
        self.params.clone()
    }

    fn get_account(
        &self,
        state: &dyn StateReader,
        address: &Address,
    ) -> AnteResult<Option<Account>> {
        Ok(state.get_account(address)?)
    }

    fn set_account(&self, state: &mut dyn StateWriter, account: Account) -> AnteResult<()> {
        Ok(state.set_account(account)?)
    }

    fn increment_sequence(
        &self,
        state: &mut dyn StateWriter,
        address: &Address,
    ) -> AnteResult<u64> {
        Ok(state.increment_sequence(address)?)
    }
}

/// Bank keeper over the pipeline's state view
#[derive(Clone, Copy, Debug, Default)]
pub struct Bank;

impl BankKeeper for Bank {
    fn get_balance(
        &self,
        state: &dyn StateReader,
        address: &Address,
        denom: &str,
    ) -> AnteResult<u128> {
        Ok(state.get_balance(address, denom)?)
    }

    fn send_coins(
        &self,
        state: &mut dyn StateWriter,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> AnteResult<()> {
        Ok(state.send_coins(from, to, amount)?)
    }
}

/// Fee grant keeper enforcing expiration, allowed messages and spend limits.
///
/// Allowed-message lists are matched against top-level message types only.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeeGrants;

impl FeeGrantKeeper for FeeGrants {
    fn use_granted_fees(
        &self,
        state: &mut dyn StateWriter,
        height: BlockHeight,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> AnteResult<()> {
        let rejected = |reason: &str| AnteError::FeeGrantRejected {
            granter: *granter,
            grantee: *grantee,
            reason: reason.to_string(),
        };

        let mut allowance = state
            .get_allowance(granter, grantee)?
            .ok_or_else(|| rejected("fee-grant not found"))?;

        if allowance.is_expired(height) {
            state.set_allowance(*granter, *grantee, None)?;
            return Err(rejected("fee allowance expired"));
        }
        if !allowance.allows_messages(msgs.iter().map(Msg::type_url)) {
            return Err(rejected("message does not exist in allowed messages"));
        }

        let exhausted = match allowance.spend_limit.take() {
            None => false,
            Some(limit) => {
                let left = limit
                    .checked_sub(fee)
                    .ok_or_else(|| rejected("fee limit exceeded"))?;
                let exhausted = left.is_empty();
                allowance.spend_limit = Some(left);
                exhausted
            }
        };

        let updated = (!exhausted).then_some(allowance);
        state.set_allowance(*granter, *grantee, updated)?;
        Ok(())
    }
}

/// Fee market with an adjustable minimum gas price
#[derive(Debug, Default)]
pub struct StaticFeeMarket {
    min_gas_price: RwLock<Dec>,
}

impl StaticFeeMarket {
    /// Create with a minimum gas price
    pub fn new(min_gas_price: Dec) -> Self {
        Self {
            min_gas_price: RwLock::new(min_gas_price),
        }
    }

    /// Update the minimum gas price
    pub fn set_min_gas_price(&self, price: Dec) {
        *self.min_gas_price.write() = price;
    }
}

impl FeeMarketKeeper for StaticFeeMarket {
    fn min_gas_price(&self) -> Dec {
        *self.min_gas_price.read()
    }
}

/// VM collaborator estimating `base + per_byte * input.len()` per contract call
#[derive(Clone, Debug)]
pub struct FlatGasEstimator {
    denom: String,
    base: Gas,
    per_byte: Gas,
}

impl FlatGasEstimator {
    /// Create an estimator for fees in `denom`
    pub fn new(denom: impl Into<String>, base: Gas, per_byte: Gas) -> Self {
        Self {
            denom: denom.into(),
            base,
            per_byte,
        }
    }
}

impl EvmKeeper for FlatGasEstimator {
    fn evm_denom(&self) -> String {
        self.denom.clone()
    }

    fn estimate_gas_wanted(&self, msg: &Msg) -> AnteResult<Gas> {
        match msg {
            Msg::ExecuteContract { input, .. } => (input.len() as Gas)
                .checked_mul(self.per_byte)
                .and_then(|gas| gas.checked_add(self.base))
                .ok_or_else(|| AnteError::Internal("execution gas estimate overflow".into())),
            Msg::EthereumTx { gas, .. } => Ok(*gas),
            _ => Ok(0),
        }
    }
}

/// Circuit breaker registry
#[derive(Debug, Default)]
pub struct CircuitRegistry {
    disabled: RwLock<HashSet<String>>,
}

impl CircuitRegistry {
    /// Registry with the given message types disabled
    pub fn with_disabled<I, S>(type_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            disabled: RwLock::new(type_urls.into_iter().map(Into::into).collect()),
        }
    }

    /// Disable a message type
    pub fn disable(&self, type_url: impl Into<String>) {
        self.disabled.write().insert(type_url.into());
    }

    /// Re-enable a message type
    pub fn enable(&self, type_url: &str) {
        self.disabled.write().remove(type_url);
    }
}

impl CircuitKeeper for CircuitRegistry {
    fn is_allowed(&self, type_url: &str) -> bool {
        !self.disabled.read().contains(type_url)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PacketKey {
    port: String,
    channel: String,
    sequence: u64,
}

/// In-memory packet index.
///
/// A receive is redundant once the destination recorded a receipt; an
/// acknowledgement or timeout is redundant once the source cleared the
/// packet commitment.
#[derive(Debug, Default)]
pub struct PacketIndex {
    receipts: DashSet<PacketKey>,
    cleared: DashSet<PacketKey>,
}

impl PacketIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the destination chain received `packet`
    pub fn record_receipt(&self, packet: &Packet) {
        self.receipts.insert(PacketKey {
            port: packet.destination_port.clone(),
            channel: packet.destination_channel.clone(),
            sequence: packet.sequence,
        });
    }

    /// Record that the source chain cleared the commitment for `packet`
    pub fn record_cleared(&self, packet: &Packet) {
        self.cleared.insert(Self::source_key(packet));
    }

    fn source_key(packet: &Packet) -> PacketKey {
        PacketKey {
            port: packet.source_port.clone(),
            channel: packet.source_channel.clone(),
            sequence: packet.sequence,
        }
    }
}

impl RelayIndex for PacketIndex {
    fn is_redundant(&self, msg: &Msg) -> bool {
        match msg {
            Msg::RecvPacket { packet, .. } => self.receipts.contains(&PacketKey {
                port: packet.destination_port.clone(),
                channel: packet.destination_channel.clone(),
                sequence: packet.sequence,
            }),
            Msg::Acknowledgement { packet, .. } | Msg::Timeout { packet, .. } => {
                self.cleared.contains(&Self::source_key(packet))
            }
            _ => false,
        }
    }
}
