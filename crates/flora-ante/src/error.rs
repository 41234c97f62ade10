//! Admission error types

use crate::stages::StageId;
use flora_crypto::CryptoError;
use flora_primitives::{Address, Gas};
use flora_state::StateError;
use flora_types::TxError;
use std::fmt;
use thiserror::Error;

/// Caller-visible rejection category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Structural validation failure
    MalformedTransaction,
    /// Circuit breaker or unsupported-message rejection
    Disabled,
    /// Timeout height exceeded
    Expired,
    /// Below the fee floor
    PriceTooLow,
    /// Fee payer cannot cover the fee
    InsufficientFunds,
    /// Fee granter missing or grant rejected
    InvalidFeeGranter,
    /// Declared sequence differs from the account's
    WrongSequence,
    /// Signature or public key rejected
    InvalidSignature,
    /// Too many signatures
    TooManySignatures,
    /// Gas meter exhausted
    OutOfGas,
    /// Declared gas below what the VM call needs
    ExecutionGasMismatch,
    /// Signer or fee payer has no account
    UnknownAccount,
    /// Collaborator or state failure
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedTransaction => "malformed_transaction",
            ErrorKind::Disabled => "disabled",
            ErrorKind::Expired => "expired",
            ErrorKind::PriceTooLow => "price_too_low",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::InvalidFeeGranter => "invalid_fee_granter",
            ErrorKind::WrongSequence => "wrong_sequence",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::TooManySignatures => "too_many_signatures",
            ErrorKind::OutOfGas => "out_of_gas",
            ErrorKind::ExecutionGasMismatch => "execution_gas_mismatch",
            ErrorKind::UnknownAccount => "unknown_account",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnteError {
    /// Stateless validation failed
    #[error(transparent)]
    Tx(#[from] TxError),

    /// Gas limit above the block maximum
    #[error("tx gas limit {gas_limit} exceeds block max gas {max}")]
    GasLimitAboveBlockMax {
        /// Declared gas limit
        gas_limit: Gas,
        /// Block maximum
        max: Gas,
    },

    /// Zero gas limit outside simulation
    #[error("must provide positive gas")]
    ZeroGas,

    /// Critical extension option not accepted
    #[error("unknown extension option {0}")]
    UnknownExtensionOption(String),

    /// Memo too long
    #[error("maximum memo length is {max} bytes but received {len} bytes")]
    MemoTooLarge {
        /// Memo length in bytes
        len: usize,
        /// Allowed maximum
        max: u64,
    },

    /// Fee not payable in the expected denom
    #[error("invalid fee {got}: expected a single {expected} coin")]
    InvalidFeeDenom {
        /// Required denom
        expected: String,
        /// Fee provided
        got: String,
    },

    /// Message type not allowed at the top level
    #[error("{0} is not allowed at the top level of a transaction")]
    UnsupportedMessage(String),

    /// Delegated execution of a denied message type
    #[error("found disabled msg type: {0}")]
    UnauthorizedNestedMessage(String),

    /// Delegated execution nested too deep
    #[error("found more nested msgs than permitted; limit is {0}")]
    NestingTooDeep(usize),

    /// Message type disabled by the circuit breaker
    #[error("tx type not allowed: {0}")]
    CircuitBreakerTripped(String),

    /// Timeout height passed
    #[error("block height {height} is greater than timeout height {timeout}")]
    TimeoutHeight {
        /// Declared timeout
        timeout: u64,
        /// Current height
        height: u64,
    },

    /// Fee below the required floor
    #[error("insufficient fee; got {got}, required {required}")]
    InsufficientFee {
        /// Fee provided
        got: String,
        /// Minimum fee
        required: String,
    },

    /// Fee grants are not configured
    #[error("fee grants are not enabled")]
    FeeGrantsDisabled,

    /// Granter does not pay for this fee
    #[error("{granter} does not allow to pay fees for {grantee}: {reason}")]
    FeeGrantRejected {
        /// Fee granter
        granter: Address,
        /// Fee payer
        grantee: Address,
        /// Why the allowance rejected the fee
        reason: String,
    },

    /// Sequence mismatch
    #[error("account sequence mismatch for {address}, expected {expected}, got {got}")]
    WrongSequence {
        /// Signer
        address: Address,
        /// Stored sequence
        expected: u64,
        /// Declared sequence
        got: u64,
    },

    /// Declared key does not derive the signer address
    #[error("pubkey does not match signer address {address} with signer index {index}")]
    PubKeyMismatch {
        /// Signer
        address: Address,
        /// Signer index
        index: usize,
    },

    /// No key known for the signer
    #[error("pubkey on account {0} is not set")]
    MissingPubKey(Address),

    /// Cryptographic verification failed
    #[error("signature verification failed; please verify account number ({account_number}) and chain-id ({chain_id})")]
    SignatureVerificationFailed {
        /// Account number used in the sign doc
        account_number: u64,
        /// Chain id used in the sign doc
        chain_id: String,
    },

    /// Malformed key or signature material
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Signature count above the limit
    #[error("signatures: {count}, limit: {limit}")]
    TooManySignatures {
        /// Leaf signatures
        count: u64,
        /// Allowed maximum
        limit: u64,
    },

    /// Gas meter exhausted
    #[error("out of gas in location: {descriptor}; gas wanted: {limit}, gas used: {used}")]
    OutOfGas {
        /// What was being charged
        descriptor: &'static str,
        /// Meter limit
        limit: Gas,
        /// Consumption the charge would have reached
        used: Gas,
    },

    /// Declared gas does not cover the VM calls
    #[error("gas limit {gas_limit} is below the {required} required by execution")]
    ExecutionGasTooLow {
        /// Declared gas limit
        gas_limit: Gas,
        /// Gas consumed so far plus estimated execution gas
        required: Gas,
    },

    /// Signer or fee payer has no account
    #[error("account {0} does not exist")]
    UnknownAccount(Address),

    /// State access failure
    #[error(transparent)]
    State(#[from] StateError),

    /// Collaborator failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnteError {
    /// Rejection category
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnteError::Tx(_)
            | AnteError::GasLimitAboveBlockMax { .. }
            | AnteError::ZeroGas
            | AnteError::UnknownExtensionOption(_)
            | AnteError::MemoTooLarge { .. }
            | AnteError::InvalidFeeDenom { .. } => ErrorKind::MalformedTransaction,
            AnteError::UnsupportedMessage(_)
            | AnteError::UnauthorizedNestedMessage(_)
            | AnteError::NestingTooDeep(_)
            | AnteError::CircuitBreakerTripped(_) => ErrorKind::Disabled,
            AnteError::TimeoutHeight { .. } => ErrorKind::Expired,
            AnteError::InsufficientFee { .. } => ErrorKind::PriceTooLow,
            AnteError::FeeGrantsDisabled | AnteError::FeeGrantRejected { .. } => {
                ErrorKind::InvalidFeeGranter
            }
            AnteError::WrongSequence { .. } => ErrorKind::WrongSequence,
            AnteError::PubKeyMismatch { .. }
            | AnteError::MissingPubKey(_)
            | AnteError::SignatureVerificationFailed { .. }
            | AnteError::Crypto(_) => ErrorKind::InvalidSignature,
            AnteError::TooManySignatures { .. } => ErrorKind::TooManySignatures,
            AnteError::OutOfGas { .. } => ErrorKind::OutOfGas,
            AnteError::ExecutionGasTooLow { .. } => ErrorKind::ExecutionGasMismatch,
            AnteError::UnknownAccount(_) => ErrorKind::UnknownAccount,
            AnteError::State(StateError::UnknownAccount(_)) => ErrorKind::UnknownAccount,
            AnteError::State(StateError::InsufficientFunds { .. }) => ErrorKind::InsufficientFunds,
            AnteError::State(StateError::Overflow(_)) | AnteError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for stage logic
pub type AnteResult<T> = Result<T, AnteError>;

/// A failed pipeline run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("rejected by {stage}: {error}")]
pub struct Rejection {
    /// Stage that failed
    pub stage: StageId,
    /// Failure
    pub error: AnteError,
    /// Gas consumed up to and including the failing charge
    pub gas_used: Gas,
}

impl Rejection {
    /// Rejection category
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// Pipeline construction failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A required collaborator was not supplied
    #[error("{0} is required for the admission pipeline")]
    MissingCollaborator(&'static str),
}
