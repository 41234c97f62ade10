//! Transaction envelope

use crate::codec;
use crate::error::{TxError, TxResult};
use crate::msg::Msg;
use flora_crypto::{PublicKey, SignatureData};
use flora_primitives::{Address, BlockHeight, Coins, Gas, Sequence};

/// Largest gas limit a transaction may declare
pub const MAX_GAS_WANTED: Gas = (1 << 63) - 1;

/// How the signer produced its sign bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SignMode {
    /// Binary sign doc over body and auth info bytes
    #[default]
    Direct,
    /// Canonical sorted JSON sign doc
    LegacyAminoJson,
}

/// Opaque transaction extension
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionOption {
    /// Extension type identifier
    pub type_url: String,
    /// Encoded extension payload
    pub value: Vec<u8>,
}

/// Messages plus transaction-wide metadata
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxBody {
    /// Messages executed in order
    pub messages: Vec<Msg>,
    /// Free-form note
    pub memo: String,
    /// Block height after which the tx is no longer valid (0 = never)
    pub timeout_height: BlockHeight,
    /// Extensions the node must understand
    pub extension_options: Vec<ExtensionOption>,
    /// Extensions the node may ignore
    pub non_critical_extension_options: Vec<ExtensionOption>,
}

/// Per-signer metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerInfo {
    /// Signer's key; may be omitted once the account has one on record
    pub public_key: Option<PublicKey>,
    /// Sign mode used for this signature
    pub sign_mode: SignMode,
    /// Account sequence the signature commits to
    pub sequence: Sequence,
}

/// Fee specification
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fee {
    /// Fee amount
    pub amount: Coins,
    /// Gas limit
    pub gas_limit: Gas,
    /// Explicit fee payer; defaults to the first signer
    pub payer: Option<Address>,
    /// Account whose fee allowance pays the fee
    pub granter: Option<Address>,
}

/// Signer infos plus fee
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthInfo {
    /// One entry per required signer
    pub signer_infos: Vec<SignerInfo>,
    /// Fee
    pub fee: Fee,
}

/// A signed transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tx {
    /// Body
    pub body: TxBody,
    /// Auth info
    pub auth_info: AuthInfo,
    /// One signature per required signer, same order as [`Tx::signers`]
    pub signatures: Vec<SignatureData>,
}

impl Tx {
    /// Top-level messages
    pub fn messages(&self) -> &[Msg] {
        &self.body.messages
    }

    /// Fee
    pub fn fee(&self) -> &Fee {
        &self.auth_info.fee
    }

    /// Declared gas limit
    pub fn gas_limit(&self) -> Gas {
        self.auth_info.fee.gas_limit
    }

    /// Required signers: message signers in order of first appearance,
    /// then an explicit fee payer if it is not already among them
    pub fn signers(&self) -> Vec<Address> {
        let mut signers: Vec<Address> = Vec::new();
        for msg in &self.body.messages {
            let signer = msg.signer();
            if !signers.contains(&signer) {
                signers.push(signer);
            }
        }
        if let Some(payer) = self.auth_info.fee.payer {
            if !signers.contains(&payer) {
                signers.push(payer);
            }
        }
        signers
    }

    /// Account paying the fee
    pub fn fee_payer(&self) -> Option<Address> {
        self.auth_info
            .fee
            .payer
            .or_else(|| self.body.messages.first().map(Msg::signer))
    }

    /// Deterministic encoding of the whole transaction
    pub fn encode(&self) -> Vec<u8> {
        codec::encode_tx(self)
    }

    /// State-independent structural checks
    pub fn validate_basic(&self) -> TxResult<()> {
        if self.body.messages.is_empty() {
            return Err(TxError::EmptyMessages);
        }

        let fee = &self.auth_info.fee;
        fee.amount
            .validate()
            .map_err(|e| TxError::InvalidFee(e.to_string()))?;
        if fee.gas_limit == 0 || fee.gas_limit > MAX_GAS_WANTED {
            return Err(TxError::InvalidGasLimit {
                gas_limit: fee.gas_limit,
                max: MAX_GAS_WANTED,
            });
        }

        if self.signatures.is_empty() {
            return Err(TxError::NoSignatures);
        }
        if self.signatures.len() != self.auth_info.signer_infos.len() {
            return Err(TxError::SignerInfoMismatch {
                infos: self.auth_info.signer_infos.len(),
                signatures: self.signatures.len(),
            });
        }
        let signers = self.signers();
        if self.signatures.len() != signers.len() {
            return Err(TxError::WrongSignerCount {
                expected: signers.len(),
                got: self.signatures.len(),
            });
        }

        let mut pending: Vec<&Msg> = self.body.messages.iter().collect();
        while let Some(msg) = pending.pop() {
            msg.validate_basic()?;
            if let Msg::Exec { msgs, .. } = msg {
                pending.extend(msgs.iter());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_crypto::Signature;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn send(from: u8, to: u8) -> Msg {
        Msg::Send {
            from: addr(from),
            to: addr(to),
            amount: Coins::single("petal", 5),
        }
    }

    fn dummy_sig() -> SignatureData {
        SignatureData::Single(Signature::new([1; 32], [2; 32], 27))
    }

    fn signer_info(sequence: u64) -> SignerInfo {
        SignerInfo {
            public_key: None,
            sign_mode: SignMode::Direct,
            sequence,
        }
    }

    fn tx(messages: Vec<Msg>, sigs: usize) -> Tx {
        Tx {
            body: TxBody {
                messages,
                ..Default::default()
            },
            auth_info: AuthInfo {
                signer_infos: (0..sigs).map(|_| signer_info(0)).collect(),
                fee: Fee {
                    amount: Coins::single("petal", 100),
                    gas_limit: 200_000,
                    ..Default::default()
                },
            },
            signatures: (0..sigs).map(|_| dummy_sig()).collect(),
        }
    }

    #[test]
    fn test_signers_dedup_and_payer() {
        let mut t = tx(vec![send(1, 2), send(3, 2), send(1, 4)], 2);
        assert_eq!(t.signers(), vec![addr(1), addr(3)]);
        assert_eq!(t.fee_payer(), Some(addr(1)));

        t.auth_info.fee.payer = Some(addr(9));
        assert_eq!(t.signers(), vec![addr(1), addr(3), addr(9)]);
        assert_eq!(t.fee_payer(), Some(addr(9)));
    }

    #[test]
    fn test_validate_basic_ok() {
        assert!(tx(vec![send(1, 2)], 1).validate_basic().is_ok());
    }

    #[test]
    fn test_validate_basic_failures() {
        assert_eq!(tx(vec![], 1).validate_basic(), Err(TxError::EmptyMessages));
        assert_eq!(tx(vec![send(1, 2)], 0).validate_basic(), Err(TxError::NoSignatures));
        assert_eq!(
            tx(vec![send(1, 2), send(3, 2)], 1).validate_basic(),
            Err(TxError::WrongSignerCount { expected: 2, got: 1 })
        );

        let mut zero_gas = tx(vec![send(1, 2)], 1);
        zero_gas.auth_info.fee.gas_limit = 0;
        assert!(matches!(
            zero_gas.validate_basic(),
            Err(TxError::InvalidGasLimit { gas_limit: 0, .. })
        ));

        let mut bad_fee = tx(vec![send(1, 2)], 1);
        bad_fee.auth_info.fee.amount = Coins::from_unchecked(vec![flora_primitives::Coin::new("petal", 0)]);
        assert!(matches!(bad_fee.validate_basic(), Err(TxError::InvalidFee(_))));
    }

    #[test]
    fn test_validate_basic_checks_nested_msgs() {
        let exec = Msg::Exec {
            grantee: addr(1),
            msgs: vec![Msg::Send {
                from: addr(2),
                to: Address::ZERO,
                amount: Coins::single("petal", 1),
            }],
        };
        assert!(matches!(
            tx(vec![exec], 1).validate_basic(),
            Err(TxError::InvalidMsg { .. })
        ));
    }
}
