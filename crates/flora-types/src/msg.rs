//! Transaction messages

use crate::error::{TxError, TxResult};
use flora_primitives::{Address, BlockHeight, Coins};

/// Fully qualified message type identifiers
pub mod type_url {
    /// Bank transfer
    pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
    /// Execute messages on behalf of a granter
    pub const MSG_EXEC: &str = "/cosmos.authz.v1beta1.MsgExec";
    /// Grant an authorization
    pub const MSG_GRANT: &str = "/cosmos.authz.v1beta1.MsgGrant";
    /// Create a vesting account
    pub const MSG_CREATE_VESTING_ACCOUNT: &str = "/cosmos.vesting.v1beta1.MsgCreateVestingAccount";
    /// Ethereum transaction wrapper
    pub const MSG_ETHEREUM_TX: &str = "/cosmos.evm.vm.v1.MsgEthereumTx";
    /// Contract call executed by the virtual machine
    pub const MSG_EXECUTE_CONTRACT: &str = "/flora.vm.v1.MsgExecuteContract";
    /// IBC packet receive
    pub const MSG_RECV_PACKET: &str = "/ibc.core.channel.v1.MsgRecvPacket";
    /// IBC packet acknowledgement
    pub const MSG_ACKNOWLEDGEMENT: &str = "/ibc.core.channel.v1.MsgAcknowledgement";
    /// IBC packet timeout
    pub const MSG_TIMEOUT: &str = "/ibc.core.channel.v1.MsgTimeout";
    /// IBC light client update
    pub const MSG_UPDATE_CLIENT: &str = "/ibc.core.client.v1.MsgUpdateClient";
}

/// Cross-chain packet, identified by its source channel and sequence
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    /// Packet sequence on the source channel
    pub sequence: u64,
    /// Source port
    pub source_port: String,
    /// Source channel
    pub source_channel: String,
    /// Destination port
    pub destination_port: String,
    /// Destination channel
    pub destination_channel: String,
    /// Opaque application data
    pub data: Vec<u8>,
    /// Height after which the packet times out (0 = none)
    pub timeout_height: BlockHeight,
}

/// Authorization carried by a grant
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Authorization {
    /// Allows the grantee to execute any message of `msg_type_url`
    Generic {
        /// Authorized message type
        msg_type_url: String,
    },
    /// Allows the grantee to send up to `spend_limit`
    Send {
        /// Remaining allowance
        spend_limit: Coins,
    },
}

impl Authorization {
    /// Message type the grantee may execute under this authorization
    pub fn msg_type_url(&self) -> &str {
        match self {
            Authorization::Generic { msg_type_url } => msg_type_url,
            Authorization::Send { .. } => type_url::MSG_SEND,
        }
    }
}

/// A transaction message
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "value"))]
pub enum Msg {
    /// Transfer coins
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgSend"))]
    Send {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Amount
        amount: Coins,
    },
    /// Execute `msgs` as the granter(s) that authorized `grantee`
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgExec"))]
    Exec {
        /// Account executing the wrapped messages
        grantee: Address,
        /// Wrapped messages
        msgs: Vec<Msg>,
    },
    /// Grant an authorization to `grantee`
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgGrant"))]
    Grant {
        /// Granting account
        granter: Address,
        /// Receiving account
        grantee: Address,
        /// What is authorized
        authorization: Authorization,
    },
    /// Create a vesting account
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgCreateVestingAccount"))]
    CreateVestingAccount {
        /// Funding account
        from: Address,
        /// New vesting account
        to: Address,
        /// Locked amount
        amount: Coins,
        /// Unix time at which vesting ends
        end_time: u64,
    },
    /// Ethereum transaction; only valid inside an Ethereum-typed envelope
    #[cfg_attr(feature = "serde", serde(rename = "evm/MsgEthereumTx"))]
    EthereumTx {
        /// Recovered sender
        from: Address,
        /// RLP-encoded Ethereum transaction
        raw: Vec<u8>,
        /// Gas limit of the inner Ethereum transaction
        gas: u64,
    },
    /// Call a contract in the virtual machine
    #[cfg_attr(feature = "serde", serde(rename = "vm/MsgExecuteContract"))]
    ExecuteContract {
        /// Caller
        sender: Address,
        /// Contract address
        contract: Address,
        /// Call data
        input: Vec<u8>,
        /// Native value attached
        #[cfg_attr(feature = "serde", serde(with = "flora_primitives::serde_str"))]
        value: u128,
    },
    /// Relay a packet to its destination
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgRecvPacket"))]
    RecvPacket {
        /// Relayed packet
        packet: Packet,
        /// Relayer
        signer: Address,
    },
    /// Relay a packet acknowledgement back to its source
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgAcknowledgement"))]
    Acknowledgement {
        /// Acknowledged packet
        packet: Packet,
        /// Acknowledgement bytes
        acknowledgement: Vec<u8>,
        /// Relayer
        signer: Address,
    },
    /// Relay a packet timeout back to its source
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgTimeout"))]
    Timeout {
        /// Timed-out packet
        packet: Packet,
        /// Relayer
        signer: Address,
    },
    /// Update a counterparty light client
    #[cfg_attr(feature = "serde", serde(rename = "cosmos-sdk/MsgUpdateClient"))]
    UpdateClient {
        /// Client identifier
        client_id: String,
        /// Header height being submitted
        height: BlockHeight,
        /// Relayer
        signer: Address,
    },
}

impl Msg {
    /// Type identifier of this message
    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::Send { .. } => type_url::MSG_SEND,
            Msg::Exec { .. } => type_url::MSG_EXEC,
            Msg::Grant { .. } => type_url::MSG_GRANT,
            Msg::CreateVestingAccount { .. } => type_url::MSG_CREATE_VESTING_ACCOUNT,
            Msg::EthereumTx { .. } => type_url::MSG_ETHEREUM_TX,
            Msg::ExecuteContract { .. } => type_url::MSG_EXECUTE_CONTRACT,
            Msg::RecvPacket { .. } => type_url::MSG_RECV_PACKET,
            Msg::Acknowledgement { .. } => type_url::MSG_ACKNOWLEDGEMENT,
            Msg::Timeout { .. } => type_url::MSG_TIMEOUT,
            Msg::UpdateClient { .. } => type_url::MSG_UPDATE_CLIENT,
        }
    }

    /// Account that must sign for this message
    pub fn signer(&self) -> Address {
        match self {
            Msg::Send { from, .. } => *from,
            Msg::Exec { grantee, .. } => *grantee,
            Msg::Grant { granter, .. } => *granter,
            Msg::CreateVestingAccount { from, .. } => *from,
            Msg::EthereumTx { from, .. } => *from,
            Msg::ExecuteContract { sender, .. } => *sender,
            Msg::RecvPacket { signer, .. }
            | Msg::Acknowledgement { signer, .. }
            | Msg::Timeout { signer, .. }
            | Msg::UpdateClient { signer, .. } => *signer,
        }
    }

    /// Packet carried by a relay message
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Msg::RecvPacket { packet, .. }
            | Msg::Acknowledgement { packet, .. }
            | Msg::Timeout { packet, .. } => Some(packet),
            _ => None,
        }
    }

    /// Stateless checks
    pub fn validate_basic(&self) -> TxResult<()> {
        let invalid = |reason: &str| TxError::InvalidMsg {
            type_url: self.type_url(),
            reason: reason.to_string(),
        };
        if self.signer().is_zero() {
            return Err(invalid("signer address is empty"));
        }
        match self {
            Msg::Send { to, amount, .. } | Msg::CreateVestingAccount { to, amount, .. } => {
                if to.is_zero() {
                    return Err(invalid("recipient address is empty"));
                }
                if amount.is_empty() {
                    return Err(invalid("amount is empty"));
                }
                amount.validate().map_err(|e| invalid(&e.to_string()))?;
                if let Msg::CreateVestingAccount { end_time: 0, .. } = self {
                    return Err(invalid("end time must be positive"));
                }
            }
            Msg::Exec { msgs, .. } => {
                if msgs.is_empty() {
                    return Err(invalid("no messages to execute"));
                }
            }
            Msg::Grant {
                granter, grantee, ..
            } => {
                if grantee.is_zero() || granter == grantee {
                    return Err(invalid("granter and grantee must be distinct accounts"));
                }
            }
            Msg::EthereumTx { gas, .. } => {
                if *gas == 0 {
                    return Err(invalid("gas must be positive"));
                }
            }
            Msg::ExecuteContract { contract, .. } => {
                if contract.is_zero() {
                    return Err(invalid("contract address is empty"));
                }
            }
            Msg::RecvPacket { packet, .. }
            | Msg::Acknowledgement { packet, .. }
            | Msg::Timeout { packet, .. } => {
                if packet.sequence == 0 {
                    return Err(invalid("packet sequence cannot be 0"));
                }
                if packet.source_channel.is_empty() || packet.destination_channel.is_empty() {
                    return Err(invalid("packet channel identifiers are empty"));
                }
            }
            Msg::UpdateClient { client_id, .. } => {
                if client_id.is_empty() {
                    return Err(invalid("client id is empty"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    #[test]
    fn test_signer_and_type() {
        let msg = Msg::Exec {
            grantee: addr(2),
            msgs: vec![Msg::Send {
                from: addr(1),
                to: addr(3),
                amount: Coins::single("petal", 10),
            }],
        };
        assert_eq!(msg.signer(), addr(2));
        assert_eq!(msg.type_url(), type_url::MSG_EXEC);
        assert!(msg.packet().is_none());
    }

    #[test]
    fn test_validate_send() {
        let ok = Msg::Send {
            from: addr(1),
            to: addr(2),
            amount: Coins::single("petal", 10),
        };
        assert!(ok.validate_basic().is_ok());

        let empty = Msg::Send {
            from: addr(1),
            to: addr(2),
            amount: Coins::empty(),
        };
        assert!(matches!(
            empty.validate_basic(),
            Err(TxError::InvalidMsg { type_url: type_url::MSG_SEND, .. })
        ));
    }

    #[test]
    fn test_validate_grant_to_self() {
        let msg = Msg::Grant {
            granter: addr(1),
            grantee: addr(1),
            authorization: Authorization::Generic {
                msg_type_url: type_url::MSG_SEND.into(),
            },
        };
        assert!(msg.validate_basic().is_err());
    }

    #[test]
    fn test_validate_packet_sequence() {
        let msg = Msg::RecvPacket {
            packet: Packet {
                sequence: 0,
                source_port: "transfer".into(),
                source_channel: "channel-0".into(),
                destination_port: "transfer".into(),
                destination_channel: "channel-1".into(),
                data: vec![],
                timeout_height: 0,
            },
            signer: addr(9),
        };
        assert!(msg.validate_basic().is_err());
    }
}
