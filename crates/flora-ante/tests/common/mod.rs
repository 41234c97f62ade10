//! Harness for admission integration tests

#![allow(dead_code)]

use flora_ante::sign_mode::{direct_sign_bytes, SignerData};
use flora_ante::{AdmissionGateway, AnteConfig, HandlerOptions};
use flora_crypto::{sign_message, KeyAlgo, PrivateKey, PublicKey, SignatureData};
use flora_primitives::{Address, Coins, Gas};
use flora_state::{MemoryState, StateReader};
use flora_types::{AuthInfo, Fee, Msg, SignMode, SignerInfo, Tx, TxBody};
use k256::ecdsa::SigningKey;
use parking_lot::RwLock;
use std::sync::Arc;

/// Fee denom used throughout the tests
pub const DENOM: &str = "aflora";

/// Chain the tests run on
pub const CHAIN_ID: &str = "flora_9000-1";

/// Height of the first block
pub const START_HEIGHT: u64 = 10;

/// Initial balance of every funded account
pub const FUNDED_BALANCE: u128 = 1_000_000_000_000;

/// Test account with its signing key
pub struct TestAccount {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: Address,
}

impl TestAccount {
    /// Create a new random test account
    pub fn random() -> Self {
        let private_key = SigningKey::random(&mut rand::thread_rng());
        let public_key = PublicKey::secp256k1(*private_key.verifying_key());
        let address = public_key.address();
        Self {
            private_key,
            public_key,
            address,
        }
    }

    /// Account address
    pub fn address(&self) -> Address {
        self.address
    }
}

/// Gateway over funded accounts
pub struct TestEnv {
    pub gateway: AdmissionGateway,
    pub alice: TestAccount,
    pub bob: TestAccount,
}

impl TestEnv {
    /// Default configuration
    pub fn new() -> Self {
        Self::with_config(&AnteConfig::default())
    }

    /// Pipeline built from `config`
    pub fn with_config(config: &AnteConfig) -> Self {
        Self::with_options(config, config.handler_options().unwrap())
    }

    /// Pipeline built from `options`, block taken from `config`
    pub fn with_options(config: &AnteConfig, options: HandlerOptions) -> Self {
        let alice = TestAccount::random();
        let bob = TestAccount::random();
        let mut state = MemoryState::new();
        for account in [&alice, &bob] {
            state.create_account(account.address);
            state
                .fund(account.address, &Coins::single(DENOM, FUNDED_BALANCE))
                .unwrap();
        }

        let handler = flora_ante::AnteHandler::build(options).unwrap();
        let gateway = AdmissionGateway::new(
            handler,
            Arc::new(RwLock::new(state)),
            config.block_info(START_HEIGHT),
        );
        Self {
            gateway,
            alice,
            bob,
        }
    }

    pub fn sequence(&self, address: Address) -> u64 {
        self.gateway.state().read().get_sequence(&address).unwrap()
    }

    pub fn balance(&self, address: Address) -> u128 {
        self.gateway.state().read().get_balance(&address, DENOM).unwrap()
    }

    /// Alice sends 10 to Bob
    pub fn send_msg(&self) -> Msg {
        Msg::Send {
            from: self.alice.address,
            to: self.bob.address,
            amount: Coins::single(DENOM, 10),
        }
    }

    /// Sign for `signer` at its current sequence
    pub fn sign(&self, tx: Tx, signer: &TestAccount) -> Tx {
        let sequence = self.sequence(signer.address);
        self.sign_at(tx, signer, sequence)
    }

    /// Sign for `signer` declaring `sequence`
    pub fn sign_at(&self, mut tx: Tx, signer: &TestAccount, sequence: u64) -> Tx {
        tx.auth_info.signer_infos = vec![SignerInfo {
            public_key: Some(signer.public_key.clone()),
            sign_mode: SignMode::Direct,
            sequence,
        }];
        let account_number = self
            .gateway
            .state()
            .read()
            .get_account(&signer.address)
            .unwrap()
            .unwrap()
            .account_number;
        let signer_data = SignerData {
            address: signer.address,
            chain_id: self.gateway.block().chain_id,
            account_number,
            sequence,
            public_key: Some(signer.public_key.clone()),
        };
        let bytes = direct_sign_bytes(&signer_data, &tx);
        let signature = sign_message(KeyAlgo::Secp256k1, &bytes, &signer.private_key).unwrap();
        tx.signatures = vec![SignatureData::Single(signature)];
        tx
    }

    /// Alice's transfer, paying one unit per gas
    pub fn send_tx(&self, gas_limit: Gas) -> Tx {
        let tx = unsigned_tx(
            vec![self.send_msg()],
            Coins::single(DENOM, gas_limit as u128),
            gas_limit,
        );
        self.sign(tx, &self.alice)
    }
}

pub fn unsigned_tx(messages: Vec<Msg>, fee: Coins, gas_limit: Gas) -> Tx {
    Tx {
        body: TxBody {
            messages,
            ..Default::default()
        },
        auth_info: AuthInfo {
            signer_infos: vec![],
            fee: Fee {
                amount: fee,
                gas_limit,
                ..Default::default()
            },
        },
        signatures: vec![],
    }
}

/// Route pipeline logs to the test writer
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
