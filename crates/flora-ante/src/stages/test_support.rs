//! Fixtures shared by the stage tests

use crate::builder::{AnteBundle, HandlerOptions};
use crate::gas::GasMeter;
use crate::keepers::AuthParams;
use crate::sign_mode::{direct_sign_bytes, SignerData};
use crate::stages::StageId;
use crate::{BlockInfo, Context, ExecMode};
use flora_crypto::{sign_message, KeyAlgo, PrivateKey, PublicKey, SignatureData};
use flora_primitives::{Address, Coins, Gas};
use flora_state::{MemoryState, StateReader};
use flora_types::{AuthInfo, Fee, Msg, SignMode, SignerInfo, Tx, TxBody};

pub(crate) const DENOM: &str = "aflora";
pub(crate) const CHAIN_ID: &str = "flora-test";
pub(crate) const STARTING_BALANCE: u128 = 1_000_000_000;

pub(crate) struct TestKey {
    pub(crate) secret: PrivateKey,
    pub(crate) public_key: PublicKey,
    pub(crate) address: Address,
}

impl TestKey {
    pub(crate) fn from_seed(seed: u8) -> Self {
        let secret = PrivateKey::from_slice(&[seed; 32]).unwrap();
        let public_key = PublicKey::secp256k1(*secret.verifying_key());
        let address = public_key.address();
        Self {
            secret,
            public_key,
            address,
        }
    }
}

pub(crate) struct Fixture {
    pub(crate) state: MemoryState,
    pub(crate) block: BlockInfo,
    pub(crate) alice: TestKey,
    pub(crate) bob: TestKey,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_block(BlockInfo::new(CHAIN_ID, 5))
    }

    pub(crate) fn with_block(block: BlockInfo) -> Self {
        let alice = TestKey::from_seed(1);
        let bob = TestKey::from_seed(2);
        let mut state = MemoryState::new();
        for key in [&alice, &bob] {
            state.create_account(key.address);
            state
                .fund(key.address, &Coins::single(DENOM, STARTING_BALANCE))
                .unwrap();
        }
        Self {
            state,
            block,
            alice,
            bob,
        }
    }

    /// Context positioned at `stage`, with a generous meter
    pub(crate) fn context(&self, mode: ExecMode, stage: StageId, relaxed: bool) -> Context<'_> {
        let mut ctx = Context::new(&self.state, self.block.clone(), mode, 100);
        ctx.set_gas_meter(GasMeter::new(10_000_000));
        ctx.enter(stage, relaxed);
        ctx
    }
}

pub(crate) fn options() -> HandlerOptions {
    HandlerOptions::in_memory(AuthParams::default(), DENOM)
}

pub(crate) fn bundle() -> AnteBundle {
    options().into_bundle().unwrap()
}

/// Sign `tx` for `keys` against the accounts in `state`
pub(crate) fn sign_tx(state: &dyn StateReader, chain_id: &str, mut tx: Tx, keys: &[&TestKey]) -> Tx {
    tx.auth_info.signer_infos = keys
        .iter()
        .map(|key| SignerInfo {
            public_key: Some(key.public_key.clone()),
            sign_mode: SignMode::Direct,
            sequence: state.get_sequence(&key.address).unwrap(),
        })
        .collect();

    let signatures = keys
        .iter()
        .map(|key| {
            let account = state.get_account(&key.address).unwrap().unwrap();
            let signer = SignerData {
                address: key.address,
                chain_id: chain_id.to_string(),
                account_number: account.account_number,
                sequence: account.sequence,
                public_key: Some(key.public_key.clone()),
            };
            let bytes = direct_sign_bytes(&signer, &tx);
            SignatureData::Single(sign_message(KeyAlgo::Secp256k1, &bytes, &key.secret).unwrap())
        })
        .collect();
    tx.signatures = signatures;
    tx
}

pub(crate) fn unsigned_tx(msgs: Vec<Msg>, fee: Coins, gas_limit: Gas) -> Tx {
    Tx {
        body: TxBody {
            messages: msgs,
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

pub(crate) fn send_msg(fx: &Fixture) -> Msg {
    Msg::Send {
        from: fx.alice.address,
        to: fx.bob.address,
        amount: Coins::single(DENOM, 10),
    }
}

/// Alice sends to Bob, paying one unit per gas
pub(crate) fn send_tx(fx: &Fixture, gas_limit: Gas) -> Tx {
    let tx = unsigned_tx(
        vec![send_msg(fx)],
        Coins::single(DENOM, gas_limit as u128),
        gas_limit,
    );
    sign_tx(&fx.state, CHAIN_ID, tx, &[&fx.alice])
}
