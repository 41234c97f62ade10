//! Per-transaction execution context

use crate::error::{AnteError, AnteResult, Rejection};
use crate::gas::GasMeter;
use crate::mode::ExecMode;
use crate::stages::StageId;
use flora_primitives::{BlockHeight, Gas};
use flora_state::{CachedState, StateCache, StateReader};

/// Block the transaction is admitted against
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockInfo {
    /// Current height (0 = genesis)
    pub height: BlockHeight,
    /// Chain identifier bound into sign bytes
    pub chain_id: String,
    /// Block gas limit, `None` = unlimited
    pub max_gas: Option<Gas>,
}

impl BlockInfo {
    /// Block at `height` on `chain_id` with no gas limit
    pub fn new(chain_id: impl Into<String>, height: BlockHeight) -> Self {
        Self {
            height,
            chain_id: chain_id.into(),
            max_gas: None,
        }
    }

    /// Set the block gas limit
    pub fn with_max_gas(mut self, max_gas: Gas) -> Self {
        self.max_gas = Some(max_gas);
        self
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

/// Event emitted by a stage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event type
    pub kind: String,
    /// Key/value attributes
    pub attributes: Vec<(String, String)>,
}

impl Event {
    /// Event with no attributes
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Look up an attribute
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of an admitted transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admission {
    /// Mode the run executed in
    pub mode: ExecMode,
    /// Gas the transaction asked for
    pub gas_wanted: Gas,
    /// Gas charged by the pipeline
    pub gas_used: Gas,
    /// Mempool priority derived from the fee
    pub priority: i64,
    /// Events emitted by the stages
    pub events: Vec<Event>,
    /// Every relayed packet had already been processed
    pub redundant: bool,
}

/// Result of one stage
pub type StageResult<'a> = Result<Context<'a>, Rejection>;

/// Mutable per-run state, passed by value from stage to stage.
///
/// Owns an isolated [`CachedState`] view; dropping the context discards
/// every write made during the run.
pub struct Context<'a> {
    state: CachedState<'a>,
    gas_meter: GasMeter,
    mode: ExecMode,
    block: BlockInfo,
    events: Vec<Event>,
    tx_size: usize,
    gas_wanted: Gas,
    priority: i64,
    stage: StageId,
    visited: Vec<StageId>,
    relaxed: bool,
    finished: bool,
    redundant: bool,
}

impl<'a> Context<'a> {
    /// Fresh context over a state snapshot; `tx_size` is the encoded length
    pub fn new(
        snapshot: &'a dyn StateReader,
        block: BlockInfo,
        mode: ExecMode,
        tx_size: usize,
    ) -> Self {
        Self {
            state: CachedState::new(snapshot),
            gas_meter: GasMeter::infinite(),
            mode,
            block,
            events: Vec::new(),
            tx_size,
            gas_wanted: 0,
            priority: 0,
            stage: StageId::ContextInitializer,
            visited: Vec::with_capacity(StageId::ORDER.len()),
            relaxed: false,
            finished: false,
            redundant: false,
        }
    }

    /// Same context under another mode
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Execution mode
    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Current block
    pub fn block(&self) -> &BlockInfo {
        &self.block
    }

    /// Encoded transaction length in bytes
    pub fn tx_size(&self) -> usize {
        self.tx_size
    }

    /// Isolated state view
    pub fn state(&self) -> &CachedState<'a> {
        &self.state
    }

    /// Isolated state view, writable
    pub fn state_mut(&mut self) -> &mut CachedState<'a> {
        &mut self.state
    }

    /// Gas meter
    pub fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    /// Replace the gas meter
    pub fn set_gas_meter(&mut self, meter: GasMeter) {
        self.gas_meter = meter;
    }

    /// Gas consumed so far
    pub fn gas_consumed(&self) -> Gas {
        self.gas_meter.consumed()
    }

    /// Charge gas before doing the work it pays for
    pub fn consume_gas(&mut self, amount: Gas, descriptor: &'static str) -> AnteResult<()> {
        self.gas_meter.consume(amount, descriptor)
    }

    /// Emit an event
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drop events emitted so far
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Gas the transaction asked for
    pub fn gas_wanted(&self) -> Gas {
        self.gas_wanted
    }

    /// Record gas wanted
    pub fn set_gas_wanted(&mut self, gas: Gas) {
        self.gas_wanted = gas;
    }

    /// Mempool priority
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Set mempool priority
    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    /// Stage currently running
    pub fn stage(&self) -> StageId {
        self.stage
    }

    /// Stages entered so far, in order
    pub fn visited(&self) -> &[StageId] {
        &self.visited
    }

    /// Whether the running stage applies its relaxed variant in this mode
    pub fn is_relaxed(&self) -> bool {
        self.relaxed
    }

    /// Stop the run successfully after the current stage, flagging the
    /// transaction as a redundant relay
    pub fn finish_redundant(&mut self) {
        self.finished = true;
        self.redundant = true;
    }

    /// Whether the run ended early
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Whether the transaction only relayed already-processed packets
    pub fn is_redundant(&self) -> bool {
        self.redundant
    }

    pub(crate) fn enter(&mut self, stage: StageId, relaxed: bool) {
        self.stage = stage;
        self.visited.push(stage);
        self.relaxed = relaxed;
    }

    /// Turn an error into a rejection attributed to the running stage
    pub fn reject(self, error: AnteError) -> Rejection {
        Rejection {
            stage: self.stage,
            error,
            gas_used: self.gas_meter.consumed(),
        }
    }

    /// Run `f` on the context, returning it on success or rejecting with
    /// the error
    pub fn apply(mut self, f: impl FnOnce(&mut Self) -> AnteResult<()>) -> StageResult<'a> {
        match f(&mut self) {
            Ok(()) => Ok(self),
            Err(error) => Err(self.reject(error)),
        }
    }

    /// Finish a successful run: the outcome and the write set
    pub fn into_admission(self) -> (Admission, StateCache) {
        let admission = Admission {
            mode: self.mode,
            gas_wanted: self.gas_wanted,
            gas_used: self.gas_meter.consumed(),
            priority: self.priority,
            events: self.events,
            redundant: self.redundant,
        };
        (admission, self.state.into_cache())
    }
}
