//! Cross-chain relay de-duplication

use crate::builder::AnteBundle;
use crate::context::StageResult;
use crate::Context;
use flora_types::Tx;
use tracing::debug;

/// Ends the run successfully when every relayed packet in the transaction
/// has already been processed. Transactions without packet messages pass.
pub(super) fn filter_redundant_relay<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    mut ctx: Context<'a>,
) -> StageResult<'a> {
    let packet_msgs: Vec<_> = tx
        .messages()
        .iter()
        .filter(|msg| msg.packet().is_some())
        .collect();
    if packet_msgs.is_empty() {
        return Ok(ctx);
    }

    if packet_msgs.iter().all(|msg| bundle.relay_index.is_redundant(msg)) {
        debug!(packets = packet_msgs.len(), "every relayed packet already processed");
        ctx.finish_redundant();
    }
    Ok(ctx)
}
