//! Runs the composed handler over one transaction

use crate::builder::AnteHandler;
use crate::context::StageResult;
use crate::Context;
use flora_types::Tx;
use tracing::{debug, warn};

impl AnteHandler {
    /// Run every stage in order, consulting the mode policy for skips and
    /// relaxed variants. The first failure aborts the run.
    pub fn run<'a>(&self, tx: &Tx, mut ctx: Context<'a>) -> StageResult<'a> {
        let mode = ctx.mode();
        let policy = mode.policy();

        for stage in &self.stages {
            if ctx.is_finished() {
                debug!(%mode, stage = %stage.id, "run finished early");
                break;
            }
            if policy.skips(stage.id) {
                debug!(%mode, stage = %stage.id, "stage skipped");
                continue;
            }

            ctx.enter(stage.id, policy.relaxes(stage.id));
            let before = ctx.gas_consumed();
            ctx = match (stage.run)(&self.bundle, tx, ctx) {
                Ok(ctx) => {
                    debug!(
                        %mode,
                        stage = %stage.id,
                        relaxed = ctx.is_relaxed(),
                        gas = ctx.gas_consumed() - before,
                        "stage passed"
                    );
                    ctx
                }
                Err(rejection) => {
                    warn!(
                        %mode,
                        stage = %rejection.stage,
                        kind = %rejection.kind(),
                        gas_used = rejection.gas_used,
                        error = %rejection.error,
                        "transaction rejected"
                    );
                    return Err(rejection);
                }
            };
        }
        Ok(ctx)
    }
}
