//! Message-type filters: unsupported messages, delegated execution, circuit breaker

use crate::builder::AnteBundle;
use crate::context::StageResult;
use crate::error::{AnteError, AnteResult};
use crate::keepers::CircuitKeeper;
use crate::Context;
use flora_types::{Msg, Tx};

/// Deepest delegated-execution nesting accepted
const MAX_NESTED_MSGS: usize = 7;

pub(super) fn reject_unsupported<'a>(_: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    match tx
        .messages()
        .iter()
        .find(|msg| matches!(msg, Msg::EthereumTx { .. }))
    {
        Some(msg) => Err(ctx.reject(AnteError::UnsupportedMessage(msg.type_url().to_string()))),
        None => Ok(ctx),
    }
}

/// Rejects denied message types executed through `MsgExec`, and grants
/// that would authorize them. Top-level messages are not checked here.
pub(super) fn limit_authz<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|_| check_delegated(&bundle.authz_denylist, tx.messages(), false, 0))
}

fn check_delegated(denylist: &[String], msgs: &[Msg], nested: bool, depth: usize) -> AnteResult<()> {
    if depth >= MAX_NESTED_MSGS {
        return Err(AnteError::NestingTooDeep(MAX_NESTED_MSGS));
    }
    let denied = |type_url: &str| denylist.iter().any(|denied| denied == type_url);

    for msg in msgs {
        match msg {
            Msg::Exec { msgs: inner, .. } => check_delegated(denylist, inner, true, depth + 1)?,
            Msg::Grant { authorization, .. } => {
                let type_url = authorization.msg_type_url();
                if denied(type_url) {
                    return Err(AnteError::UnauthorizedNestedMessage(type_url.to_string()));
                }
            }
            other if nested && denied(other.type_url()) => {
                return Err(AnteError::UnauthorizedNestedMessage(other.type_url().to_string()));
            }
            _ => {}
        }
    }
    Ok(())
}

pub(super) fn circuit_breaker<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|_| check_circuit(bundle.circuit_keeper.as_ref(), tx.messages()))
}

// nesting is already bounded by the authorization limiter
fn check_circuit(keeper: &dyn CircuitKeeper, msgs: &[Msg]) -> AnteResult<()> {
    for msg in msgs {
        if !keeper.is_allowed(msg.type_url()) {
            return Err(AnteError::CircuitBreakerTripped(msg.type_url().to_string()));
        }
        if let Msg::Exec { msgs: inner, .. } = msg {
            check_circuit(keeper, inner)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepers::CircuitRegistry;
    use crate::stages::test_support::{bundle, options, send_msg, send_tx, Fixture};
    use crate::stages::StageId;
    use crate::{ErrorKind, ExecMode};
    use flora_primitives::Coins;
    use flora_types::{type_url, Authorization};
    use std::sync::Arc;

    fn wrap(fx: &Fixture, msg: Msg, levels: usize) -> Msg {
        (0..levels).fold(msg, |inner, _| Msg::Exec {
            grantee: fx.bob.address,
            msgs: vec![inner],
        })
    }

    fn vesting(fx: &Fixture) -> Msg {
        Msg::CreateVestingAccount {
            from: fx.alice.address,
            to: fx.bob.address,
            amount: Coins::single("aflora", 5),
            end_time: 100,
        }
    }

    fn with_msgs(fx: &Fixture, msgs: Vec<Msg>) -> Tx {
        let mut tx = send_tx(fx, 100_000);
        tx.body.messages = msgs;
        tx
    }

    #[test]
    fn test_top_level_ethereum_tx_is_unsupported() {
        let fx = Fixture::new();
        let tx = with_msgs(
            &fx,
            vec![Msg::EthereumTx {
                from: fx.alice.address,
                raw: vec![0xf8],
                gas: 21_000,
            }],
        );
        let ctx = fx.context(ExecMode::CheckOnly, StageId::RejectUnsupportedMessage, false);
        let rejection = reject_unsupported(&bundle(), &tx, ctx).err().unwrap();
        assert_eq!(rejection.kind(), ErrorKind::Disabled);
    }

    #[test]
    fn test_denied_type_inside_exec() {
        let fx = Fixture::new();
        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        let rejection = limit_authz(&bundle(), &with_msgs(&fx, vec![wrap(&fx, vesting(&fx), 1)]), ctx)
            .err()
            .unwrap();
        assert_eq!(
            rejection.error,
            AnteError::UnauthorizedNestedMessage(type_url::MSG_CREATE_VESTING_ACCOUNT.into())
        );
        assert_eq!(rejection.kind(), ErrorKind::Disabled);

        // the same type at the top level is left to the other stages
        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        assert!(limit_authz(&bundle(), &with_msgs(&fx, vec![vesting(&fx)]), ctx).is_ok());
    }

    #[test]
    fn test_grant_of_denied_type() {
        let fx = Fixture::new();
        let grant = |msg_type_url: &str| Msg::Grant {
            granter: fx.alice.address,
            grantee: fx.bob.address,
            authorization: Authorization::Generic {
                msg_type_url: msg_type_url.into(),
            },
        };
        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        assert!(limit_authz(&bundle(), &with_msgs(&fx, vec![grant(type_url::MSG_ETHEREUM_TX)]), ctx)
            .is_err());
        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        assert!(limit_authz(&bundle(), &with_msgs(&fx, vec![grant(type_url::MSG_SEND)]), ctx).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let fx = Fixture::new();
        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        assert!(limit_authz(&bundle(), &with_msgs(&fx, vec![wrap(&fx, send_msg(&fx), 6)]), ctx).is_ok());

        let ctx = fx.context(ExecMode::CheckOnly, StageId::AuthorizationScopeLimiter, false);
        let rejection = limit_authz(&bundle(), &with_msgs(&fx, vec![wrap(&fx, send_msg(&fx), 7)]), ctx)
            .err()
            .unwrap();
        assert_eq!(rejection.error, AnteError::NestingTooDeep(7));
    }

    #[test]
    fn test_circuit_breaker_checks_nested_messages() {
        let fx = Fixture::new();
        let registry = Arc::new(CircuitRegistry::with_disabled([type_url::MSG_SEND]));
        let bundle = options().circuit_keeper(registry.clone()).into_bundle().unwrap();

        let ctx = fx.context(ExecMode::CheckOnly, StageId::CircuitBreaker, false);
        let rejection = circuit_breaker(&bundle, &with_msgs(&fx, vec![wrap(&fx, send_msg(&fx), 2)]), ctx)
            .err()
            .unwrap();
        assert_eq!(rejection.error, AnteError::CircuitBreakerTripped(type_url::MSG_SEND.into()));

        registry.enable(type_url::MSG_SEND);
        let ctx = fx.context(ExecMode::CheckOnly, StageId::CircuitBreaker, false);
        assert!(circuit_breaker(&bundle, &with_msgs(&fx, vec![wrap(&fx, send_msg(&fx), 2)]), ctx).is_ok());
    }
}
