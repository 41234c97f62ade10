//! Per-run gas meter

use crate::error::{AnteError, AnteResult};
use flora_primitives::Gas;

/// Gas consumed so far, optionally bounded by a limit.
///
/// A charge that would cross the limit fails before it is applied; the meter
/// then reads as exhausted (consumed == limit).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: Option<Gas>,
    consumed: Gas,
}

impl GasMeter {
    /// Meter bounded by `limit`
    pub fn new(limit: Gas) -> Self {
        Self {
            limit: Some(limit),
            consumed: 0,
        }
    }

    /// Unbounded meter, used while simulating and at genesis
    pub fn infinite() -> Self {
        Self {
            limit: None,
            consumed: 0,
        }
    }

    /// Limit, `None` when unbounded
    pub fn limit(&self) -> Option<Gas> {
        self.limit
    }

    /// Gas consumed
    pub fn consumed(&self) -> Gas {
        self.consumed
    }

    /// Gas left before the limit
    pub fn remaining(&self) -> Gas {
        self.limit.map_or(Gas::MAX, |limit| limit - self.consumed)
    }

    /// Charge `amount`, failing with `OutOfGas` if it would exceed the limit
    pub fn consume(&mut self, amount: Gas, descriptor: &'static str) -> AnteResult<()> {
        let next = self.consumed.checked_add(amount);
        match (next, self.limit) {
            (Some(next), None) => {
                self.consumed = next;
                Ok(())
            }
            (Some(next), Some(limit)) if next <= limit => {
                self.consumed = next;
                Ok(())
            }
            (next, limit) => {
                let limit = limit.unwrap_or(Gas::MAX);
                self.consumed = limit;
                Err(AnteError::OutOfGas {
                    descriptor,
                    limit,
                    used: next.unwrap_or(Gas::MAX),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_within_limit() {
        let mut meter = GasMeter::new(100);
        meter.consume(40, "a").unwrap();
        meter.consume(60, "b").unwrap();
        assert_eq!(meter.consumed(), 100);
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn test_out_of_gas_caps_consumed() {
        let mut meter = GasMeter::new(100);
        meter.consume(90, "a").unwrap();
        let err = meter.consume(11, "txSize").unwrap_err();
        assert_eq!(
            err,
            AnteError::OutOfGas {
                descriptor: "txSize",
                limit: 100,
                used: 101
            }
        );
        assert_eq!(meter.consumed(), 100);
    }

    #[test]
    fn test_infinite_meter() {
        let mut meter = GasMeter::infinite();
        meter.consume(u64::MAX / 2, "a").unwrap();
        assert_eq!(meter.limit(), None);
        assert!(meter.consume(u64::MAX, "overflow").is_err());
    }
}
