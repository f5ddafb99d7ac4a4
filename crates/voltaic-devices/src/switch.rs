use voltaic_numeric::matrix::Triplet;

use crate::prelude::{Error, Result};
use crate::resistor::stamp_two_terminal_conductance;
use crate::stamp::{RhsEntry, StampContext, Stampable};

pub const DEFAULT_ON_RESISTANCE: f64 = 1e-3;
pub const DEFAULT_OFF_RESISTANCE: f64 = 1e6;

/// An ideal switch: boolean state, externally commanded (the "mutable drive
/// input" for gate signals described alongside the voltage source's
/// `set_value`). ON stamps `R_on`, OFF stamps `R_off`.
#[derive(Debug, Clone)]
pub struct Switch {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub on_resistance: f64,
    pub off_resistance: f64,
    closed: bool,
}

impl Switch {
    pub fn new(
        name: impl Into<String>,
        plus: impl Into<String>,
        minus: impl Into<String>,
        on_resistance: f64,
        off_resistance: f64,
        initially_closed: bool,
    ) -> Result<Self> {
        let name = name.into();
        if on_resistance >= off_resistance {
            return Err(Error::OnResistanceNotLessThanOff {
                component: name,
                r_on: on_resistance,
                r_off: off_resistance,
            });
        }
        Ok(Switch {
            name,
            plus: plus.into(),
            minus: minus.into(),
            on_resistance,
            off_resistance,
            closed: initially_closed,
        })
    }

    pub fn default_params(
        name: impl Into<String>,
        plus: impl Into<String>,
        minus: impl Into<String>,
        initially_closed: bool,
    ) -> Result<Self> {
        Switch::new(name, plus, minus, DEFAULT_ON_RESISTANCE, DEFAULT_OFF_RESISTANCE, initially_closed)
    }

    pub fn identifier(&self) -> String {
        format!("S{}", self.name)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The externally-commanded drive: closing or opening the switch is a
    /// state transition and therefore an event.
    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// `+1.0` closed, `-1.0` open; used by the event layer for a uniform
    /// zero-crossing interface even though the transition is commanded
    /// rather than derived from a node voltage.
    pub fn zero_crossing(&self) -> f64 {
        if self.closed {
            1.0
        } else {
            -1.0
        }
    }
}

impl Stampable for Switch {
    fn is_nonlinear(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let g = if self.closed {
            1.0 / self.on_resistance
        } else {
            1.0 / self.off_resistance
        };
        stamp_two_terminal_conductance(ctx.index_map, &self.plus, &self.minus, g)
    }

    fn stamp_rhs(&self, _ctx: &StampContext) -> Vec<RhsEntry> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::IndexMap;

    #[test]
    fn rejects_on_resistance_not_less_than_off() {
        assert!(Switch::new("1", "a", "b", 1e6, 1e3, true).is_err());
    }

    #[test]
    fn closed_switch_stamps_on_resistance() {
        let s = Switch::default_params("1", "a", "b", true).unwrap();
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        map.insert_node("b", 1);
        let ctx = StampContext {
            index_map: &map,
            solution: &[],
            state: &[],
            state_index: None,
            t: 0.0,
        };
        let stamps = s.stamp_conductance(&ctx);
        let expected = 1.0 / DEFAULT_ON_RESISTANCE;
        assert!(stamps.iter().any(|t| t.row == 0 && t.col == 0 && (t.value - expected).abs() < 1e-9));
    }

    #[test]
    fn set_closed_toggles_zero_crossing() {
        let mut s = Switch::default_params("1", "a", "b", false).unwrap();
        assert_eq!(s.zero_crossing(), -1.0);
        s.set_closed(true);
        assert_eq!(s.zero_crossing(), 1.0);
    }
}
