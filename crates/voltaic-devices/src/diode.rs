use voltaic_numeric::matrix::Triplet;

use crate::prelude::{Error, Result};
use crate::resistor::stamp_two_terminal_conductance;
use crate::stamp::{push_rhs, RhsEntry, StampContext, Stampable};

pub const DEFAULT_FORWARD_VOLTAGE: f64 = 0.7;
pub const DEFAULT_ON_RESISTANCE: f64 = 1e-3;
pub const DEFAULT_OFF_RESISTANCE: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiodeState {
    Off,
    On,
}

/// An ideal event-driven diode: OFF stamps `R_off`, ON stamps `R_on` and a
/// Thevenin-equivalent forward-voltage drop. Mode is never stored on the
/// device itself; it is re-derived every step from the present solution so
/// the device stays free of per-run mutable state.
#[derive(Debug, Clone)]
pub struct Diode {
    pub name: String,
    pub anode: String,
    pub cathode: String,
    pub forward_voltage: f64,
    pub on_resistance: f64,
    pub off_resistance: f64,
}

impl Diode {
    pub fn new(
        name: impl Into<String>,
        anode: impl Into<String>,
        cathode: impl Into<String>,
        forward_voltage: f64,
        on_resistance: f64,
        off_resistance: f64,
    ) -> Result<Self> {
        let name = name.into();
        if forward_voltage < 0.0 {
            return Err(Error::NegativeForwardVoltage {
                component: name,
                value: forward_voltage,
            });
        }
        if on_resistance >= off_resistance {
            return Err(Error::OnResistanceNotLessThanOff {
                component: name,
                r_on: on_resistance,
                r_off: off_resistance,
            });
        }
        Ok(Diode {
            name,
            anode: anode.into(),
            cathode: cathode.into(),
            forward_voltage,
            on_resistance,
            off_resistance,
        })
    }

    pub fn default_params(
        name: impl Into<String>,
        anode: impl Into<String>,
        cathode: impl Into<String>,
    ) -> Result<Self> {
        Diode::new(
            name,
            anode,
            cathode,
            DEFAULT_FORWARD_VOLTAGE,
            DEFAULT_ON_RESISTANCE,
            DEFAULT_OFF_RESISTANCE,
        )
    }

    pub fn identifier(&self) -> String {
        format!("D{}", self.name)
    }

    /// The zero-crossing function `f(V_a, V_c) = V_a - V_c - V_f`. A sign
    /// change between consecutive steps signals a conduction-state event.
    pub fn zero_crossing(&self, v_anode: f64, v_cathode: f64) -> f64 {
        v_anode - v_cathode - self.forward_voltage
    }

    pub fn mode(&self, v_anode: f64, v_cathode: f64) -> DiodeState {
        if self.zero_crossing(v_anode, v_cathode) >= 0.0 {
            DiodeState::On
        } else {
            DiodeState::Off
        }
    }

    fn node_voltage(ctx: &StampContext, name: &str) -> f64 {
        ctx.index_map.node(name).map(|i| ctx.solution[i]).unwrap_or(0.0)
    }

    fn mode_from_context(&self, ctx: &StampContext) -> DiodeState {
        if ctx.solution.is_empty() {
            return DiodeState::Off;
        }
        let v_a = Self::node_voltage(ctx, &self.anode);
        let v_c = Self::node_voltage(ctx, &self.cathode);
        self.mode(v_a, v_c)
    }
}

impl Stampable for Diode {
    fn is_nonlinear(&self) -> bool {
        true
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        let g = match self.mode_from_context(ctx) {
            DiodeState::Off => 1.0 / self.off_resistance,
            DiodeState::On => 1.0 / self.on_resistance,
        };
        stamp_two_terminal_conductance(ctx.index_map, &self.anode, &self.cathode, g)
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let mut out = Vec::new();
        if self.mode_from_context(ctx) == DiodeState::On {
            // Norton equivalent of the series (V_f, R_on) Thevenin branch.
            let i_eq = self.forward_voltage / self.on_resistance;
            push_rhs(&mut out, ctx.index_map.node(&self.anode), i_eq);
            push_rhs(&mut out, ctx.index_map.node(&self.cathode), -i_eq);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::IndexMap;

    #[test]
    fn rejects_negative_forward_voltage() {
        assert!(Diode::new("1", "a", "c", -0.1, 1e-3, 1e6).is_err());
    }

    #[test]
    fn rejects_on_resistance_not_less_than_off() {
        assert!(Diode::new("1", "a", "c", 0.7, 1e6, 1e3).is_err());
    }

    #[test]
    fn mode_is_off_below_forward_voltage() {
        let d = Diode::default_params("1", "a", "c").unwrap();
        assert_eq!(d.mode(0.3, 0.0), DiodeState::Off);
    }

    #[test]
    fn mode_is_on_at_or_above_forward_voltage() {
        let d = Diode::default_params("1", "a", "c").unwrap();
        assert_eq!(d.mode(0.7, 0.0), DiodeState::On);
        assert_eq!(d.mode(1.0, 0.0), DiodeState::On);
    }

    #[test]
    fn stamps_off_resistance_with_empty_solution() {
        let d = Diode::default_params("1", "a", "c").unwrap();
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        map.insert_node("c", 1);
        let ctx = StampContext {
            index_map: &map,
            solution: &[],
            state: &[],
            state_index: None,
            t: 0.0,
        };
        let stamps = d.stamp_conductance(&ctx);
        let expected_g = 1.0 / DEFAULT_OFF_RESISTANCE;
        assert!(stamps.iter().any(|t| t.row == 0 && t.col == 0 && (t.value - expected_g).abs() < 1e-12));
    }

    #[test]
    fn on_mode_stamps_rhs_forward_drop() {
        let d = Diode::default_params("1", "a", "c").unwrap();
        let mut map = IndexMap::new();
        map.insert_node("a", 0);
        map.insert_node("c", 1);
        let ctx = StampContext {
            index_map: &map,
            solution: &[1.0, 0.0],
            state: &[],
            state_index: None,
            t: 0.0,
        };
        let rhs = d.stamp_rhs(&ctx);
        assert_eq!(rhs.len(), 2);
        let expected = DEFAULT_FORWARD_VOLTAGE / DEFAULT_ON_RESISTANCE;
        assert!(rhs.iter().any(|e| e.row == 0 && (e.value - expected).abs() < 1e-9));
    }
}
