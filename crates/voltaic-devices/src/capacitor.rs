use voltaic_numeric::matrix::Triplet;

use crate::prelude::{Error, Result};
use crate::resistor::stamp_two_terminal_conductance;
use crate::stamp::{push_rhs, RhsEntry, StampContext, Stampable};

/// Default large-admittance constant: see `SolverConfig::large_admittance` for
/// the tunable version used by the preprocessor. This value backs any
/// capacitor built without an explicit override.
pub const DEFAULT_LARGE_ADMITTANCE: f64 = 1.0e3;

/// A capacitor modeled by the large-admittance method: an ideal voltage
/// source `Vc(t)` (the integration state) in parallel with a large fixed
/// conductance. The companion branch keeps the system linear per step while
/// softly constraining the node voltage toward `Vc`.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    pub plus: String,
    pub minus: String,
    pub capacitance: f64,
    pub initial_voltage: f64,
    pub large_admittance: f64,
}

impl Capacitor {
    pub fn new(
        name: impl Into<String>,
        plus: impl Into<String>,
        minus: impl Into<String>,
        capacitance: f64,
        initial_voltage: f64,
    ) -> Result<Self> {
        let name = name.into();
        if capacitance <= 0.0 {
            return Err(Error::NonPositiveCapacitance {
                component: name,
                value: capacitance,
            });
        }
        Ok(Capacitor {
            name,
            plus: plus.into(),
            minus: minus.into(),
            capacitance,
            initial_voltage,
            large_admittance: DEFAULT_LARGE_ADMITTANCE,
        })
    }

    pub fn with_large_admittance(mut self, g_large: f64) -> Self {
        self.large_admittance = g_large;
        self
    }

    pub fn identifier(&self) -> String {
        format!("C{}", self.name)
    }

    /// `I_c = G_large * (V_across - Vc)`, the companion-model current used to
    /// drive the state derivative.
    pub fn current(&self, v_plus: f64, v_minus: f64, vc: f64) -> f64 {
        self.large_admittance * (v_plus - v_minus - vc)
    }

    /// `dVc/dt = I_c / C`.
    pub fn derivative(&self, current: f64) -> f64 {
        current / self.capacitance
    }
}

impl Stampable for Capacitor {
    fn is_state_variable(&self) -> bool {
        true
    }

    fn state_kind(&self) -> Option<crate::component::StateKind> {
        Some(crate::component::StateKind::Voltage)
    }

    fn initial_state(&self) -> f64 {
        self.initial_voltage
    }

    fn stamp_conductance(&self, ctx: &StampContext) -> Vec<Triplet> {
        stamp_two_terminal_conductance(ctx.index_map, &self.plus, &self.minus, self.large_admittance)
    }

    fn stamp_rhs(&self, ctx: &StampContext) -> Vec<RhsEntry> {
        let vc = ctx.own_state();
        let source = self.large_admittance * vc;
        let mut out = Vec::with_capacity(2);
        push_rhs(&mut out, ctx.index_map.node(&self.plus), source);
        push_rhs(&mut out, ctx.index_map.node(&self.minus), -source);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_map::IndexMap;

    #[test]
    fn rejects_nonpositive_capacitance() {
        assert!(Capacitor::new("1", "a", "b", 0.0, 0.0).is_err());
    }

    #[test]
    fn current_is_zero_when_node_matches_state() {
        let c = Capacitor::new("1", "out", "0", 1e-6, 3.0).unwrap();
        assert!((c.current(3.0, 0.0, 3.0)).abs() < 1e-15);
    }

    #[test]
    fn current_drives_derivative_toward_node_voltage() {
        let c = Capacitor::new("1", "out", "0", 1e-6, 0.0).unwrap();
        let i = c.current(5.0, 0.0, 0.0);
        assert!(i > 0.0);
        assert!(c.derivative(i) > 0.0);
    }

    #[test]
    fn rhs_contributes_large_admittance_times_state() {
        let c = Capacitor::new("1", "out", "0", 1e-6, 2.0).unwrap();
        let mut map = IndexMap::new();
        map.insert_node("out", 0);
        let ctx = StampContext {
            index_map: &map,
            solution: &[],
            state: &[2.0],
            state_index: Some(0),
            t: 0.0,
        };
        let entries = c.stamp_rhs(&ctx);
        assert_eq!(entries.len(), 1); // ground terminal contributes nothing
        assert!((entries[0].value - DEFAULT_LARGE_ADMITTANCE * 2.0).abs() < 1e-9);
    }
}
